pub mod cashflow;
pub mod sankey;
pub mod state_codec;
