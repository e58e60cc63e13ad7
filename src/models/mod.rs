pub mod item;
pub mod sankey;

pub use item::{
    CashflowItem, CashflowState, ItemId, NewItem, Period, Vat, DEFAULT_VAT_RATE, MAX_AMOUNT,
};
pub use sankey::{NodeCategory, SankeyData, SankeyLink, SankeyNode};
