use std::sync::Arc;

use crate::config::Config;
use crate::models::CashflowState;
use crate::services::{cashflow, state_codec};

/// Shared, read-only application state. All user data lives in the URL.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Decode `fragment`, falling back to sample or empty data.
    pub fn load_state(&self, fragment: Option<&str>) -> CashflowState {
        if let Some(state) = fragment.and_then(state_codec::decode) {
            return state;
        }
        if self.config.sample_data {
            tracing::debug!("No saved state in address, using sample data");
            cashflow::sample_state()
        } else {
            CashflowState::default()
        }
    }

    pub fn format_amount(&self, amount: i64) -> String {
        crate::filters::format_amount(amount, &self.config.currency, &self.config.locale)
    }
}
