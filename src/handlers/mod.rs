pub mod api;
pub mod dashboard;
pub mod items;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Pages
        .route("/", get(dashboard::index))
        // Income forms
        .route("/incomes", post(items::create_income))
        .route("/incomes/:id/update", post(items::update_income))
        .route("/incomes/:id/delete", post(items::delete_income))
        // Expense forms
        .route("/expenses", post(items::create_expense))
        .route("/expenses/:id/update", post(items::update_expense))
        .route("/expenses/:id/delete", post(items::delete_expense))
        // API (JSON for the diagram)
        .route("/api/flow", get(api::flow))
        .route("/api/summary", get(api::summary))
        .route("/api/state", get(api::decoded_state))
        .route("/api/update", post(api::update))
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}
