use askama::Template;
use axum::extract::{Query, State};
use axum::response::Html;
use serde::Deserialize;

use crate::error::{AppError, AppResult, RenderHtml};
use crate::models::CashflowItem;
use crate::services::cashflow::{self, Summary};
use crate::services::state_codec;
use crate::state::AppState;
use crate::VERSION;

/// Query parameters carrying the encoded state.
#[derive(Debug, Default, Deserialize)]
pub struct StateParams {
    pub s: Option<String>,
}

/// One row of the income or expense table, pre-formatted for display.
pub struct ItemRow {
    pub id: String,
    pub name: String,
    pub amount: String,
    /// Figure to prefill the edit form with (gross for VAT-inclusive incomes).
    pub entered_amount: i64,
    pub vat_included: bool,
    pub vat: String,
}

impl ItemRow {
    fn new(item: &CashflowItem, state: &AppState) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            amount: state.format_amount(item.amount),
            entered_amount: item.entered_amount(),
            vat_included: item.vat_included(),
            vat: state.format_amount(item.vat_amount()),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub version: &'static str,
    pub fragment: String,
    pub incomes: Vec<ItemRow>,
    pub expenses: Vec<ItemRow>,
    pub summary: Summary,
    pub total_income: String,
    pub total_expense: String,
    pub vat_total: String,
    pub balance: String,
    pub vat_rate: u32,
    /// Graph for the client-side renderer, safe to embed in a `<script>` tag.
    pub flow_json: String,
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<StateParams>,
) -> AppResult<Html<String>> {
    let cashflow_state = state.load_state(params.s.as_deref());
    let summary = Summary::of(&cashflow_state);
    let flow = cashflow::flow(&cashflow_state);

    let flow_json = serde_json::to_string(&flow)
        .map_err(|e| AppError::Internal(format!("Failed to serialize flow: {}", e)))?;

    let template = IndexTemplate {
        title: "Cashkey | Visualize your business cash flow".into(),
        version: VERSION,
        fragment: state_codec::encode(&cashflow_state),
        incomes: cashflow_state
            .incomes()
            .iter()
            .map(|item| ItemRow::new(item, &state))
            .collect(),
        expenses: cashflow_state
            .expenses()
            .iter()
            .map(|item| ItemRow::new(item, &state))
            .collect(),
        summary,
        total_income: state.format_amount(summary.total_income),
        total_expense: state.format_amount(summary.total_expense),
        vat_total: state.format_amount(summary.vat_total),
        balance: state.format_amount(summary.balance.saturating_abs()),
        vat_rate: state.config.vat_rate,
        flow_json: script_safe(&flow_json),
    };

    template.render_html()
}

/// Escape `<` so user-chosen names cannot close the surrounding script tag.
fn script_safe(json: &str) -> String {
    json.replace('<', "\\u003c")
}
