//! Form handlers for adding, editing and deleting lines.
//!
//! Every form carries the current encoded state in field `s`. The handlers
//! apply the change and redirect to the page for the new state, so the
//! address always holds the latest version.

use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::Form;
use serde::Deserialize;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::form_utils::deserialize_checkbox;
use crate::models::{ItemId, NewItem, Period};
use crate::services::cashflow::{self, Action, Side};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ItemForm {
    #[serde(default)]
    pub s: String,
    pub name: String,
    pub amount: String,
    #[serde(default)]
    pub period: Period,
    #[serde(default, deserialize_with = "deserialize_checkbox")]
    pub vat_included: bool,
}

impl ItemForm {
    fn into_parts(self) -> (String, NewItem) {
        let item = NewItem {
            name: self.name,
            amount: self.amount,
            period: self.period,
            vat_included: self.vat_included,
        };
        (self.s, item)
    }
}

#[derive(Debug, Deserialize)]
pub struct StateForm {
    #[serde(default)]
    pub s: String,
}

pub async fn create_income(
    State(state): State<AppState>,
    Form(form): Form<ItemForm>,
) -> AppResult<Redirect> {
    create(&state, Side::Income, form)
}

pub async fn create_expense(
    State(state): State<AppState>,
    Form(form): Form<ItemForm>,
) -> AppResult<Redirect> {
    create(&state, Side::Expense, form)
}

pub async fn update_income(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ItemForm>,
) -> AppResult<Redirect> {
    update(&state, Side::Income, id, form)
}

pub async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ItemForm>,
) -> AppResult<Redirect> {
    update(&state, Side::Expense, id, form)
}

pub async fn delete_income(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<StateForm>,
) -> AppResult<Redirect> {
    delete(&state, Side::Income, id, form)
}

pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<StateForm>,
) -> AppResult<Redirect> {
    delete(&state, Side::Expense, id, form)
}

fn create(state: &AppState, side: Side, form: ItemForm) -> AppResult<Redirect> {
    debug!(side = side.as_str(), name = %form.name, amount = %form.amount, "Adding item");
    let (fragment, item) = form.into_parts();
    run(state, &fragment, Action::Add { side, item })
}

fn update(state: &AppState, side: Side, id: String, form: ItemForm) -> AppResult<Redirect> {
    debug!(side = side.as_str(), id = %id, "Updating item");
    let (fragment, item) = form.into_parts();
    let id = parse_id(&id)?;
    run(state, &fragment, Action::Edit { side, id, item })
}

fn delete(state: &AppState, side: Side, id: String, form: StateForm) -> AppResult<Redirect> {
    debug!(side = side.as_str(), id = %id, "Deleting item");
    let id = parse_id(&id)?;
    run(state, &form.s, Action::Delete { side, id })
}

fn run(state: &AppState, fragment: &str, action: Action) -> AppResult<Redirect> {
    let current = state.load_state(Some(fragment));
    let update = cashflow::apply(&current, action, state.config.vat_rate)?;
    Ok(Redirect::to(&format!("/?s={}", update.fragment)))
}

fn parse_id(id: &str) -> AppResult<ItemId> {
    ItemId::parse(id).ok_or_else(|| AppError::Validation("Missing item id".into()))
}
