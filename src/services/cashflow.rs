use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::form_utils::parse_amount;
use crate::models::{CashflowItem, CashflowState, ItemId, NewItem, SankeyData, Vat, MAX_AMOUNT};
use crate::services::{sankey, state_codec};

pub const VAT_EXPENSE_ID: &str = "auto-vat-expense";
pub const VAT_EXPENSE_NAME: &str = "🧾 VAT (auto)";

/// Totals shown above the diagram. `total_expense` includes VAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_income: i64,
    pub vat_total: i64,
    pub total_expense: i64,
    pub balance: i64,
    pub show_vat_row: bool,
}

impl Summary {
    pub fn of(state: &CashflowState) -> Self {
        let total_income = sankey::total(state.incomes());
        let vat_total = vat_total(state.incomes());
        let total_expense = sankey::total(state.expenses()).saturating_add(vat_total);
        Self {
            total_income,
            vat_total,
            total_expense,
            balance: total_income.saturating_sub(total_expense),
            show_vat_row: vat_total > 0 || !state.is_empty(),
        }
    }

    pub fn has_vat(&self) -> bool {
        self.vat_total > 0
    }

    pub fn is_surplus(&self) -> bool {
        self.balance >= 0
    }
}

pub fn vat_total(incomes: &[CashflowItem]) -> i64 {
    incomes
        .iter()
        .fold(0i64, |sum, item| sum.saturating_add(item.vat_amount()))
}

/// The synthetic expense line carrying collected VAT.
pub fn vat_expense(total: i64) -> CashflowItem {
    CashflowItem {
        id: ItemId::from_static(VAT_EXPENSE_ID),
        name: VAT_EXPENSE_NAME.into(),
        amount: total,
        vat: None,
    }
}

/// Expenses as drawn: the VAT line first, when any VAT was collected.
pub fn flow_expenses(state: &CashflowState) -> Vec<CashflowItem> {
    let total = vat_total(state.incomes());
    let mut expenses = Vec::with_capacity(state.expenses().len() + 1);
    if total > 0 {
        expenses.push(vat_expense(total));
    }
    expenses.extend(state.expenses().iter().cloned());
    expenses
}

pub fn flow(state: &CashflowState) -> SankeyData {
    sankey::build(state.incomes(), &flow_expenses(state))
}

/// Starting data for a visitor without a saved state.
pub fn sample_state() -> CashflowState {
    let incomes = [
        ("💼 Client", 54132),
        ("📦 Other Client", 50000),
        ("📋 Small Client", 10000),
        ("🧾 Small Client", 5000),
        ("🔁 Other Client", 100),
    ];
    let expenses = [
        ("🏠 Rent/Mortgage", 16608),
        ("📱 Phone Bill", 7610),
        ("🚌 Transportation", 5676),
        ("🏛️ Local Taxes", 5000),
        ("💡 Utilities", 4475),
        ("🛡️ Social Security", 3000),
        ("🧰 Business Expenses", 1500),
        ("🎁 Gifts", 1000),
        ("🔄 Other", 1000),
    ];

    CashflowState::new(
        incomes
            .iter()
            .map(|(name, amount)| CashflowItem::new(*name, *amount))
            .collect(),
        expenses
            .iter()
            .map(|(name, amount)| CashflowItem::new(*name, *amount))
            .collect(),
    )
}

/// Which list an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Income,
    Expense,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Add { side: Side, item: NewItem },
    Edit { side: Side, id: ItemId, item: NewItem },
    Delete { side: Side, id: ItemId },
}

/// Result of a state change: the new state and the fragment that stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Update {
    pub state: CashflowState,
    pub fragment: String,
}

impl Update {
    pub fn new(state: CashflowState) -> Self {
        let fragment = state_codec::encode(&state);
        Self { state, fragment }
    }
}

/// Apply `action` to `state`, returning a new state. `state` is untouched.
pub fn apply(state: &CashflowState, action: Action, vat_rate: u32) -> AppResult<Update> {
    let mut next = state.clone().into_parts();

    match action {
        Action::Add { side, item } => {
            let (name, amount, vat) = validate(&item, side, vat_rate)?;
            let new_item = CashflowItem {
                id: ItemId::generate(),
                name,
                amount,
                vat,
            };
            info!(side = side.as_str(), id = %new_item.id, amount, "Item added");
            list_mut(&mut next, side).push(new_item);
        }
        Action::Edit { side, id, item } => {
            let (name, amount, vat) = validate(&item, side, vat_rate)?;
            let existing = list_mut(&mut next, side)
                .iter_mut()
                .find(|existing| existing.id == id)
                .ok_or_else(|| not_found(side, &id))?;
            existing.name = name;
            existing.amount = amount;
            existing.vat = vat;
            info!(side = side.as_str(), %id, amount, "Item updated");
        }
        Action::Delete { side, id } => {
            let items = list_mut(&mut next, side);
            let before = items.len();
            items.retain(|existing| existing.id != id);
            if items.len() == before {
                return Err(not_found(side, &id));
            }
            info!(side = side.as_str(), %id, "Item deleted");
        }
    }

    let (incomes, expenses) = next;
    Ok(Update::new(CashflowState::new(incomes, expenses)))
}

type Lists = (Vec<CashflowItem>, Vec<CashflowItem>);

fn list_mut(lists: &mut Lists, side: Side) -> &mut Vec<CashflowItem> {
    match side {
        Side::Income => &mut lists.0,
        Side::Expense => &mut lists.1,
    }
}

fn not_found(side: Side, id: &ItemId) -> AppError {
    AppError::NotFound(format!("No {} with id {}", side.as_str(), id))
}

/// Check a form entry and derive `(name, net amount, vat)`.
fn validate(item: &NewItem, side: Side, vat_rate: u32) -> AppResult<(String, i64, Option<Vat>)> {
    let name = item.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }

    let amount = parse_amount(&item.amount)
        .ok_or_else(|| AppError::Validation(format!("Invalid amount: {}", item.amount)))?;
    let amount = item.period.annualize(amount).ok_or_else(too_large)?;

    if side == Side::Income && item.vat_included {
        let (net, vat) = Vat::from_gross(amount, vat_rate).ok_or_else(too_large)?;
        debug!(gross = amount, net, vat = vat.amount(), "Split VAT-inclusive income");
        Ok((name.to_string(), net, Some(vat)))
    } else {
        Ok((name.to_string(), amount, None))
    }
}

fn too_large() -> AppError {
    AppError::Validation(format!("Amount must not exceed {} per year", MAX_AMOUNT))
}
