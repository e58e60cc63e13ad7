use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Default VAT rate, in percent.
pub const DEFAULT_VAT_RATE: u32 = 20;

/// Largest amount, net or gross, a single line may carry. Keeps every sum
/// the graph builder takes well inside `i64`.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Opaque identifier of a cash flow line. Stable across edits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new random ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Fixed id for lines the app synthesizes itself.
    pub fn from_static(s: &'static str) -> Self {
        Self(s.to_string())
    }

    /// Wrap an existing identifier. Empty strings are not valid ids.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            None
        } else {
            Some(Self(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// VAT decomposition of an income captured as a VAT-inclusive figure.
///
/// Only constructible through [`Vat::from_gross`] and [`Vat::for_net`], both
/// of which hold `gross == net + amount` and `gross <= MAX_AMOUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vat {
    #[serde(rename = "vatAmount")]
    amount: i64,
    #[serde(rename = "grossAmount")]
    gross: i64,
}

impl Vat {
    /// Split a gross figure into `(net, vat)` at `rate_percent`.
    ///
    /// `net = round(gross / (1 + rate))`, half rounded up, in integer math.
    /// `None` for a negative gross or one above [`MAX_AMOUNT`].
    pub fn from_gross(gross: i64, rate_percent: u32) -> Option<(i64, Self)> {
        if !(0..=MAX_AMOUNT).contains(&gross) {
            return None;
        }
        let divisor = 100 + i64::from(rate_percent);
        let net = gross
            .checked_mul(200)?
            .checked_add(divisor)?
            .div_euclid(2 * divisor);
        let vat = Self {
            amount: gross - net,
            gross,
        };
        Some((net, vat))
    }

    /// VAT record for an already-decomposed item, if the parts are consistent.
    pub fn for_net(net: i64, amount: i64) -> Option<Self> {
        if net < 0 || amount < 0 {
            return None;
        }
        let gross = net.checked_add(amount).filter(|g| *g <= MAX_AMOUNT)?;
        Some(Self { amount, gross })
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn gross(&self) -> i64 {
        self.gross
    }
}

/// One income or expense line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashflowItem {
    pub id: ItemId,
    pub name: String,
    /// Whole currency units. Net of VAT for VAT-inclusive incomes.
    pub amount: i64,
    #[serde(flatten)]
    pub vat: Option<Vat>,
}

impl CashflowItem {
    pub fn new(name: impl Into<String>, amount: i64) -> Self {
        Self {
            id: ItemId::generate(),
            name: name.into(),
            amount,
            vat: None,
        }
    }

    pub fn vat_included(&self) -> bool {
        self.vat.is_some()
    }

    pub fn vat_amount(&self) -> i64 {
        self.vat.map(|v| v.amount()).unwrap_or(0)
    }

    /// The figure the user entered: gross for VAT-inclusive incomes, else the amount.
    pub fn entered_amount(&self) -> i64 {
        self.vat.map(|v| v.gross()).unwrap_or(self.amount)
    }
}

/// The full editable state; the unit of serialization.
///
/// VAT belongs to incomes only. Expenses pass through [`CashflowState::new`],
/// which clears any VAT on them, so every state encodes losslessly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CashflowState {
    incomes: Vec<CashflowItem>,
    expenses: Vec<CashflowItem>,
}

impl CashflowState {
    pub fn new(incomes: Vec<CashflowItem>, mut expenses: Vec<CashflowItem>) -> Self {
        for expense in expenses.iter_mut().filter(|e| e.vat.is_some()) {
            tracing::debug!(id = %expense.id, "Clearing VAT on expense");
            expense.vat = None;
        }
        Self { incomes, expenses }
    }

    pub fn incomes(&self) -> &[CashflowItem] {
        &self.incomes
    }

    pub fn expenses(&self) -> &[CashflowItem] {
        &self.expenses
    }

    pub fn into_parts(self) -> (Vec<CashflowItem>, Vec<CashflowItem>) {
        (self.incomes, self.expenses)
    }

    pub fn is_empty(&self) -> bool {
        self.incomes.is_empty() && self.expenses.is_empty()
    }
}

/// How often an entered amount recurs. Monthly figures are annualized.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Annual,
    Monthly,
}

impl Period {
    /// Yearly figure, or `None` if it would exceed [`MAX_AMOUNT`].
    pub fn annualize(self, amount: i64) -> Option<i64> {
        let annual = match self {
            Self::Annual => amount,
            Self::Monthly => amount.checked_mul(12)?,
        };
        (annual <= MAX_AMOUNT).then_some(annual)
    }
}

/// User input for adding or editing a line, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewItem {
    pub name: String,
    /// Raw amount as typed; every non-digit character is ignored.
    pub amount: String,
    #[serde(default)]
    pub period: Period,
    #[serde(default, deserialize_with = "crate::form_utils::deserialize_checkbox")]
    pub vat_included: bool,
}
