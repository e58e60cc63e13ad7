use crate::models::{CashflowItem, NodeCategory, SankeyData, SankeyLink, SankeyNode};

pub const INCOME_COLOR: &str = "#8E9EF0";
pub const EXPENSE_COLOR: &str = "#9ADCB9";
pub const SURPLUS_COLOR: &str = "#9b87f5";
pub const DEFICIT_COLOR: &str = "#F7A097";
pub const BUDGET_COLOR: &str = "#F1C40F";

pub const BUDGET_NAME: &str = "Budget";
pub const DEFICIT_NAME: &str = "📉 Deficit";
pub const SURPLUS_NAME: &str = "📈 Surplus";
const DEFICIT_LABEL: &str = "Deficit";
const SURPLUS_LABEL: &str = "Surplus";

/// Build the flow graph: incomes (and a deficit, if any) feed a single
/// budget node, which feeds expenses (and a surplus, if any).
///
/// Items are stacked in descending amount order; ties keep input order.
/// Never fails: empty input gives an empty graph, zero totals give 0 %.
pub fn build(incomes: &[CashflowItem], expenses: &[CashflowItem]) -> SankeyData {
    if incomes.is_empty() && expenses.is_empty() {
        return SankeyData::default();
    }

    let total_income = total(incomes);
    let total_expense = total(expenses);
    let balance = total_income.saturating_sub(total_expense);
    let total_budget = total_income.max(total_expense);

    let sorted_incomes = sorted_desc(incomes);
    let sorted_expenses = sorted_desc(expenses);

    let mut nodes = Vec::with_capacity(incomes.len() + expenses.len() + 2);
    let mut links = Vec::with_capacity(incomes.len() + expenses.len() + 1);

    for income in &sorted_incomes {
        nodes.push(item_node(income, NodeCategory::Income, INCOME_COLOR, total_budget));
    }

    if balance < 0 {
        let deficit = balance.saturating_abs();
        nodes.push(synthetic_node(
            DEFICIT_NAME,
            DEFICIT_LABEL,
            deficit,
            NodeCategory::Income,
            DEFICIT_COLOR,
            total_budget,
        ));
    }

    let budget_index = nodes.len();
    nodes.push(SankeyNode {
        name: BUDGET_NAME.into(),
        display_name: BUDGET_NAME.into(),
        value: total_budget,
        percentage: None,
        item_id: None,
        category: NodeCategory::Balance,
        color: BUDGET_COLOR,
    });

    // Everything before the budget node flows into it.
    for (index, node) in nodes[..budget_index].iter().enumerate() {
        links.push(SankeyLink {
            source: index,
            target: budget_index,
            value: node.value,
        });
    }

    for expense in &sorted_expenses {
        links.push(SankeyLink {
            source: budget_index,
            target: nodes.len(),
            value: expense.amount,
        });
        nodes.push(item_node(expense, NodeCategory::Expense, EXPENSE_COLOR, total_budget));
    }

    if balance > 0 {
        links.push(SankeyLink {
            source: budget_index,
            target: nodes.len(),
            value: balance,
        });
        nodes.push(synthetic_node(
            SURPLUS_NAME,
            SURPLUS_LABEL,
            balance,
            NodeCategory::Balance,
            SURPLUS_COLOR,
            total_budget,
        ));
    }

    tracing::trace!(
        nodes = nodes.len(),
        links = links.len(),
        total_income,
        total_expense,
        "Built sankey graph"
    );

    SankeyData { nodes, links }
}

/// Share of `value` in `total_budget`, as a whole percent.
///
/// Rounds half up. A non-positive budget yields 0 rather than dividing by it.
pub fn percentage(value: i64, total_budget: i64) -> i64 {
    if total_budget <= 0 {
        return 0;
    }
    (value as f64 / total_budget as f64 * 100.0 + 0.5).floor() as i64
}

pub fn total(items: &[CashflowItem]) -> i64 {
    items
        .iter()
        .fold(0i64, |sum, item| sum.saturating_add(item.amount))
}

fn sorted_desc(items: &[CashflowItem]) -> Vec<&CashflowItem> {
    let mut sorted: Vec<&CashflowItem> = items.iter().collect();
    // sort_by is stable
    sorted.sort_by(|a, b| b.amount.cmp(&a.amount));
    sorted
}

fn item_node(
    item: &CashflowItem,
    category: NodeCategory,
    color: &'static str,
    total_budget: i64,
) -> SankeyNode {
    let percentage = percentage(item.amount, total_budget);
    SankeyNode {
        name: item.name.clone(),
        display_name: format!("{}\n{}%", item.name, percentage),
        value: item.amount,
        percentage: Some(percentage),
        item_id: Some(item.id.clone()),
        category,
        color,
    }
}

fn synthetic_node(
    name: &str,
    label: &str,
    value: i64,
    category: NodeCategory,
    color: &'static str,
    total_budget: i64,
) -> SankeyNode {
    let percentage = percentage(value, total_budget);
    SankeyNode {
        name: name.into(),
        display_name: format!("{}\n{}%", label, percentage),
        value,
        percentage: Some(percentage),
        item_id: None,
        category,
        color,
    }
}
