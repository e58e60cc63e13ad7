use serde::Serialize;

use crate::models::ItemId;

/// Which side of the diagram a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Income,
    Expense,
    Balance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyNode {
    pub name: String,
    pub display_name: String,
    pub value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<i64>,
    /// Originating item; `None` for synthesized nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemId>,
    pub category: NodeCategory,
    pub color: &'static str,
}

/// Edge between two nodes, by index into the node list of the same build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SankeyLink {
    pub source: usize,
    pub target: usize,
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SankeyData {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
}
