//! BOM Hierarchy View
//!
//! Turns a BOM tree into indented rows, honouring a per-node expand/collapse
//! state. Nodes are expanded unless explicitly collapsed, and collapsing a
//! node only hides its descendants; their own flags are left untouched.

use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use tradeflow_models::BomItem;

use super::rollup::subtree_cost;
use crate::error::{TradeflowError, TradeflowResult};

/// Indentation per tree level, in characters.
pub const INDENT_WIDTH: usize = 2;

/// Position of a node as child indices from the root list, shown as `0.1.2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl FromStr for NodePath {
    type Err = TradeflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let indices = s
            .trim()
            .split('.')
            .map(|part| part.parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| TradeflowError::validation("path", format!("Invalid node path '{}'", s)))?;

        Ok(Self(indices))
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-node expand/collapse flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpandState {
    collapsed: HashSet<NodePath>,
}

impl ExpandState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a comma separated list of collapsed paths, e.g. `0,1.2`.
    pub fn parse_collapsed(list: &str) -> TradeflowResult<Self> {
        let collapsed = list
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(NodePath::from_str)
            .collect::<TradeflowResult<HashSet<_>>>()?;

        Ok(Self { collapsed })
    }

    pub fn is_expanded(&self, path: &NodePath) -> bool {
        !self.collapsed.contains(path)
    }

    pub fn collapse(&mut self, path: NodePath) {
        self.collapsed.insert(path);
    }

    pub fn expand(&mut self, path: &NodePath) {
        self.collapsed.remove(path);
    }

    /// Flips the flag for `path` and returns whether it is now expanded.
    pub fn toggle(&mut self, path: NodePath) -> bool {
        if self.collapsed.remove(&path) {
            true
        } else {
            self.collapsed.insert(path);
            false
        }
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }
}

/// One visible line of the hierarchy.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyRow {
    pub path: NodePath,
    pub depth: usize,
    pub indent: usize,
    pub has_children: bool,
    pub expanded: bool,
    pub item_code: u64,
    pub item_description: String,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
    pub rolled_up_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uom: Option<String>,
}

/// Rows for every node whose ancestors are all expanded, in depth-first order.
pub fn visible_rows(items: &[BomItem], state: &ExpandState) -> Vec<HierarchyRow> {
    let mut rows = Vec::new();
    for (index, item) in items.iter().enumerate() {
        push_rows(item, NodePath::root(index), state, &mut rows);
    }
    rows
}

fn push_rows(item: &BomItem, path: NodePath, state: &ExpandState, rows: &mut Vec<HierarchyRow>) {
    let expanded = state.is_expanded(&path);
    let depth = path.depth();

    rows.push(HierarchyRow {
        path: path.clone(),
        depth,
        indent: depth * INDENT_WIDTH,
        has_children: !item.is_leaf(),
        expanded,
        item_code: item.item_code,
        item_description: item.item_description.clone(),
        quantity: item.quantity,
        rate: item.rate,
        amount: item.amount,
        rolled_up_cost: subtree_cost(item),
        uom: item.uom.clone(),
    });

    if expanded {
        for (index, child) in item.children.iter().enumerate() {
            push_rows(child, path.child(index), state, rows);
        }
    }
}

/// Plain-text rendering of the visible rows, one line per row.
pub fn render_text(items: &[BomItem], state: &ExpandState) -> String {
    visible_rows(items, state)
        .iter()
        .map(|row| {
            let marker = match (row.has_children, row.expanded) {
                (false, _) => "-",
                (true, true) => "▾",
                (true, false) => "▸",
            };
            format!(
                "{:indent$}{} {} {} {} x {:.2} = {:.2}",
                "",
                marker,
                row.item_code,
                row.item_description,
                row.quantity,
                row.rate,
                row.amount,
                indent = row.indent
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
