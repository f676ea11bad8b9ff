//! BOM (Bill of Materials) Processing Module
//!
//! Cost rollup over the recursive item tree and the indented,
//! collapsible hierarchy view built on top of it.

pub mod rollup;
pub mod hierarchy;

pub use rollup::{
    assign_levels, compute_amounts, compute_total_cost, flatten, recalculate, subtree_cost,
};
pub use hierarchy::{render_text, visible_rows, ExpandState, HierarchyRow, NodePath, INDENT_WIDTH};
