//! BOM Cost Rollup
//!
//! Derives per-item amounts and the total material cost of a BOM tree.

use tradeflow_models::{Bom, BomItem};

/// Sets `amount = quantity * rate` on every node of the tree.
///
/// Each node depends only on its own quantity and rate, so calling this
/// repeatedly yields the same amounts.
pub fn compute_amounts(items: &mut [BomItem]) {
    for item in items.iter_mut() {
        item.amount = item.quantity * item.rate;
        compute_amounts(&mut item.children);
    }
}

/// Sums the pre-set amounts of every node in the tree.
pub fn compute_total_cost(items: &[BomItem]) -> f64 {
    items.iter().map(subtree_cost).sum()
}

/// Own amount plus the amounts of all descendants.
pub fn subtree_cost(item: &BomItem) -> f64 {
    item.amount + compute_total_cost(&item.children)
}

/// Sets `level` to each node's depth, roots being level 0.
pub fn assign_levels(items: &mut [BomItem]) {
    assign_levels_from(items, 0);
}

fn assign_levels_from(items: &mut [BomItem], level: u32) {
    for item in items.iter_mut() {
        item.level = level;
        assign_levels_from(&mut item.children, level + 1);
    }
}

/// Recomputes levels, amounts and the total on a BOM before it is persisted.
///
/// Returns the new total material cost.
pub fn recalculate(bom: &mut Bom) -> f64 {
    assign_levels(&mut bom.items);
    compute_amounts(&mut bom.items);
    bom.total_material_cost = compute_total_cost(&bom.items);
    bom.total_material_cost
}

/// Depth-first, pre-order list of every node in the tree.
pub fn flatten(items: &[BomItem]) -> Vec<&BomItem> {
    let mut nodes = Vec::new();
    collect(items, &mut nodes);
    nodes
}

fn collect<'a>(items: &'a [BomItem], nodes: &mut Vec<&'a BomItem>) {
    for item in items {
        nodes.push(item);
        collect(&item.children, nodes);
    }
}
