//! Property-based tests for the BOM domain models
//!
//! Covers validation boundaries for arbitrary trees and the append-only
//! version chain produced by repeated revisions.

use proptest::prelude::*;
use validator::Validate;

use crate::{Bom, BomDraft, BomItem, BomRevision};

prop_compose! {
    fn arb_leaf()(
        item_code in 0..100_000u64,
        description in "[A-Za-z][A-Za-z ]{0,30}",
        quantity in 1..500u32,
        rate in 0..10_000u32
    ) -> BomItem {
        BomItem::new(item_code, description, quantity as f64, rate as f64)
    }
}

fn arb_item() -> impl Strategy<Value = BomItem> {
    arb_leaf().prop_recursive(4, 48, 4, |inner| {
        (arb_leaf(), prop::collection::vec(inner, 0..4)).prop_map(|(mut item, children)| {
            item.children = children;
            item
        })
    })
}

prop_compose! {
    fn arb_draft()(
        bom_number in "BOM-[0-9]{4}",
        product_name in "[A-Za-z][A-Za-z ]{2,40}",
        items in prop::collection::vec(arb_item(), 1..4)
    ) -> BomDraft {
        BomDraft {
            bom_number,
            product_name,
            customer_id: None,
            description: None,
            items,
        }
    }
}

fn set_first_leaf_quantity(items: &mut [BomItem], quantity: f64) {
    let mut node = &mut items[0];
    while !node.children.is_empty() {
        node = &mut node.children[0];
    }
    node.quantity = quantity;
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_well_formed_trees_validate(draft in arb_draft()) {
        let bom = Bom::from_draft(draft);
        prop_assert!(bom.validate().is_ok());
    }

    #[test]
    fn prop_sub_unit_quantity_anywhere_is_rejected(
        draft in arb_draft(),
        quantity in 0.0..0.999f64
    ) {
        let mut bom = Bom::from_draft(draft);
        set_first_leaf_quantity(&mut bom.items, quantity);
        prop_assert!(bom.validate().is_err());
    }

    #[test]
    fn prop_revision_chain_keeps_base_and_history(
        draft in arb_draft(),
        revisions in 1..8usize
    ) {
        let first = Bom::from_draft(draft);
        let mut current = first.clone();

        for n in 0..revisions {
            let next = current.revise(BomRevision {
                change_note: Some(format!("edit {}", n)),
                ..Default::default()
            });
            prop_assert_eq!(next.parent_version_id.as_deref(), Some(current.id.as_str()));
            current = next;
        }

        prop_assert_eq!(&current.base_id, &first.id);
        prop_assert_eq!(current.version_number as usize, revisions + 1);
        prop_assert_eq!(current.version_history.len(), revisions);
        prop_assert_eq!(&current.version_history[0].version_id, &first.id);

        let numbers: Vec<u32> = current.version_history.iter().map(|e| e.version_number).collect();
        let expected: Vec<u32> = (1..=revisions as u32).collect();
        prop_assert_eq!(numbers, expected);
    }

    #[test]
    fn prop_item_json_round_trip(item in arb_item()) {
        let json = serde_json::to_string(&item).unwrap();
        let back: BomItem = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(item, back);
    }
}
