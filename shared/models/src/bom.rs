//! Bill of materials domain models for the Tradeflow ERP system.
//!
//! A BOM is an ordered list of root line items, each of which may own
//! further line items to any depth. Costs are derived from the tree and are
//! never trusted from the client; see `tradeflow_utils::bom::rollup`.
//!
//! BOMs are versioned by appending documents: every edit produces a new
//! `Bom` sharing the `base_id` of the first version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A single line of a bill of materials, owning its sub-components.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BomItem {
    pub item_code: u64,
    #[validate(
        length(max = 500, message = "Item description must be at most 500 characters"),
        custom = "validate_not_blank"
    )]
    pub item_description: String,
    #[validate(range(min = 1.0, message = "Quantity must be greater than 0"))]
    pub quantity: f64,
    #[validate(range(min = 0.0, message = "Rate must be a positive number"))]
    pub rate: f64,
    /// `quantity * rate`, recomputed on every submit.
    #[serde(default)]
    pub amount: f64,
    /// Depth in the tree, 0 for root items.
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    #[validate]
    pub children: Vec<BomItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 20))]
    pub uom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 10))]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_consideration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 1000))]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Snapshot of a superseded version, kept on every later version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionHistoryEntry {
    pub version_id: String,
    pub version_number: u32,
    pub total_material_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A versioned bill of materials document.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_has_items"))]
pub struct Bom {
    #[serde(rename = "_id")]
    pub id: String,
    #[validate(length(min = 1, max = 50, message = "BOM number must be between 1 and 50 characters"))]
    pub bom_number: String,
    #[validate(length(min = 1, max = 200, message = "Product name must be between 1 and 200 characters"))]
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate]
    pub items: Vec<BomItem>,
    #[serde(default)]
    pub total_material_cost: f64,
    pub base_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_version_id: Option<String>,
    pub version_number: u32,
    pub is_latest_version: bool,
    #[serde(default)]
    pub version_history: Vec<VersionHistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 500))]
    pub change_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating the first version of a BOM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BomDraft {
    pub bom_number: String,
    pub product_name: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Vec<BomItem>,
}

/// Request body for editing a BOM. Absent fields carry over from the
/// version being revised.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BomRevision {
    #[serde(default)]
    pub bom_number: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<BomItem>>,
    #[serde(default)]
    pub change_note: Option<String>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::from("Item description is required"));
        return Err(error);
    }
    Ok(())
}

fn validate_has_items(bom: &Bom) -> Result<(), ValidationError> {
    if bom.items.is_empty() {
        let mut error = ValidationError::new("items_required");
        error.message = Some(Cow::from("At least one item is required"));
        error.add_param(Cow::from("field"), &"items");
        return Err(error);
    }
    Ok(())
}

impl BomItem {
    /// Creates a leaf item. Amount and level are filled in by the rollup.
    pub fn new(item_code: u64, item_description: impl Into<String>, quantity: f64, rate: f64) -> Self {
        Self {
            item_code,
            item_description: item_description.into(),
            quantity,
            rate,
            amount: 0.0,
            level: 0,
            children: Vec::new(),
            uom: None,
            currency: None,
            material_consideration: None,
            remarks: None,
            parent_id: None,
        }
    }

    /// Appends a sub-component, preserving insertion order
    pub fn with_child(mut self, child: BomItem) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl Bom {
    /// Builds version 1 of a new BOM from a create request.
    ///
    /// The total is left at zero; callers recompute it before persisting.
    pub fn from_draft(draft: BomDraft) -> Self {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        Self {
            base_id: id.clone(),
            id,
            bom_number: draft.bom_number,
            product_name: draft.product_name,
            customer_id: draft.customer_id,
            description: draft.description,
            items: draft.items,
            total_material_cost: 0.0,
            parent_version_id: None,
            version_number: 1,
            is_latest_version: true,
            version_history: Vec::new(),
            change_note: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derives the next version from this one.
    ///
    /// `self` is not modified; marking it superseded is the repository's job
    /// so that the flag flip and the insert can be ordered against the store.
    pub fn revise(&self, revision: BomRevision) -> Bom {
        let now = Utc::now();

        let mut version_history = self.version_history.clone();
        version_history.push(self.history_entry());

        Bom {
            id: Uuid::new_v4().to_string(),
            bom_number: revision.bom_number.unwrap_or_else(|| self.bom_number.clone()),
            product_name: revision.product_name.unwrap_or_else(|| self.product_name.clone()),
            customer_id: revision.customer_id.or_else(|| self.customer_id.clone()),
            description: revision.description.or_else(|| self.description.clone()),
            items: revision.items.unwrap_or_else(|| self.items.clone()),
            total_material_cost: self.total_material_cost,
            base_id: self.base_id.clone(),
            parent_version_id: Some(self.id.clone()),
            version_number: self.version_number + 1,
            is_latest_version: true,
            version_history,
            change_note: revision.change_note,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn history_entry(&self) -> VersionHistoryEntry {
        VersionHistoryEntry {
            version_id: self.id.clone(),
            version_number: self.version_number,
            total_material_cost: self.total_material_cost,
            change_note: self.change_note.clone(),
            created_at: self.created_at,
        }
    }

    pub fn is_first_version(&self) -> bool {
        self.parent_version_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_with(items: Vec<BomItem>) -> BomDraft {
        BomDraft {
            bom_number: "BOM-0001".to_string(),
            product_name: "Control Panel".to_string(),
            customer_id: Some("cust-42".to_string()),
            description: None,
            items,
        }
    }

    #[test]
    fn test_valid_bom_passes_validation() {
        let bom = Bom::from_draft(draft_with(vec![
            BomItem::new(100, "Enclosure", 1.0, 250.0)
                .with_child(BomItem::new(101, "Hinge", 2.0, 4.5)),
        ]));

        assert!(bom.validate().is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let item = BomItem::new(1, "Bolt", 0.0, 2.0);
        let errors = item.validate().unwrap_err();

        let field_errors = errors.field_errors();
        let quantity = field_errors.get("quantity").expect("quantity error");
        assert_eq!(
            quantity[0].message.as_deref(),
            Some("Quantity must be greater than 0")
        );
    }

    #[test]
    fn test_negative_rate_rejected() {
        let item = BomItem::new(1, "Bolt", 1.0, -0.01);
        let errors = item.validate().unwrap_err();

        let field_errors = errors.field_errors();
        let rate = field_errors.get("rate").expect("rate error");
        assert_eq!(rate[0].message.as_deref(), Some("Rate must be a positive number"));
    }

    #[test]
    fn test_zero_rate_allowed() {
        assert!(BomItem::new(1, "Free sample", 1.0, 0.0).validate().is_ok());
    }

    #[test]
    fn test_blank_description_rejected() {
        let item = BomItem::new(1, "   ", 1.0, 1.0);
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_invalid_grandchild_fails_whole_bom() {
        let bom = Bom::from_draft(draft_with(vec![
            BomItem::new(1, "Frame", 1.0, 10.0).with_child(
                BomItem::new(2, "Bracket", 1.0, 5.0)
                    .with_child(BomItem::new(3, "Rivet", 0.0, 0.1)),
            ),
        ]));

        assert!(bom.validate().is_err());
    }

    #[test]
    fn test_empty_items_rejected() {
        let bom = Bom::from_draft(draft_with(Vec::new()));
        assert!(bom.validate().is_err());
    }

    #[test]
    fn test_from_draft_starts_version_chain() {
        let bom = Bom::from_draft(draft_with(vec![BomItem::new(1, "Frame", 1.0, 10.0)]));

        assert_eq!(bom.base_id, bom.id);
        assert_eq!(bom.version_number, 1);
        assert!(bom.is_latest_version);
        assert!(bom.is_first_version());
        assert!(bom.version_history.is_empty());
    }

    #[test]
    fn test_revise_links_to_previous_version() {
        let mut v1 = Bom::from_draft(draft_with(vec![BomItem::new(1, "Frame", 1.0, 10.0)]));
        v1.total_material_cost = 10.0;

        let v2 = v1.revise(BomRevision {
            product_name: Some("Control Panel Mk2".to_string()),
            change_note: Some("renamed".to_string()),
            ..Default::default()
        });

        assert_ne!(v2.id, v1.id);
        assert_eq!(v2.base_id, v1.base_id);
        assert_eq!(v2.parent_version_id.as_deref(), Some(v1.id.as_str()));
        assert_eq!(v2.version_number, 2);
        assert!(v2.is_latest_version);
        assert_eq!(v2.product_name, "Control Panel Mk2");
        assert_eq!(v2.bom_number, v1.bom_number);
        assert_eq!(v2.items, v1.items);
        assert_eq!(v2.customer_id, v1.customer_id);
        assert_eq!(v2.version_history.len(), 1);
        assert_eq!(v2.version_history[0].version_id, v1.id);
        assert_eq!(v2.version_history[0].total_material_cost, 10.0);
    }

    #[test]
    fn test_revise_replaces_items_when_given() {
        let v1 = Bom::from_draft(draft_with(vec![BomItem::new(1, "Frame", 1.0, 10.0)]));
        let v2 = v1.revise(BomRevision {
            items: Some(vec![BomItem::new(7, "Panel", 2.0, 3.0)]),
            ..Default::default()
        });

        assert_eq!(v2.items.len(), 1);
        assert_eq!(v2.items[0].item_code, 7);
    }

    #[test]
    fn test_item_json_uses_camel_case_and_defaults() {
        let json = serde_json::json!({
            "itemCode": 12,
            "itemDescription": "Cable gland",
            "quantity": 4,
            "rate": 2.5
        });

        let item: BomItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.item_code, 12);
        assert_eq!(item.amount, 0.0);
        assert_eq!(item.level, 0);
        assert!(item.children.is_empty());

        let out = serde_json::to_value(&item).unwrap();
        assert!(out.get("itemDescription").is_some());
        assert!(out.get("uom").is_none());
    }

    #[test]
    fn test_item_code_accepts_large_identifiers() {
        let json = serde_json::json!({
            "itemCode": 9_007_199_254_740_991u64,
            "itemDescription": "Imported assembly",
            "quantity": 1,
            "rate": 10
        });

        let item: BomItem = serde_json::from_value(json).unwrap();
        assert_eq!(item.item_code, 9_007_199_254_740_991);
    }

    #[test]
    fn test_bom_id_serializes_as_underscore_id() {
        let bom = Bom::from_draft(draft_with(vec![BomItem::new(1, "Frame", 1.0, 10.0)]));
        let out = serde_json::to_value(&bom).unwrap();

        assert_eq!(out["_id"], serde_json::json!(bom.id));
        assert_eq!(out["isLatestVersion"], serde_json::json!(true));
        assert!(out.get("totalMaterialCost").is_some());
    }
}
