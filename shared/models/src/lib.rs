//! # Tradeflow Core Domain Models
//!
//! This module contains the bill of materials domain models for the Tradeflow ERP system.
//! All models implement serialization/deserialization with serde and validation with the validator crate.
//!
//! ## Key Models
//!
//! - **BomItem**: A recursive line item owning its sub-components
//! - **Bom**: A versioned bill of materials document with its derived material cost
//! - **BomDraft** / **BomRevision**: Request bodies for creating and editing BOMs
//!
//! ## Validation
//!
//! - Quantity must be at least 1, rate must be non-negative
//! - Item descriptions must not be blank
//! - A BOM must hold at least one item
//! - Nested items are validated to any depth

pub mod bom;

#[cfg(test)]
pub mod property_tests;

pub use bom::*;
