//! Repository module for database CRUD operations
//!
//! Provides typed repository implementations for the domain entities.

pub mod bom;

pub use bom::{BomListFilter, BomPage, BomRepository, RevisionOutcome, BOM_COLLECTION};
