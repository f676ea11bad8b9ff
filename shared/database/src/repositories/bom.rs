//! BOM Repository
//!
//! Persistence for versioned BOM documents. Every version is its own
//! document; versions of one BOM share a `baseId` and exactly one of them
//! carries `isLatestVersion: true`.

use anyhow::{Context, Result};
use mongodb::{
    bson::{doc, Document},
    options::{FindOptions, IndexOptions},
    Collection, Cursor, IndexModel,
};

use tradeflow_models::Bom;

use crate::MongoDatabase;

pub const BOM_COLLECTION: &str = "boms";

/// Listing criteria for BOMs. `page` is 1-based.
#[derive(Debug, Clone)]
pub struct BomListFilter {
    pub search: Option<String>,
    pub customer_id: Option<String>,
    pub include_history: bool,
    pub page: u64,
    pub limit: u64,
}

impl Default for BomListFilter {
    fn default() -> Self {
        Self {
            search: None,
            customer_id: None,
            include_history: false,
            page: 1,
            limit: 20,
        }
    }
}

impl BomListFilter {
    /// Builds the MongoDB query document for this filter.
    pub fn to_query(&self) -> Document {
        let mut query = Document::new();

        if !self.include_history {
            query.insert("isLatestVersion", true);
        }

        if let Some(customer_id) = &self.customer_id {
            query.insert("customerId", customer_id.clone());
        }

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            // User input is matched literally, never as a pattern
            let pattern = regex::escape(search);
            query.insert(
                "$or",
                vec![
                    doc! { "bomNumber": { "$regex": pattern.clone(), "$options": "i" } },
                    doc! { "productName": { "$regex": pattern, "$options": "i" } },
                ],
            );
        }

        query
    }

    /// Documents to skip before this page. Pages past the end of the
    /// addressable range saturate instead of wrapping.
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// One page of a BOM listing.
#[derive(Debug, Clone)]
pub struct BomPage {
    pub items: Vec<Bom>,
    pub total: u64,
}

/// Result of appending a new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionOutcome {
    Inserted,
    /// The previous version was no longer the latest one.
    Stale,
}

#[derive(Clone)]
pub struct BomRepository {
    collection: Collection<Bom>,
}

impl BomRepository {
    pub fn new(database: &MongoDatabase) -> Self {
        Self {
            collection: database.collection::<Bom>(BOM_COLLECTION),
        }
    }

    /// Creates the indexes the versioning scheme relies on
    pub async fn ensure_indexes(&self) -> Result<()> {
        let single_latest = IndexModel::builder()
            .keys(doc! { "baseId": 1 })
            .options(
                IndexOptions::builder()
                    .name("single_latest_version".to_string())
                    .unique(true)
                    .partial_filter_expression(doc! { "isLatestVersion": true })
                    .build(),
            )
            .build();

        let version_number = IndexModel::builder()
            .keys(doc! { "baseId": 1, "versionNumber": 1 })
            .options(
                IndexOptions::builder()
                    .name("base_version_number".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let listing = IndexModel::builder()
            .keys(doc! { "isLatestVersion": 1, "bomNumber": 1 })
            .options(IndexOptions::builder().name("latest_by_number".to_string()).build())
            .build();

        self.collection
            .create_indexes([single_latest, version_number, listing], None)
            .await
            .context("Failed to create BOM indexes")?;

        Ok(())
    }

    /// Find one version by its ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Bom>> {
        self.collection
            .find_one(doc! { "_id": id }, None)
            .await
            .context("Failed to fetch BOM by ID")
    }

    /// Find the current version of a BOM
    pub async fn find_latest(&self, base_id: &str) -> Result<Option<Bom>> {
        self.collection
            .find_one(doc! { "baseId": base_id, "isLatestVersion": true }, None)
            .await
            .context("Failed to fetch latest BOM version")
    }

    /// Find every version of a BOM, oldest first
    pub async fn find_versions(&self, base_id: &str) -> Result<Vec<Bom>> {
        let options = FindOptions::builder()
            .sort(doc! { "versionNumber": 1 })
            .build();

        let cursor = self
            .collection
            .find(doc! { "baseId": base_id }, options)
            .await
            .context("Failed to fetch BOM versions")?;

        collect(cursor).await
    }

    /// List BOMs matching a filter, ordered by BOM number then newest version first
    pub async fn list(&self, filter: &BomListFilter) -> Result<BomPage> {
        let query = filter.to_query();

        let total = self
            .collection
            .count_documents(query.clone(), None)
            .await
            .context("Failed to count BOMs")?;

        let options = FindOptions::builder()
            .sort(doc! { "bomNumber": 1, "versionNumber": -1 })
            .skip(filter.skip())
            .limit(filter.limit as i64)
            .build();

        let cursor = self
            .collection
            .find(query, options)
            .await
            .context("Failed to list BOMs")?;

        Ok(BomPage {
            items: collect(cursor).await?,
            total,
        })
    }

    /// Insert the first version of a BOM
    pub async fn create(&self, bom: &Bom) -> Result<()> {
        self.collection
            .insert_one(bom, None)
            .await
            .context("Failed to create BOM")?;

        Ok(())
    }

    /// Append `next` after `previous`.
    ///
    /// The latest flag on `previous` is cleared with a conditional update
    /// first, so of two concurrent edits of the same version only one wins;
    /// the other gets `RevisionOutcome::Stale`. If the insert then fails the
    /// flag is restored.
    pub async fn insert_revision(&self, previous: &Bom, next: &Bom) -> Result<RevisionOutcome> {
        let retired = self
            .collection
            .update_one(
                doc! { "_id": previous.id.as_str(), "isLatestVersion": true },
                doc! { "$set": { "isLatestVersion": false } },
                None,
            )
            .await
            .context("Failed to retire previous BOM version")?;

        if retired.matched_count == 0 {
            return Ok(RevisionOutcome::Stale);
        }

        if let Err(error) = self.collection.insert_one(next, None).await {
            tracing::warn!(
                bom_id = %previous.id,
                "Revision insert failed, restoring latest flag"
            );
            self.collection
                .update_one(
                    doc! { "_id": previous.id.as_str() },
                    doc! { "$set": { "isLatestVersion": true } },
                    None,
                )
                .await
                .context("Failed to restore latest flag after failed revision")?;

            return Err(anyhow::Error::new(error).context("Failed to insert BOM revision"));
        }

        Ok(RevisionOutcome::Inserted)
    }
}

async fn collect(mut cursor: Cursor<Bom>) -> Result<Vec<Bom>> {
    let mut boms = Vec::new();
    while cursor.advance().await.context("Failed to read BOM cursor")? {
        boms.push(cursor.deserialize_current().context("Failed to decode BOM document")?);
    }
    Ok(boms)
}
