//! BOM Service
//!
//! Business rules for the BOM lifecycle: validation, server-side cost
//! recalculation, and append-only versioning.

use tradeflow_database::{BomListFilter, BomPage, BomRepository, RevisionOutcome};
use tradeflow_models::{Bom, BomDraft, BomRevision};
use tradeflow_utils::{
    bom::{recalculate, visible_rows, ExpandState, HierarchyRow},
    log_info, validate_model, validate_page_request, validate_uuid, TradeflowError,
    TradeflowResult,
};

use crate::metrics::BomMetrics;

#[derive(Clone)]
pub struct BomService {
    repository: BomRepository,
    metrics: BomMetrics,
}

impl BomService {
    pub fn new(repository: BomRepository, metrics: BomMetrics) -> Self {
        Self {
            repository,
            metrics,
        }
    }

    /// Create version 1 of a new BOM
    pub async fn create(&self, draft: BomDraft) -> TradeflowResult<Bom> {
        let mut bom = Bom::from_draft(draft);
        prepare_for_submit(&mut bom)?;

        self.repository.create(&bom).await?;
        self.metrics.created.inc();

        log_info!(
            "Created BOM {bom_number} ({id}), total material cost {total}",
            bom_number = bom.bom_number,
            id = bom.id,
            total = bom.total_material_cost
        );
        Ok(bom)
    }

    pub async fn get(&self, id: &str) -> TradeflowResult<Bom> {
        validate_uuid(id)?;

        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| TradeflowError::not_found(format!("BOM {}", id)))
    }

    /// Append a new version derived from `id`, which must be the latest one.
    pub async fn revise(&self, id: &str, revision: BomRevision) -> TradeflowResult<Bom> {
        let current = self.get(id).await?;
        if !current.is_latest_version {
            return Err(stale_version(&current));
        }

        let mut next = current.revise(revision);
        prepare_for_submit(&mut next)?;

        match self.repository.insert_revision(&current, &next).await? {
            RevisionOutcome::Inserted => {
                self.metrics.revised.inc();
                log_info!(
                    "Revised BOM {base_id} to version {version}",
                    base_id = next.base_id,
                    version = next.version_number
                );
                Ok(next)
            }
            RevisionOutcome::Stale => {
                self.metrics.stale_revisions.inc();
                Err(stale_version(&current))
            }
        }
    }

    /// Every version sharing the base of `id`, oldest first
    pub async fn versions(&self, id: &str) -> TradeflowResult<Vec<Bom>> {
        let bom = self.get(id).await?;
        Ok(self.repository.find_versions(&bom.base_id).await?)
    }

    pub async fn list(&self, filter: BomListFilter) -> TradeflowResult<BomPage> {
        validate_page_request(filter.page, filter.limit)?;
        Ok(self.repository.list(&filter).await?)
    }

    pub async fn hierarchy(
        &self,
        id: &str,
        state: &ExpandState,
    ) -> TradeflowResult<(Bom, Vec<HierarchyRow>)> {
        let bom = self.get(id).await?;
        let rows = visible_rows(&bom.items, state);
        Ok((bom, rows))
    }
}

/// Validates a BOM and recomputes levels, amounts and the total.
///
/// Client-supplied amounts are never persisted. A total that overflows to
/// infinity has no JSON representation and is rejected.
pub fn prepare_for_submit(bom: &mut Bom) -> TradeflowResult<f64> {
    validate_model(&*bom)?;

    let total = recalculate(bom);
    if !total.is_finite() {
        return Err(TradeflowError::validation(
            "total_material_cost",
            "Total material cost exceeds the supported range",
        ));
    }
    Ok(total)
}

fn stale_version(bom: &Bom) -> TradeflowError {
    TradeflowError::conflict(format!(
        "BOM {} version {} is not the latest version; reload and edit the latest version",
        bom.id, bom.version_number
    ))
}
