//! BOM Handlers
//!
//! CRUD and versioning endpoints for bills of materials.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use tradeflow_database::BomListFilter;
use tradeflow_models::{Bom, BomDraft, BomRevision};
use tradeflow_utils::{
    bom::{render_text, ExpandState, HierarchyRow},
    TradeflowError,
};

/// Query parameters for listing BOMs
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBomsQuery {
    pub search: Option<String>,
    pub customer_id: Option<String>,
    #[serde(default)]
    pub include_history: bool,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl From<ListBomsQuery> for BomListFilter {
    fn from(query: ListBomsQuery) -> Self {
        let defaults = BomListFilter::default();
        Self {
            search: query.search,
            customer_id: query.customer_id,
            include_history: query.include_history,
            page: query.page.unwrap_or(defaults.page),
            limit: query.limit.unwrap_or(defaults.limit),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BomListResponse {
    pub items: Vec<Bom>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// List BOMs
///
/// GET /api/v1/boms
pub async fn list_boms(
    State(state): State<AppState>,
    Query(query): Query<ListBomsQuery>,
) -> Result<Json<BomListResponse>, TradeflowError> {
    let filter = BomListFilter::from(query);
    let (page, limit) = (filter.page, filter.limit);

    let result = state.boms.list(filter).await?;

    Ok(Json(BomListResponse {
        items: result.items,
        total: result.total,
        page,
        limit,
    }))
}

/// Create a BOM
///
/// POST /api/v1/boms
pub async fn create_bom(
    State(state): State<AppState>,
    Json(draft): Json<BomDraft>,
) -> Result<(StatusCode, Json<Bom>), TradeflowError> {
    let bom = state.boms.create(draft).await?;
    Ok((StatusCode::CREATED, Json(bom)))
}

/// GET /api/v1/boms/:id
pub async fn get_bom(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Bom>, TradeflowError> {
    Ok(Json(state.boms.get(&id).await?))
}

/// Edit a BOM by appending a new version
///
/// PATCH /api/v1/boms/:id
pub async fn update_bom(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(revision): Json<BomRevision>,
) -> Result<(StatusCode, Json<Bom>), TradeflowError> {
    let bom = state.boms.revise(&id, revision).await?;
    Ok((StatusCode::CREATED, Json(bom)))
}

/// GET /api/v1/boms/:id/versions
pub async fn list_bom_versions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Bom>>, TradeflowError> {
    Ok(Json(state.boms.versions(&id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct HierarchyQuery {
    /// Comma separated node paths to collapse, e.g. `0,1.2`
    pub collapsed: Option<String>,
    /// `text` for a plain-text rendering, JSON rows otherwise
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyResponse {
    pub bom_id: String,
    pub version_number: u32,
    pub total_material_cost: f64,
    pub rows: Vec<HierarchyRow>,
}

/// Indented, collapsible view of the item tree
///
/// GET /api/v1/boms/:id/hierarchy
pub async fn get_bom_hierarchy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<HierarchyQuery>,
) -> Result<Response, TradeflowError> {
    let expand_state = match query.collapsed.as_deref() {
        Some(collapsed) => ExpandState::parse_collapsed(collapsed)?,
        None => ExpandState::new(),
    };

    let (bom, rows) = state.boms.hierarchy(&id, &expand_state).await?;

    if query.format.as_deref() == Some("text") {
        let text = render_text(&bom.items, &expand_state);
        return Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response());
    }

    Ok(Json(HierarchyResponse {
        bom_id: bom.id,
        version_number: bom.version_number,
        total_material_cost: bom.total_material_cost,
        rows,
    })
    .into_response())
}
