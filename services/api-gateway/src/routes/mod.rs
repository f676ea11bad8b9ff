use axum::{routing::get, Router};

use crate::{handlers::*, AppState};

pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/health/detailed", get(detailed_health_check))
        .route("/boms", get(list_boms).post(create_bom))
        .route("/boms/:id", get(get_bom).patch(update_bom))
        .route("/boms/:id/versions", get(list_bom_versions))
        .route("/boms/:id/hierarchy", get(get_bom_hierarchy))
}
