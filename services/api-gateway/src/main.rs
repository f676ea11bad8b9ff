use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    response::Json,
    routing::get,
    serve, Router,
};
use serde_json::json;
use std::{
    net::{IpAddr, SocketAddr},
    time::Duration,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tradeflow_database::{initialize_database, BomRepository, DatabaseConfig, MongoClient};
use tradeflow_utils::{init_logging, log_error, AppConfig};

mod handlers;
mod metrics;
mod middleware;
mod routes;
mod service;

use metrics::BomMetrics;
use middleware::*;
use service::BomService;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|error| {
        eprintln!("Failed to load configuration ({}), using defaults", error);
        AppConfig::default()
    });

    // Initialize logging
    init_logging(&config.logging)?;
    info!("Starting Tradeflow API Gateway");

    // Initialize database
    let db_config = DatabaseConfig {
        mongodb_url: config.database.mongodb_url.clone(),
        database_name: config.database.database_name.clone(),
        connection_timeout: Duration::from_secs(config.database.connection_timeout_seconds),
    };
    let (mongo_client, database) = initialize_database(&db_config).await?;
    info!("Database connection established");

    let metrics = BomMetrics::register(&config.monitoring.prometheus_namespace)?;
    let state = AppState {
        mongo_client,
        boms: BomService::new(BomRepository::new(&database), metrics),
        config: config.clone(),
    };

    // Build application router
    let app = create_app(state);

    // Start server
    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server host '{}'", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("API Gateway listening on {}", addr);

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn create_app(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.timeout_seconds);
    let body_limit = state.config.server.max_request_size;

    let mut app = Router::new()
        // Health check endpoint
        .route("/health", get(health_check));

    if state.config.monitoring.metrics_enabled {
        app = app.route("/metrics", get(metrics_handler));
    }

    app
        // API routes
        .nest("/api/v1", routes::create_api_routes())

        // Middleware stack
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST, Method::PATCH])
                        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                )
                .layer(TimeoutLayer::new(timeout))
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(axum::middleware::from_fn(error_handling_middleware))
        )

        // Application state
        .with_state(state)
}

#[derive(Clone)]
pub struct AppState {
    pub mongo_client: MongoClient,
    pub boms: BomService,
    pub config: AppConfig,
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "tradeflow-api-gateway",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn metrics_handler() -> String {
    use prometheus::TextEncoder;

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder.encode_to_string(&metric_families)
        .unwrap_or_else(|_| "Error encoding metrics".to_string())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        log_error!(error, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    // Nothing listens on port 1; requests that reach the database fail fast
    async fn test_app() -> Router {
        let client = MongoClient::with_uri_str("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200")
            .await
            .unwrap();
        let database = client.database("tradeflow_test");
        let metrics = BomMetrics::register("tradeflow_test").unwrap();

        create_app(AppState {
            mongo_client: client,
            boms: BomService::new(BomRepository::new(&database), metrics),
            config: AppConfig::default(),
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = test_app()
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = test_app()
            .await
            .oneshot(
                Request::get("/health")
                    .header(REQUEST_ID_HEADER, "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-123");
    }

    #[tokio::test]
    async fn test_create_rejects_zero_quantity() {
        let body = json!({
            "bomNumber": "BOM-0001",
            "productName": "Control Panel",
            "items": [{
                "itemCode": 1,
                "itemDescription": "Enclosure",
                "quantity": 1,
                "rate": 250,
                "children": [{
                    "itemCode": 2,
                    "itemDescription": "Hinge",
                    "quantity": 0,
                    "rate": 4
                }]
            }]
        });

        let response = test_app()
            .await
            .oneshot(
                Request::post("/api/v1/boms")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = body_json(response).await;
        assert_eq!(error["code"], "VALIDATION_ERROR");
        assert_eq!(error["details"]["field"], "items[0].children[0].quantity");
        assert!(error["message"]
            .as_str()
            .unwrap()
            .contains("Quantity must be greater than 0"));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_items() {
        let body = json!({ "bomNumber": "BOM-0002", "productName": "Cabinet", "items": [] });

        let response = test_app()
            .await
            .oneshot(
                Request::post("/api/v1/boms")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = body_json(response).await;
        assert_eq!(error["details"]["field"], "items");
        assert_eq!(error["message"], "items: At least one item is required");
    }

    #[tokio::test]
    async fn test_malformed_id_is_rejected() {
        let response = test_app()
            .await
            .oneshot(Request::get("/api/v1/boms/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_patch_with_malformed_id_is_rejected() {
        let response = test_app()
            .await
            .oneshot(
                Request::patch("/api/v1/boms/not-a-uuid")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "changeNote": "x" }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_rejects_oversized_page() {
        let response = test_app()
            .await
            .oneshot(Request::get("/api/v1/boms?limit=500").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["details"]["field"], "limit");
    }

    #[tokio::test]
    async fn test_list_rejects_page_past_offset_range() {
        let response = test_app()
            .await
            .oneshot(
                Request::get("/api/v1/boms?page=1844674407370955161&limit=100")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["details"]["field"], "page");
    }

    #[tokio::test]
    async fn test_hierarchy_rejects_bad_collapsed_paths() {
        let uri = format!("/api/v1/boms/{}/hierarchy?collapsed=0.x", uuid::Uuid::new_v4());
        let response = test_app()
            .await
            .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let response = test_app()
            .await
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
