use axum::{
    http::Request,
    middleware::Next,
    response::Response,
};

/// Logs failed requests; error bodies are produced by `TradeflowError`.
pub async fn error_handling_middleware(
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;
    let status = response.status();

    if status.is_server_error() {
        tracing::error!(%method, %uri, status = status.as_u16(), "Request failed");
    } else if status.is_client_error() {
        tracing::debug!(%method, %uri, status = status.as_u16(), "Request rejected");
    }

    response
}
