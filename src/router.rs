use lambda_http::http::Method;
use lambda_http::{Body, Request, Response};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::handlers::update_properties::handle_update_properties;
use crate::rate_limit::RateLimiter;
use fleetbridge_backend::Clock;

/// Route a health check request (no config needed)
pub fn route_request_health(request_id: &str) -> Result<Response<Body>, ApiError> {
    handle_health(request_id)
}

/// Route an incoming request to the appropriate handler
///
/// Path-based routing: paths are normalized (trailing slashes removed),
/// matched on (method, path) tuples, unknown routes get 404.
pub async fn route_request(
    event: Request,
    request_id: &str,
    config: &Config,
    clock: &dyn Clock,
    limiter: &RateLimiter,
) -> Result<Response<Body>, ApiError> {
    let method = event.method();
    let path = normalize_path(event.uri().path());

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Routing request"
    );

    match (method, path.as_str()) {
        // Health check endpoint (no authentication required)
        (&Method::GET, "/health") => handle_health(request_id),

        // The single parameterized device-property update operation
        (&Method::POST, "/update-device-properties") => {
            handle_update_properties(event, request_id, config, clock, limiter).await
        }

        // Unknown route - return 404
        _ => {
            warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "Unknown route"
            );
            handle_not_found(request_id, method, &path)
        }
    }
}

/// Normalize a path by removing trailing slashes
///
/// The root path "/" is preserved as-is.
fn normalize_path(path: &str) -> String {
    if path == "/" {
        return path.to_string();
    }
    path.trim_end_matches('/').to_string()
}

/// Handle health check requests
fn handle_health(request_id: &str) -> Result<Response<Body>, ApiError> {
    let body = serde_json::json!({
        "status": "healthy",
        "service": "fleetbridge-api",
        "request_id": request_id
    });

    Response::builder()
        .status(200)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// Handle unknown routes
fn handle_not_found(
    request_id: &str,
    method: &Method,
    path: &str,
) -> Result<Response<Body>, ApiError> {
    let body = serde_json::json!({
        "error": "NOT_FOUND",
        "message": format!("Route {} {} not found", method, path),
        "request_id": request_id
    });

    Response::builder()
        .status(404)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
