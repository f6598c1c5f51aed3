// FleetBridge API binary entry point

mod auth;
mod config;
mod error;
mod rate_limit;
mod router;
mod telematics;

// Handlers module
#[path = "bridge/handlers/mod.rs"]
mod handlers;

use std::sync::OnceLock;

use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use tracing::{error, info};

use config::Config;
use fleetbridge_backend::SystemClock;
use rate_limit::RateLimiter;
use router::route_request;

/// Per-instance rate limiter: shared across invocations within one runtime,
/// like the remote-credential caches it protects.
fn limiter() -> &'static RateLimiter {
    static LIMITER: OnceLock<RateLimiter> = OnceLock::new();
    LIMITER.get_or_init(RateLimiter::with_default_limits)
}

async fn function_handler(event: Request) -> Result<Response<Body>, Error> {
    // Request ID from the Lambda context, with a local fallback
    let mut request_id = event.lambda_context().request_id.clone();
    if request_id.is_empty() {
        request_id = uuid::Uuid::new_v4().to_string();
    }

    info!(
        request_id = %request_id,
        method = %event.method(),
        path = %event.uri().path(),
        "FleetBridge Lambda invoked"
    );

    // For health check, we don't need config
    if event.method() == lambda_http::http::Method::GET
        && (event.uri().path() == "/health" || event.uri().path() == "/health/")
    {
        return match router::route_request_health(&request_id) {
            Ok(response) => Ok(response),
            Err(api_error) => {
                error!(
                    request_id = %request_id,
                    error = %api_error,
                    "Health check failed"
                );
                Ok(api_error.to_http_response(&request_id))
            }
        };
    }

    // Initialize configuration for other endpoints
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(
                request_id = %request_id,
                error = %e,
                "Failed to load configuration"
            );
            return Ok(
                error::ApiError::Internal(format!("Configuration error: {}", e))
                    .to_http_response(&request_id),
            );
        }
    };

    let clock = SystemClock::new();

    // Route the request and handle any errors
    match route_request(event, &request_id, &config, &clock, limiter()).await {
        Ok(response) => {
            info!(
                request_id = %request_id,
                status = %response.status(),
                "Request completed"
            );
            Ok(response)
        }
        Err(api_error) => {
            error!(
                request_id = %request_id,
                error = %api_error,
                "Request failed"
            );
            Ok(api_error.to_http_response(&request_id))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    info!("FleetBridge Lambda starting");

    run(service_fn(function_handler)).await
}
