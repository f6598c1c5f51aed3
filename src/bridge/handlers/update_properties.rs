use std::collections::BTreeMap;

use lambda_http::{Body, Request, Response};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{resolve_credentials, EnvSecretStore};
use crate::config::Config;
use crate::error::ApiError;
use crate::rate_limit::{RateDecision, RateLimiter};
use crate::telematics::TelematicsClient;
use fleetbridge_backend::domain::PropertyVal;
use fleetbridge_backend::update::update_device_properties;
use fleetbridge_backend::validators::validate_device_identifier;
use fleetbridge_backend::Clock;

/// Request payload for POST /update-device-properties
///
/// Credentials come either as an `apiKey` naming a secret-store triple or
/// as a direct `database`/`username`/`password` triple.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Device id, serial number, or name
    #[serde(default)]
    pub device_id: Option<String>,
    /// Logical property key -> new value
    #[serde(default)]
    pub properties: Option<BTreeMap<String, PropertyVal>>,
}

/// Response payload for POST /update-device-properties
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub success: bool,
    pub message: String,
    pub device_id: String,
    pub database: String,
    pub attempts_used: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_keys: Vec<String>,
}

/// Handle POST /update-device-properties requests
///
/// Checks the caller's rate limit, resolves credentials, runs the
/// reconciliation-and-write sequence against the remote API and reports the
/// ladder outcome. A successful ladder returns 200; an exhausted ladder
/// returns 502 with the same response shape so callers always get
/// `success`/`attemptsUsed`/`error`.
pub async fn handle_update_properties(
    event: Request,
    request_id: &str,
    config: &Config,
    clock: &dyn Clock,
    limiter: &RateLimiter,
) -> Result<Response<Body>, ApiError> {
    // Rate limit by forwarded client IP, before any parsing
    let caller = client_ip(&event);
    if let RateDecision::Limited {
        retry_after_seconds,
    } = limiter.check(&caller, clock)
    {
        warn!(request_id = %request_id, caller = %caller, "request rate limited");
        return Err(ApiError::RateLimited {
            retry_after_seconds,
        });
    }

    // Parse request body
    let body_bytes = match event.body() {
        Body::Text(text) => text.as_bytes(),
        Body::Binary(bytes) => bytes.as_slice(),
        Body::Empty => {
            return Err(crate::error::ValidationError::InvalidBody(
                "Request body is empty".to_string(),
            )
            .into());
        }
    };

    let request: UpdateRequest = serde_json::from_slice(body_bytes).map_err(|e| {
        crate::error::ValidationError::InvalidBody(format!("Failed to parse JSON: {}", e))
    })?;

    let device_id = request
        .device_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            crate::error::ValidationError::MissingField("deviceId".to_string())
        })?;

    validate_device_identifier(device_id).map_err(|e| {
        crate::error::ValidationError::InvalidFormat(format!("deviceId: {}", e.message))
    })?;

    let properties = request
        .properties
        .as_ref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| {
            crate::error::ValidationError::MissingField("properties".to_string())
        })?;

    // Resolve remote credentials (secret store or direct)
    let secrets = EnvSecretStore::new();
    let (credentials, mode) = resolve_credentials(
        request.api_key.as_deref(),
        request.database.as_deref(),
        request.username.as_deref(),
        request.password.as_deref(),
        config,
        &secrets,
    )?;

    info!(
        request_id = %request_id,
        device_id = %device_id,
        database = %credentials.database,
        credential_mode = ?mode,
        property_count = properties.len(),
        "Processing device property update"
    );

    let store = TelematicsClient::new(config, credentials.clone())?;

    let started_ms = clock.now_epoch_millis();
    let result = update_device_properties(&store, device_id, properties).await;
    let execution_time_ms = clock.now_epoch_millis() - started_ms;

    // Usage record for billing and monitoring
    info!(
        request_id = %request_id,
        database = %credentials.database,
        operation = "update-device-properties",
        success = result.as_ref().map(|o| o.success).unwrap_or(false),
        execution_time_ms,
        timestamp = %clock.now_rfc3339(),
        "usage record"
    );

    let outcome = result?;

    let status = if outcome.success { 200 } else { 502 };
    let response = UpdateResponse {
        success: outcome.success,
        message: outcome.message,
        device_id: outcome.device_id,
        database: credentials.database,
        attempts_used: outcome.attempts_used,
        error: outcome.error,
        skipped_keys: outcome.skipped_keys,
    };

    let response_body = serde_json::to_string(&response)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize response: {}", e)))?;

    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(response_body))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// Caller identity for rate limiting: first hop of X-Forwarded-For
fn client_ip(event: &Request) -> String {
    event
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
