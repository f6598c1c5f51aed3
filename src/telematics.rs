use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::Credentials;
use crate::config::Config;
use fleetbridge_backend::domain::{Device, DeviceWrite, PropertyDefinition};
use fleetbridge_backend::store::{StoreError, TelematicsStore};

/// JSON-RPC client for the remote telematics API.
///
/// One client is built per request with that tenant's credentials; the
/// session obtained from `Authenticate` is cached for the lifetime of the
/// client, which spans a single update operation.
pub struct TelematicsClient {
    http: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
    session: Mutex<Option<Value>>,
}

/// Remote response envelope: exactly one of `result` / `error` is meaningful.
#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    message: Option<String>,
}

impl TelematicsClient {
    pub fn new(config: &Config, credentials: Credentials) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let endpoint = format!(
            "{}/apiv1",
            config.telematics_base_url.trim_end_matches('/')
        );

        Ok(Self {
            http,
            endpoint,
            credentials,
            session: Mutex::new(None),
        })
    }

    /// Issue one JSON-RPC call and unwrap the response envelope.
    async fn rpc(&self, method: &str, params: Value) -> Result<Value, StoreError> {
        let body = json!({ "method": method, "params": params });

        // Authenticate traffic carries the password and session; never log it.
        let loggable = method != "Authenticate";
        if loggable {
            debug!(
                method,
                payload = %serde_json::to_string(&body).unwrap_or_default(),
                "remote API request"
            );
        }

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Transport(format!(
                "remote API returned HTTP {}",
                status
            )));
        }

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(StoreError::Rejected(
                error
                    .message
                    .unwrap_or_else(|| "unspecified remote error".to_string()),
            ));
        }

        if loggable {
            debug!(
                method,
                response = %serde_json::to_string(&envelope.result).unwrap_or_default(),
                "remote API response"
            );
        }

        Ok(envelope.result)
    }

    /// Authenticate once and cache the returned session credentials.
    async fn session(&self) -> Result<Value, StoreError> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            return Ok(session.clone());
        }

        let result = self
            .rpc(
                "Authenticate",
                json!({
                    "userName": self.credentials.username,
                    "password": self.credentials.password,
                    "database": self.credentials.database,
                }),
            )
            .await
            .map_err(|e| match e {
                StoreError::Rejected(msg) => StoreError::Auth(msg),
                other => other,
            })?;

        let session = result
            .get("credentials")
            .cloned()
            .ok_or_else(|| StoreError::Decode("Authenticate result has no credentials".to_string()))?;

        *guard = Some(session.clone());
        Ok(session)
    }

    /// Issue an authenticated call with the session attached to params.
    async fn call(&self, method: &str, mut params: Value) -> Result<Value, StoreError> {
        let session = self.session().await?;
        if let Some(map) = params.as_object_mut() {
            map.insert("credentials".to_string(), session);
        }
        self.rpc(method, params).await
    }

    async fn search_devices(&self, field: &str, value: &str) -> Result<Vec<Device>, StoreError> {
        let result = self
            .call(
                "Get",
                json!({ "typeName": "Device", "search": { field: value } }),
            )
            .await?;

        if result.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(result).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TelematicsStore for TelematicsClient {
    async fn fetch_catalog(&self) -> Result<Vec<PropertyDefinition>, StoreError> {
        let result = self.call("Get", json!({ "typeName": "Property" })).await?;
        if result.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(result).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn fetch_device(&self, identifier: &str) -> Result<Device, StoreError> {
        // Callers may supply the internal id, the serial number, or the
        // display name; try each in turn.
        for field in ["id", "serialNumber", "name"] {
            let mut devices = self.search_devices(field, identifier).await?;
            if !devices.is_empty() {
                debug!(field, identifier, "device resolved");
                return Ok(devices.remove(0));
            }
        }
        Err(StoreError::NotFound(identifier.to_string()))
    }

    async fn write_device(&self, payload: &DeviceWrite) -> Result<(), StoreError> {
        let entity =
            serde_json::to_value(payload).map_err(|e| StoreError::Decode(e.to_string()))?;
        self.call("Set", json!({ "typeName": "Device", "entity": entity }))
            .await?;
        Ok(())
    }

    async fn fetch_device_verify(&self, id: &str) -> Result<Device, StoreError> {
        let mut devices = self.search_devices("id", id).await?;
        if devices.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(devices.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn client() -> TelematicsClient {
        let config = Config {
            telematics_base_url: "https://fleet.example.com/".to_string(),
            use_secret_store: false,
            http_timeout: Duration::from_secs(5),
        };
        TelematicsClient::new(
            &config,
            Credentials {
                database: "acme".to_string(),
                username: "svc@acme.com".to_string(),
                password: "hunter2".to_string(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = client();
        assert_eq!(client.endpoint, "https://fleet.example.com/apiv1");
    }

    #[test]
    fn test_envelope_rejection_carries_message() {
        let envelope: RpcEnvelope = serde_json::from_str(
            r#"{"error":{"message":"JSONRPCError: invalid customProperties"}}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.error.unwrap().message.as_deref(),
            Some("JSONRPCError: invalid customProperties")
        );
    }

    #[test]
    fn test_envelope_null_result_is_not_an_error() {
        let envelope: RpcEnvelope = serde_json::from_str(r#"{"result":null}"#).unwrap();
        assert!(envelope.error.is_none());
        assert!(envelope.result.is_null());
    }

    #[test]
    fn test_envelope_result_passthrough() {
        let envelope: RpcEnvelope =
            serde_json::from_str(r#"{"result":[{"id":"b1","name":"Loader 3"}]}"#).unwrap();
        let devices: Vec<Device> = serde_json::from_value(envelope.result).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].id, "b1");
    }
}
