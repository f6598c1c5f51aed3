use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Device, DeviceWrite, PropertyDefinition};

/// Errors from the remote telematics store
///
/// Write-rejection semantics are deliberately opaque: the ladder treats any
/// `write_device` error as "try the next payload shape", so no finer
/// taxonomy is needed there. Lookup and auth failures are fatal to the
/// operation and keep the remote message for the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("device not found by id/serial/name: {0}")]
    NotFound(String),

    #[error("remote rejected write: {0}")]
    Rejected(String),

    #[error("remote authentication failed: {0}")]
    Auth(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed remote response: {0}")]
    Decode(String),
}

/// Abstract operations against the remote telematics object store.
///
/// The service binary supplies the JSON-RPC implementation; tests supply an
/// in-memory fake. All four calls are independent await points; the core
/// never holds a session resource across them.
#[async_trait]
pub trait TelematicsStore: Send + Sync {
    /// Fetch the full property-definition catalog for the account.
    async fn fetch_catalog(&self) -> Result<Vec<PropertyDefinition>, StoreError>;

    /// Look up a device by identifier.
    ///
    /// Resolution order when the identifier is ambiguous: exact id, then
    /// serial number, then name; first non-empty match wins. Not-found is a
    /// terminal error.
    async fn fetch_device(&self, identifier: &str) -> Result<Device, StoreError>;

    /// Apply a partial or full device payload.
    async fn write_device(&self, payload: &DeviceWrite) -> Result<(), StoreError>;

    /// Re-read a device after a write, for diagnostics only.
    async fn fetch_device_verify(&self, id: &str) -> Result<Device, StoreError>;
}
