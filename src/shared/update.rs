use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::catalog::resolve;
use crate::domain::PropertyVal;
use crate::keys::LogicalKey;
use crate::ladder;
use crate::reconcile::{merge_collections, reconcile};
use crate::store::{StoreError, TelematicsStore};

/// Result of one update-device-properties operation.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub success: bool,
    pub attempts_used: u32,
    pub message: String,
    /// Last write rejection when the ladder was exhausted.
    pub error: Option<String>,
    pub device_id: String,
    pub device_name: String,
    /// Request keys dropped because they were unknown or unprovisioned.
    pub skipped_keys: Vec<String>,
}

/// Run one reconciliation-and-write sequence for one device.
///
/// Fetches the device (id, then serial number, then name) and the property
/// catalog, resolves the logical keys, reconciles the update set into both
/// write encodings and drives the write-attempt ladder. Unknown request keys
/// and keys with no provisioned definition are skipped with a warning; a
/// device lookup failure or a remote transport/auth failure is fatal and
/// propagated to the caller.
pub async fn update_device_properties(
    store: &dyn TelematicsStore,
    identifier: &str,
    updates: &BTreeMap<String, PropertyVal>,
) -> Result<UpdateOutcome, StoreError> {
    let device = store.fetch_device(identifier).await?;
    info!(device_id = %device.id, device_name = %device.name, "device resolved");

    let definitions = store.fetch_catalog().await?;
    let resolved = resolve(&definitions);

    // Partition request keys into the fixed logical set and unknowns.
    let mut known: BTreeMap<LogicalKey, PropertyVal> = BTreeMap::new();
    let mut skipped_keys: Vec<String> = Vec::new();
    for (name, value) in updates {
        match name.parse::<LogicalKey>() {
            Ok(key) => {
                known.insert(key, value.clone());
            }
            Err(_) => {
                warn!(key = %name, "unknown logical property key, skipping");
                skipped_keys.push(name.clone());
            }
        }
    }

    let existing = device.normalized_properties();
    let reconciled = reconcile(&existing, &known, &resolved);
    skipped_keys.extend(reconciled.skipped.iter().map(|k| k.wire_name().to_string()));

    if reconciled.typed.is_empty() {
        // Nothing survived resolution; an empty minimal payload could be
        // read by the remote as "clear the collection", so no write happens.
        warn!(device_id = %device.id, "no updates left after resolution, skipping write");
        return Ok(UpdateOutcome {
            success: true,
            attempts_used: 0,
            message: format!("No applicable property updates for device {}", device.name),
            error: None,
            device_id: device.id,
            device_name: device.name,
            skipped_keys,
        });
    }

    let outcome = ladder::apply(store, &device, &reconciled.typed, &reconciled.coerced).await;

    // Diagnostic comparison of the persisted collection against the merge
    // of untouched entries and replacements.
    if let Some(persisted) = &outcome.verification {
        let expected = merge_collections(&existing, &reconciled.typed);
        let missing = expected
            .iter()
            .filter(|e| !persisted.iter().any(|p| p.property.id == e.property.id))
            .count();
        if missing > 0 {
            warn!(
                device_id = %device.id,
                missing,
                "persisted collection is missing expected property entries"
            );
        }
    }

    let message = if outcome.success {
        format!("Device {} updated successfully", device.name)
    } else {
        format!("Device {} update failed", device.name)
    };

    Ok(UpdateOutcome {
        success: outcome.success,
        attempts_used: outcome.attempts_used,
        message,
        error: outcome.last_error,
        device_id: device.id,
        device_name: device.name,
        skipped_keys,
    })
}
