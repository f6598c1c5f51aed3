use tracing::{debug, info, warn};

use crate::domain::{Device, DeviceWrite, PropertyValue};
use crate::store::TelematicsStore;

/// Result of driving the write-attempt ladder for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyOutcome {
    pub success: bool,
    /// Write attempts issued, between 1 and 3.
    pub attempts_used: u32,
    /// The last write rejection, present only when `success` is false.
    pub last_error: Option<String>,
    /// Post-write snapshot of the persisted collection; `None` when the
    /// verification read itself failed.
    pub verification: Option<Vec<PropertyValue>>,
}

/// Apply reconciled property values to a device, falling through a fixed
/// sequence of payload encodings until one is accepted.
///
/// The remote API's acceptance criteria for a payload shape are not
/// contractually specified and have been observed to vary per deployment,
/// so each rejection advances to the next shape rather than failing:
///
/// 1. minimal payload, string-coerced values
/// 2. minimal payload, native-typed values
/// 3. full payload (`id` + `name`), string-coerced values
///
/// Only a rejection of the final shape fails the operation. At most three
/// writes are issued and no shape is retried. After the ladder terminates a
/// verification read captures the persisted collection for diagnosis; its
/// outcome never alters `success`.
pub async fn apply(
    store: &dyn TelematicsStore,
    device: &Device,
    typed: &[PropertyValue],
    coerced: &[PropertyValue],
) -> ApplyOutcome {
    let attempts = [
        (
            "minimal-string",
            DeviceWrite {
                id: device.id.clone(),
                name: None,
                custom_properties: coerced.to_vec(),
            },
        ),
        (
            "minimal-typed",
            DeviceWrite {
                id: device.id.clone(),
                name: None,
                custom_properties: typed.to_vec(),
            },
        ),
        (
            "full-string",
            DeviceWrite {
                id: device.id.clone(),
                name: Some(device.name.clone()),
                custom_properties: coerced.to_vec(),
            },
        ),
    ];

    let mut attempts_used = 0u32;
    let mut last_error = None;
    let mut success = false;

    for (shape, payload) in attempts {
        attempts_used += 1;

        // Structured request logging at the collaborator boundary.
        debug!(
            device_id = %device.id,
            shape,
            payload = %serde_json::to_string(&payload).unwrap_or_default(),
            "issuing device write"
        );

        match store.write_device(&payload).await {
            Ok(()) => {
                info!(
                    device_id = %device.id,
                    shape,
                    attempt = attempts_used,
                    "device write accepted"
                );
                last_error = None;
                success = true;
                break;
            }
            Err(e) => {
                warn!(
                    device_id = %device.id,
                    shape,
                    attempt = attempts_used,
                    error = %e,
                    "device write rejected, advancing ladder"
                );
                last_error = Some(e.to_string());
            }
        }
    }

    let verification = match store.fetch_device_verify(&device.id).await {
        Ok(persisted) => {
            let values = persisted.normalized_properties();
            info!(
                device_id = %device.id,
                count = values.len(),
                "post-write verification snapshot"
            );
            Some(values)
        }
        Err(e) => {
            warn!(device_id = %device.id, error = %e, "post-write verification read failed");
            None
        }
    };

    ApplyOutcome {
        success,
        attempts_used,
        last_error,
        verification,
    }
}
