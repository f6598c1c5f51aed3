//! Test utilities: an in-memory telematics store and proptest generators
//!
//! The fake store mirrors the remote API's observable behavior closely
//! enough for ladder and update-flow tests: identifier resolution order,
//! merge-by-property-id write semantics, and scriptable write rejections.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{
    Device, DeviceWrite, PropertyDefinition, PropertySetRef, PropertyValue, RawPropertyValue,
};
use crate::keys::LogicalKey;
use crate::store::{StoreError, TelematicsStore};

/// In-memory [`TelematicsStore`] for tests.
pub struct FakeStore {
    device: Mutex<Device>,
    definitions: Vec<PropertyDefinition>,
    writes: Mutex<Vec<DeviceWrite>>,
    write_count: AtomicUsize,
    reject_first: usize,
    fail_verification: bool,
}

impl FakeStore {
    pub fn with_device(device: Device) -> Self {
        Self {
            device: Mutex::new(device),
            definitions: Vec::new(),
            writes: Mutex::new(Vec::new()),
            write_count: AtomicUsize::new(0),
            reject_first: 0,
            fail_verification: false,
        }
    }

    /// Provision a definition for every logical key, owned by set `ps1`.
    pub fn with_standard_catalog(mut self) -> Self {
        self.definitions = standard_catalog();
        self
    }

    /// Reject the first `n` writes, accept from write `n + 1` on.
    pub fn rejecting_first(mut self, n: usize) -> Self {
        self.reject_first = n;
        self
    }

    /// Make every verification read fail.
    pub fn failing_verification(mut self) -> Self {
        self.fail_verification = true;
        self
    }

    /// The catalog id [`FakeStore::with_standard_catalog`] assigns to a key.
    pub fn standard_property_id(key: LogicalKey) -> String {
        format!("prop-{}", key.wire_name())
    }

    /// Every write payload issued so far, in order.
    pub fn recorded_writes(&self) -> Vec<DeviceWrite> {
        self.writes.lock().unwrap().clone()
    }

    /// The device's current property collection, normalized.
    pub fn device_properties(&self) -> Vec<PropertyValue> {
        self.device.lock().unwrap().normalized_properties()
    }
}

/// One definition per logical key, owned by property set `ps1`.
pub fn standard_catalog() -> Vec<PropertyDefinition> {
    LogicalKey::ALL
        .iter()
        .map(|key| PropertyDefinition {
            id: FakeStore::standard_property_id(*key),
            name: key.definition_name().to_string(),
            property_set: Some(PropertySetRef {
                id: "ps1".to_string(),
            }),
        })
        .collect()
}

#[async_trait]
impl TelematicsStore for FakeStore {
    async fn fetch_catalog(&self) -> Result<Vec<PropertyDefinition>, StoreError> {
        Ok(self.definitions.clone())
    }

    async fn fetch_device(&self, identifier: &str) -> Result<Device, StoreError> {
        let device = self.device.lock().unwrap();
        let matches = device.id == identifier
            || device.serial_number.as_deref() == Some(identifier)
            || device.name == identifier;
        if matches {
            Ok(device.clone())
        } else {
            Err(StoreError::NotFound(identifier.to_string()))
        }
    }

    async fn write_device(&self, payload: &DeviceWrite) -> Result<(), StoreError> {
        let attempt = self.write_count.fetch_add(1, Ordering::SeqCst);
        self.writes.lock().unwrap().push(payload.clone());

        if attempt < self.reject_first {
            return Err(StoreError::Rejected(format!(
                "JSONRPCError: invalid customProperties payload (attempt {})",
                attempt + 1
            )));
        }

        // The remote merges by property id: replace matching entries,
        // append the rest.
        let mut device = self.device.lock().unwrap();
        for entry in &payload.custom_properties {
            let stored = RawPropertyValue {
                id: entry.id.clone(),
                version: entry.version.clone(),
                property: entry.property.clone(),
                value: Some(entry.value.clone()),
                data: None,
            };
            match device
                .custom_properties
                .iter_mut()
                .find(|existing| existing.property.id == entry.property.id)
            {
                Some(existing) => *existing = stored,
                None => device.custom_properties.push(stored),
            }
        }
        Ok(())
    }

    async fn fetch_device_verify(&self, id: &str) -> Result<Device, StoreError> {
        if self.fail_verification {
            return Err(StoreError::Transport("verification read refused".to_string()));
        }
        let device = self.device.lock().unwrap();
        if device.id == id {
            Ok(device.clone())
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }
}

pub mod generators {
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    use crate::domain::{PropertyRef, PropertySetRef, PropertyVal, PropertyValue, RawPropertyValue};
    use crate::keys::LogicalKey;

    /// Generate an opaque remote property id
    pub fn property_id() -> impl Strategy<Value = String> {
        prop::string::string_regex("p[a-zA-Z0-9]{2,10}").expect("valid regex for property_id")
    }

    /// Generate any property value, including null
    pub fn property_val() -> impl Strategy<Value = PropertyVal> {
        prop_oneof![
            Just(PropertyVal::Null),
            any::<bool>().prop_map(PropertyVal::Bool),
            (-100_000i64..100_000).prop_map(PropertyVal::Int),
            (-1_000_000i64..1_000_000)
                .prop_map(|n| PropertyVal::Float(n as f64 / 100.0)),
            prop::string::string_regex("[ -~]{0,24}")
                .expect("valid regex for text value")
                .prop_map(PropertyVal::Text),
        ]
    }

    /// Generate a raw remote record, covering the legacy `data` encodings:
    /// value only, legacy data only, both fields, or neither.
    pub fn raw_property_value(property_id: String) -> impl Strategy<Value = RawPropertyValue> {
        (
            prop::option::of(prop::string::string_regex("pv[0-9]{1,6}").expect("valid regex")),
            property_val(),
            property_val(),
            0u8..4,
        )
            .prop_map(move |(id, value, legacy, encoding)| {
                let (value, data) = match encoding {
                    0 => (Some(value), None),
                    1 => (None, Some(legacy)),
                    2 => (Some(value), Some(legacy)),
                    _ => (None, None),
                };
                RawPropertyValue {
                    id,
                    version: None,
                    property: PropertyRef {
                        id: property_id.clone(),
                        property_set: Some(PropertySetRef {
                            id: "ps1".to_string(),
                        }),
                    },
                    value,
                    data,
                }
            })
    }

    /// Generate an existing collection with distinct property ids
    pub fn existing_collection() -> impl Strategy<Value = Vec<PropertyValue>> {
        prop::collection::btree_map(property_id(), property_val(), 0..8).prop_map(|entries| {
            entries
                .into_iter()
                .map(|(property_id, value)| PropertyValue {
                    id: None,
                    version: None,
                    property: PropertyRef {
                        id: property_id,
                        property_set: None,
                    },
                    value,
                })
                .collect()
        })
    }

    /// Generate an update set over a random subset of the logical keys
    pub fn update_set() -> impl Strategy<Value = BTreeMap<LogicalKey, PropertyVal>> {
        prop::collection::vec((0usize..LogicalKey::ALL.len(), property_val()), 0..8).prop_map(
            |pairs| {
                pairs
                    .into_iter()
                    .map(|(index, value)| (LogicalKey::ALL[index], value))
                    .collect()
            },
        )
    }
}
