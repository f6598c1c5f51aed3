use serde::{Deserialize, Deserializer, Serialize};

/// A custom-property value as the remote API stores it.
///
/// The remote schema is inconsistently enforced: some deployments persist
/// native JSON types, others persist everything as strings. This union keeps
/// the native type explicit so each write encoding can serialize it its own
/// way instead of guessing from loose JSON values.
///
/// Variant order matters for untagged deserialization: `Bool` before the
/// numeric variants, `Int` before `Float` so whole numbers stay integral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyVal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Default for PropertyVal {
    fn default() -> Self {
        PropertyVal::Null
    }
}

impl PropertyVal {
    /// Canonical form used by the typed write encoding: an empty string is
    /// stored as null (the remote stores blanks as absent values).
    pub fn canonicalize(self) -> PropertyVal {
        match self {
            PropertyVal::Text(ref s) if s.is_empty() => PropertyVal::Null,
            other => other,
        }
    }

    /// Stringified form used by the string-coerced write encoding.
    ///
    /// Booleans become `"true"`/`"false"`, numbers their decimal form,
    /// null the empty string.
    pub fn coerce_string(&self) -> String {
        match self {
            PropertyVal::Bool(true) => "true".to_string(),
            PropertyVal::Bool(false) => "false".to_string(),
            PropertyVal::Int(n) => n.to_string(),
            // A whole-valued float keeps its fractional point ("2.0", not
            // "2"), matching how the remote has seen these values stored.
            PropertyVal::Float(n) if n.fract() == 0.0 && n.is_finite() => {
                format!("{:.1}", n)
            }
            PropertyVal::Float(n) => n.to_string(),
            PropertyVal::Text(s) => s.clone(),
            PropertyVal::Null => String::new(),
        }
    }

}

/// Reference to the owning property set of a definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySetRef {
    pub id: String,
}

/// Reference from a property value back to its definition
///
/// The property-set reference is optional on read (legacy records omit it)
/// but always populated on entries the reconciler emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_set: Option<PropertySetRef>,
}

/// A property definition from the remote catalog
///
/// Immutable from this service's point of view; definitions are provisioned
/// out of band and fetched fresh each run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_set: Option<PropertySetRef>,
}

/// A per-device property record exactly as fetched from the remote API.
///
/// Older records store their payload under a `data` field instead of
/// `value`; [`RawPropertyValue::normalize`] migrates that encoding before
/// anything compares or merges the record. `value` is deserialized through
/// a helper so an explicit JSON `null` (present, null) is distinguishable
/// from an absent field (the migration rule depends on the difference).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPropertyValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub property: PropertyRef,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<PropertyVal>,
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<PropertyVal>,
}

/// Maps an explicit JSON `null` to `Some(PropertyVal::Null)`; absent fields
/// fall through to `#[serde(default)]` and stay `None`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<PropertyVal>, D::Error>
where
    D: Deserializer<'de>,
{
    PropertyVal::deserialize(deserializer).map(Some)
}

impl RawPropertyValue {
    /// Migrate the legacy `data` encoding and produce the normalized record.
    ///
    /// Rules:
    /// - `value` present: it wins, any `data` is discarded
    /// - `value` absent, `data` present: `data` becomes the value
    /// - both absent: the value is null
    pub fn normalize(self) -> PropertyValue {
        let value = match (self.value, self.data) {
            (Some(v), _) => v,
            (None, Some(d)) => d,
            (None, None) => PropertyVal::Null,
        };
        PropertyValue {
            id: self.id,
            version: self.version,
            property: self.property,
            value,
        }
    }
}

/// A normalized per-device property record.
///
/// This is the only property-value shape the reconciler and ladder operate
/// on; the legacy `data` field cannot be represented here, so normalization
/// is enforced by construction. `id` and `version` are opaque identity
/// fields preserved verbatim from the remote record when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub property: PropertyRef,
    pub value: PropertyVal,
}

impl From<RawPropertyValue> for PropertyValue {
    fn from(raw: RawPropertyValue) -> Self {
        raw.normalize()
    }
}

/// A device as fetched from the remote API.
///
/// Only the fields this service reads are modeled; everything else the
/// remote returns is passthrough state that partial updates must not echo
/// back, so it is dropped on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub custom_properties: Vec<RawPropertyValue>,
}

impl Device {
    /// The device's property collection with the legacy-field migration
    /// applied to every entry.
    pub fn normalized_properties(&self) -> Vec<PropertyValue> {
        self.custom_properties
            .iter()
            .cloned()
            .map(RawPropertyValue::normalize)
            .collect()
    }
}

/// Write payload for the remote device-update call.
///
/// Minimal payloads carry only `id` plus the changed properties; the
/// full-payload fallback additionally carries `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceWrite {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub custom_properties: Vec<PropertyValue>,
}
