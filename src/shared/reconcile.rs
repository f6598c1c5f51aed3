use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::catalog::ResolvedProperty;
use crate::domain::{PropertyRef, PropertySetRef, PropertyVal, PropertyValue};
use crate::keys::LogicalKey;

/// Output of [`reconcile`]: the changed entries in both write encodings.
///
/// `typed` and `coerced` are parallel replacement lists covering only the
/// updated keys; merging them with the untouched existing entries is the
/// ladder caller's job (see [`merge_collections`]). `skipped` lists keys
/// that had no resolved definition and were dropped from both encodings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconciledValues {
    pub typed: Vec<PropertyValue>,
    pub coerced: Vec<PropertyValue>,
    pub skipped: Vec<LogicalKey>,
}

/// Build replacement property-value entries for a set of logical updates.
///
/// `existing` must already be normalized (legacy `data` migrated); the type
/// system enforces this, since [`PropertyValue`] cannot carry the legacy
/// field. For each update the prior entry's opaque `id`/`version` fields are
/// reused so the remote recognizes the write as a replacement rather than a
/// duplicate insert. Updates are processed in key order, so reconciling the
/// same inputs twice yields byte-identical output.
///
/// An update whose key has no resolved definition is skipped with a warning
/// and recorded in `skipped`; it never fails the reconciliation.
pub fn reconcile(
    existing: &[PropertyValue],
    updates: &BTreeMap<LogicalKey, PropertyVal>,
    resolved: &BTreeMap<LogicalKey, ResolvedProperty>,
) -> ReconciledValues {
    // Prior entries by property id, for identity/version reuse.
    let by_property: HashMap<&str, &PropertyValue> = existing
        .iter()
        .map(|pv| (pv.property.id.as_str(), pv))
        .collect();

    let mut out = ReconciledValues::default();

    for (&key, incoming) in updates {
        let Some(target) = resolved.get(&key) else {
            warn!(key = %key, "no resolved definition for update, skipping");
            out.skipped.push(key);
            continue;
        };

        let canonical = incoming.clone().canonicalize();
        let prior = by_property.get(target.id.as_str());

        debug!(
            key = %key,
            property_id = %target.id,
            value = %canonical.coerce_string(),
            replaces_existing = prior.is_some(),
            "reconciled property update"
        );

        let reference = PropertyRef {
            id: target.id.clone(),
            property_set: Some(PropertySetRef {
                id: target.property_set_id.clone(),
            }),
        };

        out.typed.push(PropertyValue {
            id: prior.and_then(|pv| pv.id.clone()),
            version: prior.and_then(|pv| pv.version.clone()),
            property: reference.clone(),
            value: canonical.clone(),
        });

        out.coerced.push(PropertyValue {
            id: prior.and_then(|pv| pv.id.clone()),
            version: prior.and_then(|pv| pv.version.clone()),
            property: reference,
            value: PropertyVal::Text(canonical.coerce_string()),
        });
    }

    out
}

/// Merge replacement entries into an existing property collection.
///
/// Existing entries keep their order; an entry whose property id appears in
/// `replacements` is swapped for the replacement, and replacements for ids
/// the collection never held are appended. The result carries at most one
/// entry per property id even when the input collection held duplicates
/// (stale data): the first occurrence wins, later ones are dropped.
pub fn merge_collections(
    existing: &[PropertyValue],
    replacements: &[PropertyValue],
) -> Vec<PropertyValue> {
    let replacement_by_id: HashMap<&str, &PropertyValue> = replacements
        .iter()
        .map(|pv| (pv.property.id.as_str(), pv))
        .collect();

    let mut merged: Vec<PropertyValue> = Vec::with_capacity(existing.len() + replacements.len());
    let mut seen: Vec<&str> = Vec::with_capacity(existing.len() + replacements.len());

    for entry in existing {
        let property_id = entry.property.id.as_str();
        if seen.contains(&property_id) {
            warn!(property_id, "duplicate property entry dropped during merge");
            continue;
        }
        seen.push(property_id);
        match replacement_by_id.get(property_id) {
            Some(replacement) => merged.push((*replacement).clone()),
            None => merged.push(entry.clone()),
        }
    }

    for replacement in replacements {
        let property_id = replacement.property.id.as_str();
        if !seen.contains(&property_id) {
            seen.push(property_id);
            merged.push(replacement.clone());
        }
    }

    merged
}
