use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::domain::PropertyDefinition;
use crate::keys::LogicalKey;

/// A logical key resolved against the remote catalog.
///
/// Both identifiers are guaranteed to come from the source catalog; a
/// definition that lacks an owning property set is treated as unresolvable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProperty {
    pub id: String,
    pub property_set_id: String,
    pub name: &'static str,
}

/// Resolve every logical key against the fetched definition catalog.
///
/// Matching is by exact definition name, first match wins if the catalog
/// carries duplicates. Keys with no usable definition are omitted from the
/// result; callers warn and skip updates targeting them rather than
/// failing the whole operation.
pub fn resolve(definitions: &[PropertyDefinition]) -> BTreeMap<LogicalKey, ResolvedProperty> {
    let mut resolved = BTreeMap::new();

    for key in LogicalKey::ALL {
        let name = key.definition_name();
        let Some(definition) = definitions.iter().find(|d| d.name == name) else {
            warn!(key = %key, definition_name = name, "property definition not found");
            continue;
        };

        let Some(set) = definition.property_set.as_ref() else {
            warn!(
                key = %key,
                definition_id = %definition.id,
                "property definition has no owning property set"
            );
            continue;
        };

        debug!(
            key = %key,
            definition_id = %definition.id,
            property_set_id = %set.id,
            "resolved property definition"
        );

        resolved.insert(
            key,
            ResolvedProperty {
                id: definition.id.clone(),
                property_set_id: set.id.clone(),
                name,
            },
        );
    }

    debug!(count = resolved.len(), "resolved property definitions");
    resolved
}
