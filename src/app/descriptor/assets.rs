//! Asset reference resolution
//!
//! Walks every target's costumes and sounds and produces the ordered,
//! deduplicated list of `(id, format)` keys the project needs.
//!
//! Two record schemas coexist in the wild: a combined `md5ext` field
//! (`"<id>.<format>"`) and separate `assetId` / `dataFormat` fields. Records
//! may carry either or both; both normalize to the same key.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::app::models::AssetReference;
use crate::constants::archive::DESCRIPTOR_ENTRY;

/// Record collections holding asset references within each target
const ASSET_COLLECTIONS: [&str; 2] = ["costumes", "sounds"];

/// Combined `"<id>.<format>"` field
const COMBINED_FIELD: &str = "md5ext";

/// Separate id field
const ID_FIELD: &str = "assetId";

/// Separate format field
const FORMAT_FIELD: &str = "dataFormat";

/// Extract the asset reference carried by one costume or sound record
///
/// The combined field wins when both schemas are present; a disagreement
/// between them is logged.
pub fn reference_from_record(record: &Value) -> Option<AssetReference> {
    let combined = record
        .get(COMBINED_FIELD)
        .and_then(Value::as_str)
        .and_then(AssetReference::from_combined);

    let separate = match (
        record.get(ID_FIELD).and_then(Value::as_str),
        record.get(FORMAT_FIELD).and_then(Value::as_str),
    ) {
        (Some(id), Some(format)) if !id.is_empty() && !format.is_empty() => {
            Some(AssetReference::new(id, format))
        }
        _ => None,
    };

    match (combined, separate) {
        (Some(combined), Some(separate)) => {
            if combined != separate {
                warn!(
                    "Asset record disagrees between {} ({}) and {}/{} ({}); using {}",
                    COMBINED_FIELD, combined, ID_FIELD, FORMAT_FIELD, separate, combined
                );
            }
            Some(combined)
        }
        (Some(reference), None) | (None, Some(reference)) => Some(reference),
        (None, None) => None,
    }
}

/// Order-preserving, deduplicated asset references of a descriptor
///
/// References are keyed by archive entry name, which is also what the
/// download URL is built from. When two distinct references render to the
/// same name the first one wins. A reference named like the descriptor
/// entry is dropped.
pub fn resolve_assets(targets: &[Value]) -> Vec<AssetReference> {
    let mut seen: HashMap<String, AssetReference> = HashMap::new();
    let mut references = Vec::new();

    for (index, target) in targets.iter().enumerate() {
        let target_name = target
            .get("name")
            .and_then(Value::as_str)
            .map_or_else(|| format!("#{}", index), str::to_string);

        for collection in ASSET_COLLECTIONS {
            let Some(records) = target.get(collection).and_then(Value::as_array) else {
                continue;
            };

            for record in records {
                match reference_from_record(record) {
                    Some(reference) => {
                        let name = reference.entry_name();
                        if name == DESCRIPTOR_ENTRY {
                            warn!(
                                "Skipping {} record named {} in target {}",
                                collection, DESCRIPTOR_ENTRY, target_name
                            );
                            continue;
                        }
                        match seen.get(&name) {
                            Some(existing) if *existing != reference => warn!(
                                "Asset {}/{} collides with {}/{} as {}; keeping the first",
                                reference.id, reference.format, existing.id, existing.format, name
                            ),
                            Some(_) => {}
                            None => {
                                seen.insert(name, reference.clone());
                                references.push(reference);
                            }
                        }
                    }
                    None => warn!(
                        "Skipping {} record without an asset reference in target {}",
                        collection, target_name
                    ),
                }
            }
        }
    }

    debug!("Resolved {} unique asset references", references.len());
    references
}
