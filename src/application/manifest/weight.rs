//! Per-fault weight resolution.

use serde_json::Value;

use super::document::Object;
use crate::domain::error::ManifestError;
use crate::domain::manifest::key;
use crate::domain::weightage::{WeightOverrides, Weightage, DEFAULT_WEIGHT};

/// Resolve the weight of `fault` against the label map of its step.
///
/// Precedence is caller override, then an existing `weight` label, then
/// [`DEFAULT_WEIGHT`]. Overrides are written to the label and produce no
/// entry; the other two cases return an entry for the caller to merge.
///
/// # Errors
/// [`ManifestError::InvalidWeight`] when an existing label is not an integer.
pub(crate) fn resolve(
    fault: &str,
    overrides: &WeightOverrides,
    labels: &mut Object,
) -> Result<Option<Weightage>, ManifestError> {
    if let Some(weight) = overrides.get(fault) {
        labels.insert(key::WEIGHT.to_string(), Value::String(weight.to_string()));
        return Ok(None);
    }

    if let Some(existing) = labels.get(key::WEIGHT) {
        let raw = match existing {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let weight = raw
            .trim()
            .parse::<i32>()
            .map_err(|_| ManifestError::InvalidWeight {
                fault: fault.to_string(),
                value: raw.clone(),
            })?;
        return Ok(Some(Weightage::new(fault, weight)));
    }

    labels.insert(
        key::WEIGHT.to_string(),
        Value::String(DEFAULT_WEIGHT.to_string()),
    );
    Ok(Some(Weightage::new(fault, DEFAULT_WEIGHT)))
}
