//! Per-fault execution weights.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Weight assigned to a fault when neither the caller nor the manifest sets one.
pub const DEFAULT_WEIGHT: i32 = 10;

/// Relative execution weight assigned to a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weightage {
    /// Fault name, unique within an experiment.
    pub fault_name: String,
    /// Relative weight.
    pub weight: i32,
}

impl Weightage {
    /// Create a weight entry.
    pub fn new(fault_name: impl Into<String>, weight: i32) -> Self {
        Self {
            fault_name: fault_name.into(),
            weight,
        }
    }
}

/// Caller-supplied weights keyed by fault name.
pub type WeightOverrides = HashMap<String, i32>;

/// Build the override map from the caller's weight entries.
///
/// Later entries win when a fault name repeats.
#[must_use]
pub fn overrides(weightages: &[Weightage]) -> WeightOverrides {
    weightages
        .iter()
        .map(|w| (w.fault_name.clone(), w.weight))
        .collect()
}

/// Append `additions` to `weightages`, keeping fault names unique.
///
/// Entries already present keep their position and value.
pub fn merge(weightages: &mut Vec<Weightage>, additions: impl IntoIterator<Item = Weightage>) {
    for entry in additions {
        if weightages.iter().all(|w| w.fault_name != entry.fault_name) {
            weightages.push(entry);
        }
    }
}
