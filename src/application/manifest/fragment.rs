//! Chaos engine fragments embedded as raw YAML inside workflow templates.
//!
//! Fragments are read from a delimiter-stripped copy of the artifact data
//! and rewritten as pure functions returning new text; the caller swaps the
//! result into its own template step.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::domain::error::ManifestError;
use crate::domain::manifest::{fault_name_from_generated, key, strip_template_delimiters};
use crate::domain::probe::{ProbeRef, ProbeSpec};

const FRAGMENT: &str = "chaos engine fragment";

/// Parsed view of one embedded chaos engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct EngineFragment {
    pub kind: String,
    pub metadata: FragmentMetadata,
    pub spec: FragmentSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct FragmentMetadata {
    pub name: String,
    pub generate_name: String,
    pub annotations: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FragmentSpec {
    pub experiments: Vec<FragmentExperiment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FragmentExperiment {
    pub name: String,
    pub spec: FragmentExperimentSpec,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FragmentExperimentSpec {
    pub probe: Option<Vec<ProbeSpec>>,
}

impl EngineFragment {
    /// Parse artifact data. `Ok(None)` when the data is some other document.
    pub fn parse(raw: &str) -> Result<Option<Self>, ManifestError> {
        let stripped = strip_template_delimiters(raw);
        let value = first_document(&stripped)?;
        let is_engine = value
            .get("kind")
            .and_then(Value::as_str)
            .is_some_and(|kind| kind.eq_ignore_ascii_case("chaosengine"));
        if !is_engine {
            return Ok(None);
        }
        serde_yaml::from_value(value).map(Some).map_err(parse_error)
    }

    /// Fault name keyed by the weight map.
    ///
    /// # Errors
    /// [`ManifestError::NoExperiments`] when no experiment is declared,
    /// [`ManifestError::EmptyFaultName`] when there is no generated name.
    pub fn fault_name(&self) -> Result<String, ManifestError> {
        let first = self
            .spec
            .experiments
            .first()
            .ok_or_else(|| ManifestError::NoExperiments(self.metadata.name.clone()))?;
        fault_name_from_generated(&self.metadata.generate_name, &first.name)
            .ok_or(ManifestError::EmptyFaultName)
    }

    #[must_use]
    pub fn has_probe_ref(&self) -> bool {
        self.metadata
            .annotations
            .as_ref()
            .is_some_and(|annotations| annotations.contains_key(key::PROBE_REF))
    }

    /// Probe specs of the first experiment; never empty.
    pub fn probe_specs(&self) -> Result<&[ProbeSpec], ManifestError> {
        self.spec
            .experiments
            .first()
            .and_then(|experiment| experiment.spec.probe.as_deref())
            .filter(|specs| !specs.is_empty())
            .ok_or_else(|| ManifestError::NoProbes(self.metadata.name.clone()))
    }
}

/// Insert a `probeRef` annotation into the fragment's own metadata.
///
/// The original text is rewritten when it parses as YAML, so template
/// expressions survive; otherwise the stripped text is used.
pub(crate) fn with_probe_ref(raw: &str, refs: &[ProbeRef]) -> Result<String, ManifestError> {
    let encoded = serde_json::to_string(refs).map_err(|e| ManifestError::Serialize {
        what: "probeRef annotation",
        reason: e.to_string(),
    })?;
    rewrite(raw, |root| {
        let annotations = section(metadata(root)?, "annotations")?;
        annotations.insert(Value::from(key::PROBE_REF), Value::from(encoded));
        Ok(())
    })
}

/// Parse, mutate and re-serialize a fragment.
pub(crate) fn rewrite<F>(raw: &str, mutate: F) -> Result<String, ManifestError>
where
    F: FnOnce(&mut Mapping) -> Result<(), ManifestError>,
{
    let mut doc = match first_document(raw) {
        Ok(doc) => doc,
        Err(_) => first_document(&strip_template_delimiters(raw))?,
    };
    let root = doc
        .as_mapping_mut()
        .ok_or(ManifestError::MissingMetadata(FRAGMENT))?;
    mutate(root)?;
    serde_yaml::to_string(&doc).map_err(|e| ManifestError::Serialize {
        what: FRAGMENT,
        reason: e.to_string(),
    })
}

/// The fragment's `metadata` block, which must already exist.
pub(crate) fn metadata(root: &mut Mapping) -> Result<&mut Mapping, ManifestError> {
    root.get_mut("metadata")
        .and_then(Value::as_mapping_mut)
        .ok_or(ManifestError::MissingMetadata(FRAGMENT))
}

/// Child mapping under `key`, created when absent or null.
pub(crate) fn section<'a>(
    parent: &'a mut Mapping,
    key: &str,
) -> Result<&'a mut Mapping, ManifestError> {
    let entry = parent
        .entry(Value::from(key))
        .or_insert(Value::Null);
    if entry.is_null() {
        *entry = Value::Mapping(Mapping::new());
    }
    entry.as_mapping_mut().ok_or_else(|| ManifestError::Parse {
        what: FRAGMENT,
        reason: format!("'{key}' is not a mapping"),
    })
}

/// First document of a YAML stream; null when the stream is empty.
///
/// Install steps carry several CRs separated by `---`; only the leading one
/// decides what the artifact is.
pub(crate) fn first_document(text: &str) -> Result<Value, ManifestError> {
    serde_yaml::Deserializer::from_str(text)
        .next()
        .map_or(Ok(Value::Null), Value::deserialize)
        .map_err(parse_error)
}

fn parse_error(err: serde_yaml::Error) -> ManifestError {
    ManifestError::Parse {
        what: FRAGMENT,
        reason: err.to_string(),
    }
}
