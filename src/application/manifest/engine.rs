//! Chaos engine and chaos schedule handlers.
//!
//! These kinds are the engine itself rather than a workflow around it: the
//! fault name is the first declared experiment, and the probe reference and
//! weight label both live on the root.

use serde_json::Value;
use tracing::debug;

use super::document;
use super::normalizer::{KindOutcome, ManifestNormalizer, NormalizeInput};
use super::weight;
use crate::domain::error::ManifestError;
use crate::domain::manifest::{key, ManifestKind};
use crate::domain::probe::ProbeSpec;
use crate::error::Result;
use crate::port::outbound::probe::ProbeService;

impl<P: ProbeService> ManifestNormalizer<P> {
    pub(super) async fn chaos_engine(
        &self,
        doc: &mut Value,
        input: &NormalizeInput<'_>,
    ) -> Result<KindOutcome> {
        self.standalone(doc, input, ManifestKind::ChaosEngine, "/spec/experiments")
            .await
    }

    pub(super) async fn chaos_schedule(
        &self,
        doc: &mut Value,
        input: &NormalizeInput<'_>,
    ) -> Result<KindOutcome> {
        self.standalone(
            doc,
            input,
            ManifestKind::ChaosSchedule,
            "/spec/engineTemplateSpec/experiments",
        )
        .await
    }

    async fn standalone(
        &self,
        doc: &mut Value,
        input: &NormalizeInput<'_>,
        kind: ManifestKind,
        experiments: &str,
    ) -> Result<KindOutcome> {
        let what = what(kind);
        let name = document::header(doc).name;
        document::stamp(
            document::object_at(doc, &["metadata", "labels"], what)?,
            &input.labels(kind),
        );

        let first = doc
            .pointer(experiments)
            .and_then(Value::as_array)
            .and_then(|items| items.first())
            .cloned()
            .ok_or_else(|| ManifestError::NoExperiments(name.clone()))?;
        let fault = first
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if fault.is_empty() {
            return Err(ManifestError::EmptyFaultName.into());
        }

        let has_probe_ref = doc
            .pointer("/metadata/annotations")
            .and_then(Value::as_object)
            .is_some_and(|annotations| annotations.contains_key(key::PROBE_REF));
        if !has_probe_ref {
            let specs = probe_specs(&first, &name, what)?;
            let refs = self.provisioner.provision(&specs, input.project_id).await?;
            let encoded = serde_json::to_string(&refs)?;
            document::object_at(doc, &["metadata", "annotations"], what)?
                .insert(key::PROBE_REF.to_string(), Value::String(encoded));
        }

        let labels = document::object_at(doc, &["metadata", "labels"], what)?;
        let entry = weight::resolve(&fault, input.overrides, labels)?;
        debug!(kind = %kind, fault = %fault, resolved = entry.is_some(), "Engine normalized");

        Ok(KindOutcome {
            new_weightages: entry.into_iter().collect(),
            cron_syntax: None,
        })
    }
}

const fn what(kind: ManifestKind) -> &'static str {
    match kind {
        ManifestKind::ChaosSchedule => "chaos schedule",
        _ => "chaos engine",
    }
}

/// Probe specs of the first experiment; never empty.
fn probe_specs(
    experiment: &Value,
    engine: &str,
    what: &'static str,
) -> std::result::Result<Vec<ProbeSpec>, ManifestError> {
    let Some(raw) = experiment.pointer("/spec/probe").filter(|v| !v.is_null()) else {
        return Err(ManifestError::NoProbes(engine.to_string()));
    };
    let specs: Vec<ProbeSpec> =
        serde_json::from_value(raw.clone()).map_err(|e| ManifestError::Parse {
            what,
            reason: e.to_string(),
        })?;
    if specs.is_empty() {
        return Err(ManifestError::NoProbes(engine.to_string()));
    }
    Ok(specs)
}
