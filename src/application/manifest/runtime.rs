//! Per-run preparation of stored cron workflows.

use serde_json::Value;
use serde_yaml::Value as Yaml;

use super::document;
use super::fragment::{self, EngineFragment};
use crate::domain::error::ManifestError;
use crate::domain::id::InfraId;
use crate::domain::manifest::{key, RuntimeCronConfiguration, StepProbes};
use crate::domain::probe::ProbeRef;

const STEP_POD_NAME: &str = "{{pod.name}}";
const WORKFLOW_UID: &str = "{{workflow.uid}}";

/// Stamp run-scoped labels on every embedded chaos engine of a cron
/// workflow, collecting fault names and the probes each step references.
///
/// Fragments are read as stored, without delimiter stripping.
///
/// # Errors
/// [`ManifestError::Parse`] when the manifest, a fragment or a `probeRef`
/// annotation is malformed.
pub fn runtime_cron_configuration(
    manifest: &str,
    infra_id: &InfraId,
) -> Result<RuntimeCronConfiguration, ManifestError> {
    let mut doc = document::parse(manifest)?;
    let mut faults = Vec::new();
    let mut probes = Vec::new();

    for step in document::array_at(&mut doc, "/spec/workflowSpec/templates") {
        let Some(artifact) = step.pointer_mut("/inputs/artifacts/0") else {
            continue;
        };
        let Some(raw) = artifact
            .pointer("/raw/data")
            .and_then(Value::as_str)
            .filter(|data| !data.is_empty())
            .map(str::to_string)
        else {
            continue;
        };
        let parsed = fragment::first_document(&raw)?;
        let is_engine = parsed
            .get("kind")
            .and_then(Yaml::as_str)
            .is_some_and(|kind| kind.eq_ignore_ascii_case("chaosengine"));
        if !is_engine {
            continue;
        }
        let engine: EngineFragment =
            serde_yaml::from_value(parsed).map_err(|e| ManifestError::Parse {
                what: "chaos engine fragment",
                reason: e.to_string(),
            })?;

        faults.push(engine.metadata.generate_name.clone());
        probes.push(StepProbes {
            artifact_name: artifact
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            probe_names: probe_names(&engine)?,
        });

        let rewritten = fragment::rewrite(&raw, |root| {
            let labels = fragment::section(fragment::metadata(root)?, "labels")?;
            for (label, value) in [
                (key::INFRA_ID, infra_id.as_str()),
                (key::STEP_POD_NAME, STEP_POD_NAME),
                (key::WORKFLOW_RUN_ID, WORKFLOW_UID),
            ] {
                labels.insert(Yaml::from(label), Yaml::from(value));
            }
            Ok(())
        })?;
        if let Some(data) = artifact.pointer_mut("/raw/data") {
            *data = Value::String(rewritten);
        }
    }

    Ok(RuntimeCronConfiguration {
        manifest: document::serialize(&doc)?,
        faults,
        probes,
    })
}

fn probe_names(engine: &EngineFragment) -> Result<Vec<String>, ManifestError> {
    let Some(encoded) = engine
        .metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(key::PROBE_REF))
    else {
        return Ok(Vec::new());
    };
    let refs: Vec<ProbeRef> = serde_json::from_str(encoded).map_err(|e| ManifestError::Parse {
        what: "probeRef annotation",
        reason: e.to_string(),
    })?;
    Ok(refs.into_iter().map(|r| r.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::manifest::{chaos_engine, cron_workflow};

    #[test]
    fn stamps_run_labels_and_collects_probes() {
        let manifest = cron_workflow("nightly", "0 2 * * *")
            .step(
                "pod-delete",
                chaos_engine("pod-delete-xyz", "pod-delete")
                    .probe_ref(r#"[{"name":"check","mode":"SOT"},{"name":"slo","mode":"Edge"}]"#),
            )
            .build();

        let config = runtime_cron_configuration(&manifest, &InfraId::new("infra-1")).unwrap();

        assert_eq!(config.faults, vec!["pod-delete-xyz".to_string()]);
        assert_eq!(config.probes.len(), 1);
        assert_eq!(config.probes[0].artifact_name, "pod-delete");
        assert_eq!(config.probes[0].probe_names, vec!["check", "slo"]);

        let doc: Value = serde_json::from_str(&config.manifest).unwrap();
        let data = doc["spec"]["workflowSpec"]["templates"][0]["inputs"]["artifacts"][0]["raw"]
            ["data"]
            .as_str()
            .unwrap();
        let fragment: Yaml = serde_yaml::from_str(data).unwrap();
        let labels = &fragment["metadata"]["labels"];
        assert_eq!(labels["infra_id"].as_str(), Some("infra-1"));
        assert_eq!(labels["step_pod_name"].as_str(), Some("{{pod.name}}"));
        assert_eq!(labels["workflow_run_id"].as_str(), Some("{{workflow.uid}}"));
    }

    #[test]
    fn steps_without_engines_are_ignored() {
        let manifest = cron_workflow("nightly", "0 2 * * *")
            .raw_step("install", "kind: ConfigMap\nmetadata:\n  name: cfg\n")
            .build();

        let config = runtime_cron_configuration(&manifest, &InfraId::new("infra-1")).unwrap();

        assert!(config.faults.is_empty());
        assert!(config.probes.is_empty());
    }

    #[test]
    fn multi_document_install_step_is_ignored() {
        let manifest = cron_workflow("nightly", "0 2 * * *")
            .raw_step(
                "install-chaos-faults",
                "kind: ChaosExperiment\nmetadata:\n  name: pod-delete\n---\n\
                 kind: ChaosExperiment\nmetadata:\n  name: pod-cpu-hog\n",
            )
            .step(
                "pod-delete",
                chaos_engine("pod-delete-xyz", "pod-delete")
                    .probe_ref(r#"[{"name":"check","mode":"SOT"}]"#),
            )
            .build();

        let config = runtime_cron_configuration(&manifest, &InfraId::new("infra-1")).unwrap();

        assert_eq!(config.faults, vec!["pod-delete-xyz".to_string()]);
        assert_eq!(config.probes.len(), 1);
    }

    #[test]
    fn malformed_probe_ref_is_rejected() {
        let manifest = cron_workflow("nightly", "0 2 * * *")
            .step(
                "pod-delete",
                chaos_engine("pod-delete-xyz", "pod-delete").probe_ref("not json"),
            )
            .build();

        let err = runtime_cron_configuration(&manifest, &InfraId::new("infra-1")).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { what: "probeRef annotation", .. }));
    }
}
