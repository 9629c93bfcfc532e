//! Manifest vocabulary: schema kinds, orchestration labels and fault naming.

use std::fmt;

use serde::Serialize;

use super::error::ManifestError;
use super::experiment::ExperimentKind;
use super::id::{ExperimentId, InfraId, RevisionId};

/// Label and annotation keys written into manifests.
pub mod key {
    pub const WORKFLOW_ID: &str = "workflow_id";
    pub const INFRA_ID: &str = "infra_id";
    pub const REVISION_ID: &str = "revision_id";
    /// Scopes workflow kinds to the controller running on the target infra.
    pub const CONTROLLER_INSTANCE_ID: &str = "workflows.argoproj.io/controller-instanceid";
    /// Marks engine kinds as standalone (not driven by a workflow controller).
    pub const TYPE: &str = "type";
    pub const STANDALONE_WORKFLOW: &str = "standalone_workflow";
    pub const WEIGHT: &str = "weight";
    pub const STEP_POD_NAME: &str = "step_pod_name";
    pub const WORKFLOW_RUN_ID: &str = "workflow_run_id";
    /// Annotation holding the provisioned probe references.
    pub const PROBE_REF: &str = "probeRef";
}

/// The four manifest schemas accepted by the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    Workflow,
    CronWorkflow,
    ChaosEngine,
    ChaosSchedule,
}

impl ManifestKind {
    /// Parse a manifest `kind` field, case-insensitively.
    ///
    /// # Errors
    /// Returns [`ManifestError::UnsupportedKind`] for any other kind.
    pub fn parse(kind: &str) -> Result<Self, ManifestError> {
        match kind.to_ascii_lowercase().as_str() {
            "workflow" => Ok(Self::Workflow),
            "cronworkflow" => Ok(Self::CronWorkflow),
            "chaosengine" => Ok(Self::ChaosEngine),
            "chaosschedule" => Ok(Self::ChaosSchedule),
            _ => Err(ManifestError::UnsupportedKind(kind.to_string())),
        }
    }

    /// Internal experiment kind this schema maps to.
    #[must_use]
    pub const fn experiment_kind(self) -> ExperimentKind {
        match self {
            Self::Workflow => ExperimentKind::NonCron,
            Self::CronWorkflow => ExperimentKind::Cron,
            Self::ChaosEngine | Self::ChaosSchedule => ExperimentKind::ChaosEngine,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Workflow => "Workflow",
            Self::CronWorkflow => "CronWorkflow",
            Self::ChaosEngine => "ChaosEngine",
            Self::ChaosSchedule => "ChaosSchedule",
        }
    }

    /// Controller-scoping label written at the root of this kind.
    #[must_use]
    pub fn scope_label(self, infra_id: &InfraId) -> (&'static str, String) {
        match self {
            Self::Workflow | Self::CronWorkflow => {
                (key::CONTROLLER_INSTANCE_ID, infra_id.to_string())
            }
            Self::ChaosEngine | Self::ChaosSchedule => {
                (key::TYPE, key::STANDALONE_WORKFLOW.to_string())
            }
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestration labels stamped on every normalized manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestrationLabels {
    entries: Vec<(&'static str, String)>,
}

impl OrchestrationLabels {
    /// Label set for a manifest of `kind` targeting `infra_id`.
    #[must_use]
    pub fn new(
        kind: ManifestKind,
        experiment_id: &ExperimentId,
        infra_id: &InfraId,
        revision_id: &RevisionId,
    ) -> Self {
        Self {
            entries: vec![
                (key::WORKFLOW_ID, experiment_id.to_string()),
                (key::INFRA_ID, infra_id.to_string()),
                kind.scope_label(infra_id),
                (key::REVISION_ID, revision_id.to_string()),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Remove template interpolation delimiters (`{{` and `}}`).
///
/// Workflow parameters such as `{{workflow.parameters.appNamespace}}` are
/// legal in the outer workflow but not in an embedded chaos engine.
#[must_use]
pub fn strip_template_delimiters(data: &str) -> String {
    data.replace("{{", "").replace("}}", "")
}

/// Derive the fault name of an embedded chaos engine from its generated name.
///
/// A trailing `-` is dropped. When the generated name is the first declared
/// experiment followed by a random suffix (`pod-delete-xyz`), the suffix is
/// dropped as well. Returns `None` when nothing is left.
#[must_use]
pub fn fault_name_from_generated(generate_name: &str, first_experiment: &str) -> Option<String> {
    let trimmed = generate_name.trim().trim_end_matches('-');
    if trimmed.is_empty() {
        return None;
    }
    if !first_experiment.is_empty() {
        if let Some(rest) = trimmed.strip_prefix(first_experiment) {
            if rest.is_empty() || rest.starts_with('-') {
                return Some(first_experiment.to_string());
            }
        }
    }
    Some(trimmed.to_string())
}

/// Probe names referenced by one workflow step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepProbes {
    /// Name of the input artifact carrying the fragment.
    pub artifact_name: String,
    pub probe_names: Vec<String>,
}

/// A stored cron workflow prepared for one scheduled run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeCronConfiguration {
    pub manifest: String,
    /// Generated names of every embedded chaos engine, in template order.
    pub faults: Vec<String>,
    pub probes: Vec<StepProbes>,
}
