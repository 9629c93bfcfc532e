//! The manifest normalizer and its per-kind dispatch.

use std::sync::Arc;

use tracing::debug;

use super::document;
use crate::application::probe::ProbeProvisioner;
use crate::domain::error::ManifestError;
use crate::domain::id::{ExperimentId, InfraId, ProjectId, RevisionId};
use crate::domain::manifest::{ManifestKind, OrchestrationLabels};
use crate::domain::weightage::{WeightOverrides, Weightage};
use crate::error::Result;
use crate::port::outbound::probe::ProbeService;

/// Everything a handler needs besides the document itself.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeInput<'a> {
    pub manifest: &'a str,
    /// Name the manifest's `metadata.name` must equal.
    pub expected_name: &'a str,
    pub experiment_id: &'a ExperimentId,
    pub infra_id: &'a InfraId,
    pub revision_id: &'a RevisionId,
    pub project_id: &'a ProjectId,
    pub overrides: &'a WeightOverrides,
}

impl NormalizeInput<'_> {
    pub(super) fn labels(&self, kind: ManifestKind) -> OrchestrationLabels {
        OrchestrationLabels::new(kind, self.experiment_id, self.infra_id, self.revision_id)
    }
}

/// Result of normalizing one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedManifest {
    /// Re-serialized document.
    pub manifest: String,
    pub kind: ManifestKind,
    /// Weights resolved from labels or the default, in template order.
    pub new_weightages: Vec<Weightage>,
    /// Schedule of a cron workflow.
    pub cron_syntax: Option<String>,
}

/// What a kind handler contributes besides the rewritten document.
#[derive(Debug, Default)]
pub(super) struct KindOutcome {
    pub new_weightages: Vec<Weightage>,
    pub cron_syntax: Option<String>,
}

/// Normalizes manifests, provisioning probes as it goes.
pub struct ManifestNormalizer<P> {
    pub(super) provisioner: ProbeProvisioner<P>,
}

impl<P> Clone for ManifestNormalizer<P> {
    fn clone(&self) -> Self {
        Self {
            provisioner: self.provisioner.clone(),
        }
    }
}

impl<P: ProbeService> ManifestNormalizer<P> {
    pub fn new(probes: Arc<P>) -> Self {
        Self {
            provisioner: ProbeProvisioner::new(probes),
        }
    }

    /// Normalize `input.manifest`.
    ///
    /// # Errors
    /// Any [`ManifestError`], or a probe provisioning failure.
    pub async fn normalize(&self, input: NormalizeInput<'_>) -> Result<NormalizedManifest> {
        let mut doc = document::parse(input.manifest)?;
        let header = document::header(&doc);
        if header.name != input.expected_name {
            return Err(ManifestError::NameMismatch {
                kind: header.kind,
                expected: input.expected_name.to_string(),
                found: header.name,
            }
            .into());
        }

        let kind = ManifestKind::parse(&header.kind)?;
        debug!(
            kind = %kind,
            experiment_id = %input.experiment_id,
            revision_id = %input.revision_id,
            "Normalizing manifest"
        );

        let outcome = match kind {
            ManifestKind::Workflow => self.workflow(&mut doc, &input).await?,
            ManifestKind::CronWorkflow => self.cron_workflow(&mut doc, &input).await?,
            ManifestKind::ChaosEngine => self.chaos_engine(&mut doc, &input).await?,
            ManifestKind::ChaosSchedule => self.chaos_schedule(&mut doc, &input).await?,
        };

        Ok(NormalizedManifest {
            manifest: document::serialize(&doc)?,
            kind,
            new_weightages: outcome.new_weightages,
            cron_syntax: outcome.cron_syntax,
        })
    }
}
