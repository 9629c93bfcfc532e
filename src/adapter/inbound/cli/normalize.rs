//! Handler for `faultline normalize`.
//!
//! Runs the manifest normalizer against an in-process probe service that
//! records creation requests instead of persisting them.

use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::adapter::inbound::cli::command::NormalizeArgs;
use crate::adapter::inbound::cli::output;
use crate::application::manifest::normalizer::{ManifestNormalizer, NormalizeInput};
use crate::domain::id::{ExperimentId, InfraId, ProjectId, RevisionId};
use crate::domain::probe::{Probe, ProbeRequest};
use crate::domain::weightage::WeightOverrides;
use crate::error::Result;
use crate::port::outbound::probe::ProbeService;

/// Probe service that accepts every request and keeps it in memory.
#[derive(Debug, Default)]
pub struct OfflineProbeService {
    requests: Mutex<Vec<ProbeRequest>>,
}

impl OfflineProbeService {
    /// Requests received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ProbeRequest> {
        match self.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProbeService for OfflineProbeService {
    async fn add_probe(&self, request: ProbeRequest, project_id: &ProjectId) -> Result<Probe> {
        let probe = Probe {
            probe_id: uuid::Uuid::new_v4().to_string(),
            name: request.name.clone(),
            project_id: project_id.clone(),
            probe_type: request.probe_type.clone(),
        };
        match self.requests.lock() {
            Ok(mut requests) => requests.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }
        Ok(probe)
    }
}

/// `metadata.name` of a JSON manifest, if present.
fn manifest_name(manifest: &str) -> Option<String> {
    let doc: serde_json::Value = serde_json::from_str(manifest).ok()?;
    doc.pointer("/metadata/name")?.as_str().map(str::to_string)
}

/// Execute `normalize`.
pub async fn execute(args: &NormalizeArgs) -> Result<()> {
    if !is_json_manifest(&args.manifest) {
        output::warning("manifest is read as JSON regardless of its extension");
    }
    let manifest = std::fs::read_to_string(&args.manifest)?;
    let expected_name = args
        .name
        .clone()
        .or_else(|| manifest_name(&manifest))
        .unwrap_or_default();
    let experiment_id = args
        .experiment_id
        .as_deref()
        .map_or_else(ExperimentId::generate, ExperimentId::new);
    let overrides: WeightOverrides = args.weights.iter().cloned().collect();

    let probes = Arc::new(OfflineProbeService::default());
    let normalizer = ManifestNormalizer::new(Arc::clone(&probes));
    let normalized = normalizer
        .normalize(NormalizeInput {
            manifest: &manifest,
            expected_name: &expected_name,
            experiment_id: &experiment_id,
            infra_id: &InfraId::new(args.infra.as_str()),
            revision_id: &RevisionId::new(args.revision.as_str()),
            project_id: &ProjectId::new(args.project.as_str()),
            overrides: &overrides,
        })
        .await?;

    output::section("Normalized");
    output::field("Source", args.manifest.display());
    output::field("Kind", normalized.kind);
    output::field("Experiment", &experiment_id);
    if let Some(cron_syntax) = &normalized.cron_syntax {
        output::field("Schedule", cron_syntax);
    }

    let provisioned = probes.requests();
    if !provisioned.is_empty() {
        output::section("Probes provisioned");
        for request in &provisioned {
            output::note(&format!("{} ({})", request.name, request.probe_type.as_str()));
        }
    }

    if !normalized.new_weightages.is_empty() {
        output::section("New weights");
        output::weights(&normalized.new_weightages);
    }

    output::section("Manifest");
    output::manifest(&normalized.manifest);
    Ok(())
}

/// Whether `path` looks like a manifest this command can read.
#[must_use]
pub fn is_json_manifest(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
