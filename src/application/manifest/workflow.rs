//! Workflow and cron workflow handlers.
//!
//! Both carry chaos engines as raw YAML artifacts on their template steps.
//! Each step is rewritten independently; its weight label lives on the
//! step's own metadata.

use serde_json::Value;
use tracing::debug;

use super::document::{self, Object};
use super::fragment::{self, EngineFragment};
use super::normalizer::{KindOutcome, ManifestNormalizer, NormalizeInput};
use super::weight;
use crate::domain::error::ManifestError;
use crate::domain::manifest::ManifestKind;
use crate::domain::weightage::Weightage;
use crate::error::Result;
use crate::port::outbound::probe::ProbeService;

const ARTIFACT_DATA: &str = "/inputs/artifacts/0/raw/data";

impl<P: ProbeService> ManifestNormalizer<P> {
    pub(super) async fn workflow(
        &self,
        doc: &mut Value,
        input: &NormalizeInput<'_>,
    ) -> Result<KindOutcome> {
        let labels = input.labels(ManifestKind::Workflow);
        document::stamp(
            document::object_at(doc, &["metadata", "labels"], "workflow")?,
            &labels,
        );

        let new_weightages = self.rewrite_steps(doc, "/spec/templates", input).await?;
        Ok(KindOutcome {
            new_weightages,
            cron_syntax: None,
        })
    }

    pub(super) async fn cron_workflow(
        &self,
        doc: &mut Value,
        input: &NormalizeInput<'_>,
    ) -> Result<KindOutcome> {
        let schedule = doc
            .pointer("/spec/schedule")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if schedule.is_empty() {
            return Err(ManifestError::MissingSchedule.into());
        }

        let labels = input.labels(ManifestKind::CronWorkflow);
        document::stamp(
            document::object_at(doc, &["metadata", "labels"], "cron workflow")?,
            &labels,
        );
        document::stamp(
            document::object_at(
                doc,
                &["spec", "workflowMetadata", "labels"],
                "cron workflow",
            )?,
            &labels,
        );

        let new_weightages = self
            .rewrite_steps(doc, "/spec/workflowSpec/templates", input)
            .await?;
        Ok(KindOutcome {
            new_weightages,
            cron_syntax: Some(schedule),
        })
    }

    async fn rewrite_steps(
        &self,
        doc: &mut Value,
        templates: &str,
        input: &NormalizeInput<'_>,
    ) -> Result<Vec<Weightage>> {
        let mut new_weightages = Vec::new();
        for step in document::array_at(doc, templates) {
            if let Some(entry) = self.rewrite_step(step, input).await? {
                new_weightages.push(entry);
            }
        }
        Ok(new_weightages)
    }

    /// Rewrite one template step. Steps without a chaos engine artifact are
    /// left untouched.
    async fn rewrite_step(
        &self,
        step: &mut Value,
        input: &NormalizeInput<'_>,
    ) -> Result<Option<Weightage>> {
        let Some(raw) = step
            .pointer(ARTIFACT_DATA)
            .and_then(Value::as_str)
            .filter(|data| !data.is_empty())
            .map(str::to_string)
        else {
            return Ok(None);
        };
        let Some(engine) = EngineFragment::parse(&raw)? else {
            return Ok(None);
        };

        let fault = engine.fault_name()?;
        if !engine.has_probe_ref() {
            let refs = self
                .provisioner
                .provision(engine.probe_specs()?, input.project_id)
                .await?;
            let rewritten = fragment::with_probe_ref(&raw, &refs)?;
            if let Some(data) = step.pointer_mut(ARTIFACT_DATA) {
                *data = Value::String(rewritten);
            }
        }

        let labels: &mut Object = document::object_at(step, &["metadata", "labels"], "template")?;
        let entry = weight::resolve(&fault, input.overrides, labels)?;
        debug!(fault = %fault, resolved = entry.is_some(), "Template step normalized");
        Ok(entry)
    }
}
