//! The experiment aggregate and its revision log.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::{ExperimentId, ExperimentRunId, InfraId, ProjectId, RevisionId};
use super::weightage::Weightage;

/// Internal experiment kind, collapsed from the four manifest schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentKind {
    /// One-shot workflow.
    NonCron,
    /// Scheduled (cron) workflow.
    Cron,
    /// Standalone chaos engine or chaos schedule.
    ChaosEngine,
}

impl ExperimentKind {
    /// Stable persisted name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NonCron => "non_cron",
            Self::Cron => "cron",
            Self::ChaosEngine => "chaos_engine",
        }
    }
}

impl fmt::Display for ExperimentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExperimentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "non_cron" => Ok(Self::NonCron),
            "cron" => Ok(Self::Cron),
            "chaos_engine" => Ok(Self::ChaosEngine),
            other => Err(format!("unknown experiment kind '{other}'")),
        }
    }
}

/// Immutable snapshot of a normalized manifest plus its weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub revision_id: RevisionId,
    /// Fully normalized manifest text.
    pub manifest: String,
    /// Milliseconds since the Unix epoch.
    pub updated_at: i64,
    pub weightages: Vec<Weightage>,
}

/// Audit trail shared by experiments and runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub created_at: i64,
    pub updated_at: i64,
    pub created_by: String,
    pub updated_by: String,
    /// Soft-delete flag. Rows are never hard-deleted.
    pub is_removed: bool,
}

impl Audit {
    /// Fresh audit block for a record created by `user` at `now`.
    #[must_use]
    pub fn created(user: &str, now: i64) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            created_by: user.to_string(),
            updated_by: user.to_string(),
            is_removed: false,
        }
    }
}

/// A user-defined chaos test with its revision history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    pub experiment_id: ExperimentId,
    pub project_id: ProjectId,
    pub infra_id: InfraId,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub kind: ExperimentKind,
    /// Populated only for [`ExperimentKind::Cron`].
    pub cron_syntax: String,
    pub is_custom: bool,
    pub weightages: Vec<Weightage>,
    /// Append-only; insertion order is chronological order.
    pub revisions: Vec<Revision>,
    pub audit: Audit,
}

impl Experiment {
    /// The most recently appended revision.
    #[must_use]
    pub fn latest_revision(&self) -> Option<&Revision> {
        self.revisions.last()
    }

    /// Look up a revision by ID.
    #[must_use]
    pub fn revision(&self, revision_id: &RevisionId) -> Option<&Revision> {
        self.revisions.iter().find(|r| &r.revision_id == revision_id)
    }

    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.audit.is_removed
    }
}

/// Experiment submission as received from the web layer.
///
/// Normalization rewrites `manifest`, fills `experiment_id`, extends
/// `weightages` and (for cron workflows) sets `cron_syntax`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentRequest {
    pub experiment_id: Option<ExperimentId>,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub infra_id: InfraId,
    pub manifest: String,
    pub cron_syntax: String,
    pub is_custom: bool,
    pub weightages: Vec<Weightage>,
}

/// Scope of every store mutation: one experiment inside one project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExperimentFilter {
    pub experiment_id: ExperimentId,
    pub project_id: ProjectId,
}

impl ExperimentFilter {
    pub fn new(experiment_id: ExperimentId, project_id: ProjectId) -> Self {
        Self {
            experiment_id,
            project_id,
        }
    }
}

impl From<&Experiment> for ExperimentFilter {
    fn from(experiment: &Experiment) -> Self {
        Self::new(experiment.experiment_id.clone(), experiment.project_id.clone())
    }
}

/// How an update treats the revision log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Push a new revision and refresh the mutable top-level fields.
    Append,
    /// Rewrite the manifest of an existing revision, keeping its identity.
    ///
    /// Used only when pausing or resuming scheduled experiments.
    ReplaceInPlace,
}

impl UpdateMode {
    #[must_use]
    pub const fn from_replace_flag(replace_in_place: bool) -> Self {
        if replace_in_place {
            Self::ReplaceInPlace
        } else {
            Self::Append
        }
    }
}

/// Field set written by an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentUpdate {
    pub kind: ExperimentKind,
    pub cron_syntax: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub infra_id: InfraId,
    pub is_custom: bool,
    pub weightages: Vec<Weightage>,
    pub revision: Revision,
    pub updated_by: String,
    pub updated_at: i64,
}

/// One execution of an experiment, stored apart from the experiment itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentRun {
    pub experiment_run_id: ExperimentRunId,
    pub experiment_id: ExperimentId,
    pub project_id: ProjectId,
    pub revision_id: RevisionId,
    /// Execution phase reported by the agent (e.g. `Running`, `Completed`).
    pub phase: String,
    pub audit: Audit,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revision(id: &str) -> Revision {
        Revision {
            revision_id: RevisionId::new(id),
            manifest: "{}".into(),
            updated_at: 1,
            weightages: vec![],
        }
    }

    #[test]
    fn experiment_kind_roundtrips_through_str() {
        for kind in [
            ExperimentKind::NonCron,
            ExperimentKind::Cron,
            ExperimentKind::ChaosEngine,
        ] {
            assert_eq!(kind.as_str().parse::<ExperimentKind>(), Ok(kind));
        }
        assert!("weekly".parse::<ExperimentKind>().is_err());
    }

    #[test]
    fn update_mode_from_flag() {
        assert_eq!(UpdateMode::from_replace_flag(true), UpdateMode::ReplaceInPlace);
        assert_eq!(UpdateMode::from_replace_flag(false), UpdateMode::Append);
    }

    #[test]
    fn latest_revision_is_last_appended() {
        let experiment = Experiment {
            experiment_id: ExperimentId::new("e"),
            project_id: ProjectId::new("p"),
            infra_id: InfraId::new("i"),
            name: "e".into(),
            description: String::new(),
            tags: vec![],
            kind: ExperimentKind::NonCron,
            cron_syntax: String::new(),
            is_custom: false,
            weightages: vec![],
            revisions: vec![revision("r1"), revision("r2")],
            audit: Audit::created("alice", 1),
        };
        assert_eq!(experiment.latest_revision().unwrap().revision_id.as_str(), "r2");
        assert!(experiment.revision(&RevisionId::new("r1")).is_some());
        assert!(experiment.revision(&RevisionId::new("r3")).is_none());
    }
}
