//! SQLite experiment store: transactional soft-delete and revision appends.

mod support;

use std::sync::Arc;

use faultline::adapter::outbound::sqlite::store::SqliteExperimentStore;
use faultline::domain::experiment::{
    Audit, Experiment, ExperimentFilter, ExperimentKind, ExperimentRun, ExperimentUpdate,
    Revision, UpdateMode,
};
use faultline::domain::id::{ExperimentId, ExperimentRunId, InfraId, ProjectId, RevisionId};
use faultline::domain::weightage::Weightage;
use faultline::error::{Error, StoreError};
use faultline::port::outbound::store::{ExperimentRunStore, ExperimentStore};
use support::temp_db::TempDb;

fn experiment(id: &str) -> Experiment {
    Experiment {
        experiment_id: ExperimentId::new(id),
        project_id: ProjectId::new("proj"),
        infra_id: InfraId::new("infra-1"),
        name: "pod-chaos".into(),
        description: String::new(),
        tags: vec![],
        kind: ExperimentKind::NonCron,
        cron_syntax: String::new(),
        is_custom: false,
        weightages: vec![Weightage::new("pod-delete", 10)],
        revisions: vec![Revision {
            revision_id: RevisionId::new("r1"),
            manifest: "{\"v\":1}".into(),
            updated_at: 1,
            weightages: vec![Weightage::new("pod-delete", 10)],
        }],
        audit: Audit::created("alice", 1),
    }
}

fn append(revision_id: &str, user: &str) -> ExperimentUpdate {
    ExperimentUpdate {
        kind: ExperimentKind::NonCron,
        cron_syntax: String::new(),
        name: "pod-chaos".into(),
        description: String::new(),
        tags: vec![],
        infra_id: InfraId::new("infra-1"),
        is_custom: false,
        weightages: vec![Weightage::new("pod-delete", 10)],
        revision: Revision {
            revision_id: RevisionId::new(revision_id),
            manifest: format!("{{\"rev\":\"{revision_id}\"}}"),
            updated_at: 2,
            weightages: vec![],
        },
        updated_by: user.into(),
        updated_at: 2,
    }
}

async fn record_runs(store: &SqliteExperimentStore, experiment: &Experiment, count: usize) {
    for _ in 0..count {
        store
            .record_run(&ExperimentRun {
                experiment_run_id: ExperimentRunId::generate(),
                experiment_id: experiment.experiment_id.clone(),
                project_id: experiment.project_id.clone(),
                revision_id: RevisionId::new("r1"),
                phase: "Completed".into(),
                audit: Audit::created("alice", 1),
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn failed_run_cascade_rolls_back_the_experiment_flag() {
    let db = TempDb::create();
    let store = SqliteExperimentStore::new(db.pool().clone());
    let original = experiment("e1");
    store.create(&original).await.unwrap();
    record_runs(&store, &original, 2).await;
    db.execute(
        "CREATE TRIGGER block_run_updates BEFORE UPDATE ON experiment_runs \
         BEGIN SELECT RAISE(ABORT, 'runs are read-only'); END;",
    );
    let filter = ExperimentFilter::from(&original);

    let err = store.soft_delete(&filter, "carol").await.unwrap_err();

    assert!(matches!(err, Error::Store(StoreError::Persistence(_))));
    let stored = store.get(&filter).await.unwrap().unwrap();
    assert!(!stored.is_removed());
    assert_eq!(stored.audit.updated_by, "alice");
    assert_eq!(
        store.list_runs(&original.experiment_id, false).await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn soft_delete_touches_only_the_target_experiment_runs() {
    let db = TempDb::create();
    let store = SqliteExperimentStore::new(db.pool().clone());
    let target = experiment("e1");
    let bystander = experiment("e2");
    store.create(&target).await.unwrap();
    store.create(&bystander).await.unwrap();
    record_runs(&store, &target, 1).await;
    record_runs(&store, &bystander, 1).await;

    store
        .soft_delete(&ExperimentFilter::from(&target), "carol")
        .await
        .unwrap();

    assert!(store
        .list_runs(&target.experiment_id, false)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        store.list_runs(&bystander.experiment_id, false).await.unwrap().len(),
        1
    );
    let remaining = store.list(&ProjectId::new("proj"), false).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].experiment_id, bystander.experiment_id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_appends_keep_both_revisions() {
    let db = TempDb::with_pool_size(4);
    let store = Arc::new(SqliteExperimentStore::new(db.pool().clone()));
    let original = experiment("e1");
    store.create(&original).await.unwrap();
    let filter = ExperimentFilter::from(&original);

    let tasks: Vec<_> = ["r2", "r3"]
        .into_iter()
        .map(|revision| {
            let store = Arc::clone(&store);
            let filter = filter.clone();
            tokio::spawn(async move {
                store
                    .update(&filter, &append(revision, "bob"), UpdateMode::Append)
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let stored = store.get(&filter).await.unwrap().unwrap();
    let mut ids: Vec<&str> = stored
        .revisions
        .iter()
        .map(|r| r.revision_id.as_str())
        .collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids[0], "r1");
    ids.sort_unstable();
    assert_eq!(ids, vec!["r1", "r2", "r3"]);
}

#[tokio::test]
async fn replace_in_place_with_missing_revision_leaves_record_unchanged() {
    let db = TempDb::create();
    let store = SqliteExperimentStore::new(db.pool().clone());
    let original = experiment("e1");
    store.create(&original).await.unwrap();
    let filter = ExperimentFilter::from(&original);

    let err = store
        .update(&filter, &append("r9", "bob"), UpdateMode::ReplaceInPlace)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Store(StoreError::RevisionNotFound { .. })
    ));
    assert_eq!(store.get(&filter).await.unwrap().unwrap(), original);
}

#[tokio::test]
async fn duplicate_create_is_rejected_across_pool_connections() {
    let db = TempDb::create();
    let store = SqliteExperimentStore::new(db.pool().clone());
    store.create(&experiment("e1")).await.unwrap();

    let err = store.create(&experiment("e1")).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Store(StoreError::DuplicateExperiment { .. })
    ));
    assert_eq!(store.list(&ProjectId::new("proj"), true).await.unwrap().len(), 1);
}
