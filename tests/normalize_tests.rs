//! Manifest normalization across the four supported kinds.

use std::sync::Arc;

use faultline::application::manifest::normalizer::{
    ManifestNormalizer, NormalizeInput, NormalizedManifest,
};
use faultline::domain::error::ManifestError;
use faultline::domain::id::{ExperimentId, InfraId, ProjectId, RevisionId};
use faultline::domain::manifest::ManifestKind;
use faultline::domain::weightage::{WeightOverrides, Weightage};
use faultline::error::{Error, ProbeError, Result};
use faultline::testkit::fake::RecordingProbeService;
use faultline::testkit::manifest::{chaos_engine, cron_workflow, workflow, EngineBuilder};
use serde_json::Value;

struct Harness {
    probes: Arc<RecordingProbeService>,
    normalizer: ManifestNormalizer<RecordingProbeService>,
    overrides: WeightOverrides,
}

impl Harness {
    fn new() -> Self {
        let probes = Arc::new(RecordingProbeService::new());
        Self {
            normalizer: ManifestNormalizer::new(Arc::clone(&probes)),
            probes,
            overrides: WeightOverrides::new(),
        }
    }

    fn with_override(mut self, fault: &str, weight: i32) -> Self {
        self.overrides.insert(fault.to_string(), weight);
        self
    }

    async fn run(&self, manifest: &str, name: &str) -> Result<NormalizedManifest> {
        self.normalizer
            .normalize(NormalizeInput {
                manifest,
                expected_name: name,
                experiment_id: &ExperimentId::new("exp-1"),
                infra_id: &InfraId::new("infra-1"),
                revision_id: &RevisionId::new("rev-1"),
                project_id: &ProjectId::new("proj-1"),
                overrides: &self.overrides,
            })
            .await
    }
}

fn parse(manifest: &str) -> Value {
    serde_json::from_str(manifest).unwrap()
}

fn artifact(doc: &Value, templates: &str, index: usize) -> Value {
    let data = doc
        .pointer(&format!("{templates}/{index}/inputs/artifacts/0/raw/data"))
        .and_then(Value::as_str)
        .unwrap();
    serde_yaml::from_str(data).unwrap()
}

/// One manifest of every supported kind, with the probes each provisions.
fn every_kind() -> Vec<(&'static str, String, usize)> {
    vec![
        (
            "w1",
            workflow("w1")
                .step("pod-delete", chaos_engine("pod-delete-", "pod-delete").probe("check"))
                .step("pod-cpu-hog", chaos_engine("pod-cpu-hog-", "pod-cpu-hog").probe("cpu"))
                .weight("4")
                .build(),
            2,
        ),
        (
            "c1",
            cron_workflow("c1", "0 2 * * *")
                .step("pod-delete", chaos_engine("pod-delete-", "pod-delete").probe("check"))
                .weight("6")
                .build(),
            1,
        ),
        (
            "e1",
            chaos_engine("unused", "pod-delete")
                .probe("check")
                .probe("latency")
                .build_engine("e1"),
            2,
        ),
        (
            "s1",
            chaos_engine("unused", "pod-delete")
                .probe("check")
                .label("weight", "3")
                .build_schedule("s1"),
            1,
        ),
    ]
}

fn step_weights(doc: &Value, templates: &str) -> Vec<String> {
    doc.pointer(templates)
        .and_then(Value::as_array)
        .unwrap()
        .iter()
        .map(|step| step["metadata"]["labels"]["weight"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn normalizing_twice_changes_nothing_and_creates_no_new_probes() {
    for (name, manifest, provisioned) in every_kind() {
        let harness = Harness::new();

        let first = harness.run(&manifest, name).await.unwrap();
        let second = harness.run(&first.manifest, name).await.unwrap();

        assert_eq!(second.manifest, first.manifest, "{name}");
        assert_eq!(second.new_weightages, first.new_weightages, "{name}");
        assert_eq!(second.cron_syntax, first.cron_syntax, "{name}");
        assert_eq!(harness.probes.created().len(), provisioned, "{name}");
    }
}

#[tokio::test]
async fn weight_precedence_is_override_then_label_then_default_for_workflows() {
    let cases = [
        (workflow("w1"), "w1", "/spec/templates"),
        (cron_workflow("w1", "0 2 * * *"), "w1", "/spec/workflowSpec/templates"),
    ];

    for (builder, name, templates) in cases {
        let harness = Harness::new().with_override("pod-delete", 7);
        let manifest = builder
            .step("pod-delete", chaos_engine("pod-delete-", "pod-delete").probe("a"))
            .weight("3")
            .step("pod-cpu-hog", chaos_engine("pod-cpu-hog-", "pod-cpu-hog").probe("b"))
            .weight("5")
            .step("node-drain", chaos_engine("node-drain-", "node-drain").probe("c"))
            .build();

        let out = harness.run(&manifest, name).await.unwrap();

        assert_eq!(
            out.new_weightages,
            vec![
                Weightage::new("pod-cpu-hog", 5),
                Weightage::new("node-drain", 10),
            ],
            "{templates}"
        );
        assert_eq!(step_weights(&parse(&out.manifest), templates), ["7", "5", "10"]);
    }
}

#[tokio::test]
async fn weight_precedence_is_override_then_label_then_default_for_standalone_engines() {
    type Build = fn(&EngineBuilder, &str) -> String;
    let engine = || chaos_engine("unused", "pod-delete").probe("check");
    let kinds: [(&str, Build); 2] = [
        ("e1", |builder, name| builder.build_engine(name)),
        ("s1", |builder, name| builder.build_schedule(name)),
    ];

    for (name, build) in kinds {
        let overridden = Harness::new().with_override("pod-delete", 7);
        let out = overridden
            .run(&build(&engine().label("weight", "3"), name), name)
            .await
            .unwrap();
        assert!(out.new_weightages.is_empty(), "{name}");
        assert_eq!(parse(&out.manifest)["metadata"]["labels"]["weight"], "7");

        let labelled = Harness::new();
        let out = labelled
            .run(&build(&engine().label("weight", "3"), name), name)
            .await
            .unwrap();
        assert_eq!(out.new_weightages, vec![Weightage::new("pod-delete", 3)], "{name}");
        assert_eq!(parse(&out.manifest)["metadata"]["labels"]["weight"], "3");

        let defaulted = Harness::new();
        let out = defaulted.run(&build(&engine(), name), name).await.unwrap();
        assert_eq!(out.new_weightages, vec![Weightage::new("pod-delete", 10)], "{name}");
        assert_eq!(parse(&out.manifest)["metadata"]["labels"]["weight"], "10");
    }
}

#[tokio::test]
async fn multi_document_install_step_is_skipped() {
    let harness = Harness::new();
    let manifest = workflow("w1")
        .raw_step(
            "install-chaos-faults",
            "apiVersion: litmuschaos.io/v1alpha1\nkind: ChaosExperiment\n\
             metadata:\n  name: pod-delete\n---\n\
             apiVersion: litmuschaos.io/v1alpha1\nkind: ChaosExperiment\n\
             metadata:\n  name: pod-cpu-hog\n",
        )
        .step("pod-delete", chaos_engine("pod-delete-", "pod-delete").probe("a"))
        .build();

    let out = harness.run(&manifest, "w1").await.unwrap();

    assert_eq!(out.new_weightages, vec![Weightage::new("pod-delete", 10)]);
    let doc = parse(&out.manifest);
    assert!(doc.pointer("/spec/templates/0/metadata/labels/weight").is_none());
    let install = doc
        .pointer("/spec/templates/0/inputs/artifacts/0/raw/data")
        .and_then(Value::as_str)
        .unwrap();
    assert!(install.contains("pod-cpu-hog"));
    assert_eq!(harness.probes.created().len(), 1);
}

#[tokio::test]
async fn step_with_probe_ref_is_left_alone() {
    let harness = Harness::new();
    let existing = r#"[{"name":"check","mode":"SOT"}]"#;
    let manifest = workflow("w1")
        .step(
            "pod-delete",
            chaos_engine("pod-delete-", "pod-delete").probe_ref(existing),
        )
        .build();

    let out = harness.run(&manifest, "w1").await.unwrap();

    assert!(harness.probes.created().is_empty());
    let engine = artifact(&parse(&out.manifest), "/spec/templates", 0);
    assert_eq!(engine["metadata"]["annotations"]["probeRef"], existing);
}

#[tokio::test]
async fn steps_without_engines_get_no_weight() {
    let harness = Harness::new();
    let manifest = workflow("w1")
        .plain_step("custom-chaos")
        .raw_step(
            "install-experiment",
            "apiVersion: litmuschaos.io/v1alpha1\nkind: ChaosExperiment\n\
             metadata:\n  name: pod-delete\n",
        )
        .step("pod-delete", chaos_engine("pod-delete-", "pod-delete").probe("check"))
        .build();

    let out = harness.run(&manifest, "w1").await.unwrap();

    assert_eq!(out.new_weightages, vec![Weightage::new("pod-delete", 10)]);
    let doc = parse(&out.manifest);
    assert!(doc.pointer("/spec/templates/0/metadata/labels/weight").is_none());
    assert!(doc.pointer("/spec/templates/1/metadata/labels/weight").is_none());
    assert_eq!(harness.probes.created().len(), 1);
}

#[tokio::test]
async fn embedded_engine_gains_probe_ref_with_provisioned_names() {
    let harness = Harness::new();
    let manifest = workflow("w1")
        .step(
            "pod-delete",
            chaos_engine("pod-delete-", "pod-delete").probe("check").probe("latency"),
        )
        .build();

    let out = harness.run(&manifest, "w1").await.unwrap();

    let engine = artifact(&parse(&out.manifest), "/spec/templates", 0);
    let refs: Value = serde_json::from_str(
        engine["metadata"]["annotations"]["probeRef"].as_str().unwrap(),
    )
    .unwrap();
    let names: Vec<&str> = refs
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["check", "latency"]);
    assert_eq!(harness.probes.created().len(), 2);
}

#[tokio::test]
async fn cron_workflow_captures_schedule_and_labels_workflow_metadata() {
    let harness = Harness::new();
    let manifest = cron_workflow("nightly", "0 2 * * *")
        .step("pod-delete", chaos_engine("pod-delete-", "pod-delete").probe("check"))
        .build();

    let out = harness.run(&manifest, "nightly").await.unwrap();

    assert_eq!(out.kind, ManifestKind::CronWorkflow);
    assert_eq!(out.cron_syntax.as_deref(), Some("0 2 * * *"));
    let doc = parse(&out.manifest);
    assert_eq!(doc["metadata"]["labels"]["workflow_id"], "exp-1");
    assert_eq!(doc["spec"]["workflowMetadata"]["labels"]["revision_id"], "rev-1");
    assert_eq!(
        doc["spec"]["workflowSpec"]["templates"][0]["metadata"]["labels"]["weight"],
        "10"
    );
}

#[tokio::test]
async fn cron_workflow_without_schedule_is_rejected() {
    let harness = Harness::new();
    let manifest = cron_workflow("nightly", "   ")
        .step("pod-delete", chaos_engine("pod-delete-", "pod-delete").probe("check"))
        .build();

    let err = harness.run(&manifest, "nightly").await.unwrap_err();

    assert!(matches!(err, Error::Manifest(ManifestError::MissingSchedule)));
    assert!(harness.probes.created().is_empty());
}

#[tokio::test]
async fn chaos_engine_is_marked_standalone_and_weighted() {
    let harness = Harness::new();
    let manifest = chaos_engine("unused", "pod-delete")
        .probe("check")
        .build_engine("engine-1");

    let out = harness.run(&manifest, "engine-1").await.unwrap();

    assert_eq!(out.kind, ManifestKind::ChaosEngine);
    assert_eq!(out.new_weightages, vec![Weightage::new("pod-delete", 10)]);
    let doc = parse(&out.manifest);
    assert_eq!(doc["metadata"]["labels"]["type"], "standalone_workflow");
    assert_eq!(doc["metadata"]["labels"]["infra_id"], "infra-1");
    assert!(doc["metadata"]["annotations"]["probeRef"].is_string());
}

#[tokio::test]
async fn chaos_schedule_reads_engine_template_and_honors_override() {
    let harness = Harness::new().with_override("pod-delete", 2);
    let manifest = chaos_engine("unused", "pod-delete")
        .probe("check")
        .build_schedule("schedule-1");

    let out = harness.run(&manifest, "schedule-1").await.unwrap();

    assert_eq!(out.kind, ManifestKind::ChaosSchedule);
    assert!(out.new_weightages.is_empty());
    let doc = parse(&out.manifest);
    assert_eq!(doc["metadata"]["labels"]["weight"], "2");
    assert_eq!(harness.probes.created().len(), 1);
}

#[tokio::test]
async fn chaos_engine_without_probes_is_rejected() {
    let harness = Harness::new();
    let manifest = chaos_engine("unused", "pod-delete").build_engine("engine-1");

    let err = harness.run(&manifest, "engine-1").await.unwrap_err();

    assert!(matches!(err, Error::Manifest(ManifestError::NoProbes(name)) if name == "engine-1"));
}

#[tokio::test]
async fn provisioning_failure_aborts_normalization() {
    let probes = Arc::new(RecordingProbeService::failing("probe backend down"));
    let normalizer = ManifestNormalizer::new(Arc::clone(&probes));
    let manifest = workflow("w1")
        .step("pod-delete", chaos_engine("pod-delete-", "pod-delete").probe("check"))
        .build();

    let err = normalizer
        .normalize(NormalizeInput {
            manifest: &manifest,
            expected_name: "w1",
            experiment_id: &ExperimentId::new("exp-1"),
            infra_id: &InfraId::new("infra-1"),
            revision_id: &RevisionId::new("rev-1"),
            project_id: &ProjectId::new("proj-1"),
            overrides: &WeightOverrides::new(),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Probe(ProbeError::Provisioning { name, .. }) if name == "check"
    ));
    assert_eq!(probes.created().len(), 1);
}

#[tokio::test]
async fn normalized_documents_keep_kind_name_and_fault_count() {
    let harness = Harness::new();
    let cases = [
        (
            workflow("w1")
                .step("pod-delete", chaos_engine("pod-delete-", "pod-delete").probe("a"))
                .step("node-drain", chaos_engine("node-drain-", "node-drain").probe("b"))
                .build(),
            "w1",
            "/spec/templates",
        ),
        (
            cron_workflow("c1", "*/5 * * * *")
                .step("pod-delete", chaos_engine("pod-delete-", "pod-delete").probe("a"))
                .build(),
            "c1",
            "/spec/workflowSpec/templates",
        ),
        (
            chaos_engine("unused", "pod-delete").probe("a").build_engine("e1"),
            "e1",
            "/spec/experiments",
        ),
        (
            chaos_engine("unused", "pod-delete").probe("a").build_schedule("s1"),
            "s1",
            "/spec/engineTemplateSpec/experiments",
        ),
    ];

    for (manifest, name, faults) in cases {
        let before = parse(&manifest);
        let out = harness.run(&manifest, name).await.unwrap();
        let after = parse(&out.manifest);

        assert_eq!(after["kind"], before["kind"], "{name}");
        assert_eq!(after["metadata"]["name"], name);
        assert_eq!(
            after.pointer(faults).and_then(Value::as_array).map(Vec::len),
            before.pointer(faults).and_then(Value::as_array).map(Vec::len),
            "{name}"
        );
    }
}
