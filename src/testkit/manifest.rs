//! Manifest builders.
//!
//! Produce the JSON text a caller would submit. Workflow steps carry their
//! chaos engine as a YAML artifact, exactly as the web console writes them.
//!
//! ```ignore
//! let manifest = workflow("w1")
//!     .step("pod-delete", chaos_engine("pod-delete-xyz", "pod-delete").probe("check"))
//!     .build();
//! ```

use serde_json::{json, Map, Value};

/// Start a `Workflow` named `name`.
pub fn workflow(name: &str) -> WorkflowBuilder {
    WorkflowBuilder::new(name, None)
}

/// Start a `CronWorkflow` named `name` running on `schedule`.
pub fn cron_workflow(name: &str, schedule: &str) -> WorkflowBuilder {
    WorkflowBuilder::new(name, Some(schedule.to_string()))
}

/// Start a chaos engine running `experiment`.
pub fn chaos_engine(generate_name: &str, experiment: &str) -> EngineBuilder {
    EngineBuilder {
        generate_name: generate_name.to_string(),
        experiment: experiment.to_string(),
        probes: Vec::new(),
        annotations: Map::new(),
        labels: Map::new(),
    }
}

/// An HTTP probe entry as written under `spec.experiments[].spec.probe`.
pub fn http_probe(name: &str) -> Value {
    json!({
        "name": name,
        "type": "httpProbe",
        "mode": "Continuous",
        "runProperties": {
            "probeTimeout": "10s",
            "interval": "2s",
            "attempt": 1,
            "probePollingInterval": "1s"
        },
        "httpProbe/inputs": {
            "url": "http://frontend.default.svc:8080",
            "insecureSkipVerify": false,
            "method": { "get": { "criteria": "==", "responseCode": "200" } }
        }
    })
}

/// Builder for `Workflow` and `CronWorkflow` documents.
#[derive(Debug, Clone)]
pub struct WorkflowBuilder {
    name: String,
    schedule: Option<String>,
    labels: Map<String, Value>,
    templates: Vec<Value>,
}

impl WorkflowBuilder {
    fn new(name: &str, schedule: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            schedule,
            labels: Map::new(),
            templates: Vec::new(),
        }
    }

    /// Add a step whose artifact is a chaos engine.
    #[must_use]
    pub fn step(self, name: &str, engine: EngineBuilder) -> Self {
        let data = engine.to_yaml();
        self.raw_step(name, &data)
    }

    /// Add a step whose artifact carries arbitrary YAML.
    #[must_use]
    pub fn raw_step(mut self, name: &str, data: &str) -> Self {
        self.templates.push(json!({
            "name": name,
            "inputs": {
                "artifacts": [{
                    "name": name,
                    "path": format!("/tmp/{name}.yaml"),
                    "raw": { "data": data }
                }]
            },
            "container": {
                "image": "litmuschaos/k8s:latest",
                "args": ["-file=/tmp/chaosengine.yaml"]
            }
        }));
        self
    }

    /// Add a step without artifacts.
    #[must_use]
    pub fn plain_step(mut self, name: &str) -> Self {
        self.templates.push(json!({
            "name": name,
            "container": { "image": "litmuschaos/k8s:latest" }
        }));
        self
    }

    /// Set the weight label on the most recently added step.
    #[must_use]
    pub fn weight(mut self, weight: &str) -> Self {
        if let Some(step) = self.templates.last_mut() {
            step["metadata"]["labels"]["weight"] = Value::String(weight.to_string());
        }
        self
    }

    /// Set a root label.
    #[must_use]
    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.labels
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Render the document as JSON text.
    pub fn build(self) -> String {
        self.to_value().to_string()
    }

    pub fn to_value(self) -> Value {
        let templates = Value::Array(self.templates);
        match self.schedule {
            None => json!({
                "apiVersion": "argoproj.io/v1alpha1",
                "kind": "Workflow",
                "metadata": { "name": self.name, "namespace": "litmus", "labels": self.labels },
                "spec": { "entrypoint": "custom-chaos", "templates": templates }
            }),
            Some(schedule) => json!({
                "apiVersion": "argoproj.io/v1alpha1",
                "kind": "CronWorkflow",
                "metadata": { "name": self.name, "namespace": "litmus", "labels": self.labels },
                "spec": {
                    "schedule": schedule,
                    "concurrencyPolicy": "Forbid",
                    "workflowSpec": { "entrypoint": "custom-chaos", "templates": templates }
                }
            }),
        }
    }
}

/// Builder for a chaos engine, either embedded in a workflow step or as a
/// standalone `ChaosEngine` / `ChaosSchedule` document.
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    generate_name: String,
    experiment: String,
    probes: Vec<Value>,
    annotations: Map<String, Value>,
    labels: Map<String, Value>,
}

impl EngineBuilder {
    /// Declare an HTTP probe on the experiment.
    #[must_use]
    pub fn probe(self, name: &str) -> Self {
        self.probe_value(http_probe(name))
    }

    /// Declare an arbitrary probe entry on the experiment.
    #[must_use]
    pub fn probe_value(mut self, probe: Value) -> Self {
        self.probes.push(probe);
        self
    }

    /// Set the `probeRef` annotation verbatim.
    #[must_use]
    pub fn probe_ref(mut self, raw: &str) -> Self {
        self.annotations
            .insert("probeRef".to_string(), Value::String(raw.to_string()));
        self
    }

    /// Set a metadata label.
    #[must_use]
    pub fn label(mut self, key: &str, value: &str) -> Self {
        self.labels
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    fn experiments(&self) -> Value {
        let mut spec = json!({
            "components": { "env": [{ "name": "TOTAL_CHAOS_DURATION", "value": "30" }] }
        });
        if !self.probes.is_empty() {
            spec["probe"] = Value::Array(self.probes.clone());
        }
        json!([{ "name": self.experiment, "spec": spec }])
    }

    fn metadata(&self, name: Option<&str>) -> Value {
        let mut metadata = json!({
            "namespace": "{{workflow.parameters.adminModeNamespace}}",
            "labels": self.labels,
        });
        match name {
            Some(name) => metadata["name"] = Value::String(name.to_string()),
            None => metadata["generateName"] = Value::String(self.generate_name.clone()),
        }
        if !self.annotations.is_empty() {
            metadata["annotations"] = Value::Object(self.annotations.clone());
        }
        metadata
    }

    /// The engine as embedded YAML, the way workflow artifacts carry it.
    pub fn to_yaml(&self) -> String {
        let engine = json!({
            "apiVersion": "litmuschaos.io/v1alpha1",
            "kind": "ChaosEngine",
            "metadata": self.metadata(None),
            "spec": {
                "engineState": "active",
                "chaosServiceAccount": "litmus-admin",
                "experiments": self.experiments()
            }
        });
        serde_yaml::to_string(&engine).unwrap_or_default()
    }

    /// Standalone `ChaosEngine` document named `name`.
    pub fn build_engine(&self, name: &str) -> String {
        json!({
            "apiVersion": "litmuschaos.io/v1alpha1",
            "kind": "ChaosEngine",
            "metadata": self.metadata(Some(name)),
            "spec": {
                "engineState": "active",
                "chaosServiceAccount": "litmus-admin",
                "experiments": self.experiments()
            }
        })
        .to_string()
    }

    /// Standalone `ChaosSchedule` document named `name`.
    pub fn build_schedule(&self, name: &str) -> String {
        json!({
            "apiVersion": "litmuschaos.io/v1alpha1",
            "kind": "ChaosSchedule",
            "metadata": self.metadata(Some(name)),
            "spec": {
                "schedule": {
                    "repeat": {
                        "properties": { "minChaosInterval": { "minute": { "everyNthMinute": 5 } } }
                    }
                },
                "engineTemplateSpec": {
                    "engineState": "active",
                    "experiments": self.experiments()
                }
            }
        })
        .to_string()
    }
}
