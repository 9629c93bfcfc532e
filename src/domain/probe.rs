//! Probe model.
//!
//! A [`ProbeSpec`] is the probe as written inside a chaos engine manifest.
//! A [`ProbeRequest`] is the canonical creation request understood by the
//! probe subsystem, and a [`ProbeRef`] is what ends up in the manifest's
//! `probeRef` annotation once the probe exists.

use serde::{Deserialize, Serialize};

use super::id::ProjectId;

/// Probe family, as named in manifests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProbeType {
    Http,
    Cmd,
    Prom,
    K8s,
    /// A family this control plane does not know yet.
    Other(String),
}

impl ProbeType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Http => "httpProbe",
            Self::Cmd => "cmdProbe",
            Self::Prom => "promProbe",
            Self::K8s => "k8sProbe",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for ProbeType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "httpProbe" => Self::Http,
            "cmdProbe" => Self::Cmd,
            "promProbe" => Self::Prom,
            "k8sProbe" => Self::K8s,
            _ => Self::Other(s),
        }
    }
}

impl From<ProbeType> for String {
    fn from(t: ProbeType) -> Self {
        t.as_str().to_string()
    }
}

impl Default for ProbeType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

/// Probe attributes as declared under `spec.experiments[].spec.probe`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProbeSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub probe_type: ProbeType,
    pub mode: String,
    pub run_properties: RunProperties,
    #[serde(rename = "httpProbe/inputs")]
    pub http_inputs: Option<HttpProbeInputs>,
    #[serde(rename = "cmdProbe/inputs")]
    pub cmd_inputs: Option<CmdProbeInputs>,
    #[serde(rename = "promProbe/inputs")]
    pub prom_inputs: Option<PromProbeInputs>,
    #[serde(rename = "k8sProbe/inputs")]
    pub k8s_inputs: Option<K8sProbeInputs>,
}

/// Timing and retry behaviour shared by every probe family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RunProperties {
    pub probe_timeout: String,
    pub interval: String,
    pub attempt: i32,
    pub retry: i32,
    pub probe_polling_interval: String,
    pub initial_delay: String,
    pub evaluation_timeout: String,
    pub stop_on_failure: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpProbeInputs {
    pub url: String,
    pub insecure_skip_verify: bool,
    pub method: HttpMethodInputs,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpMethodInputs {
    pub get: Option<HttpGetInputs>,
    pub post: Option<HttpPostInputs>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpGetInputs {
    pub criteria: String,
    pub response_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpPostInputs {
    pub content_type: String,
    pub body: String,
    pub body_path: String,
    pub criteria: String,
    pub response_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comparator {
    #[serde(rename = "type")]
    pub comparator_type: String,
    pub criteria: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CmdProbeInputs {
    pub command: String,
    pub comparator: Comparator,
    /// Optional pod template the command runs in; kept opaque.
    pub source: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PromProbeInputs {
    pub endpoint: String,
    pub query: String,
    pub query_path: String,
    pub comparator: Comparator,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct K8sProbeInputs {
    pub group: String,
    pub version: String,
    pub resource: String,
    pub resource_names: String,
    pub namespace: String,
    pub field_selector: String,
    pub label_selector: String,
    pub operation: String,
}

/// HTTP method of an HTTP probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum HttpMethod {
    Get {
        criteria: String,
        response_code: String,
    },
    Post {
        criteria: String,
        response_code: String,
        content_type: String,
        body: String,
        body_path: String,
    },
}

/// Family-specific probe configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ProbeProperties {
    Http {
        url: String,
        method: Option<HttpMethod>,
        insecure_skip_verify: bool,
    },
    Cmd {
        command: String,
        comparator: Comparator,
        /// JSON-encoded source pod template.
        source: Option<String>,
    },
    Prom {
        endpoint: String,
        query: String,
        query_path: String,
        comparator: Comparator,
    },
    K8s {
        group: String,
        version: String,
        resource: String,
        resource_names: String,
        namespace: String,
        field_selector: String,
        label_selector: String,
        operation: String,
    },
    /// Unrecognized family.
    Empty,
}

/// Canonical probe creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub name: String,
    pub probe_type: ProbeType,
    pub run_properties: RunProperties,
    pub properties: ProbeProperties,
    pub infrastructure_type: String,
    pub tags: Vec<String>,
}

/// A probe created by the probe subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub probe_id: String,
    pub name: String,
    pub project_id: ProjectId,
    pub probe_type: ProbeType,
}

/// Entry of the `probeRef` annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeRef {
    pub name: String,
    pub mode: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_type_from_manifest_names() {
        assert_eq!(ProbeType::from("httpProbe".to_string()), ProbeType::Http);
        assert_eq!(ProbeType::from("cmdProbe".to_string()), ProbeType::Cmd);
        assert_eq!(ProbeType::from("promProbe".to_string()), ProbeType::Prom);
        assert_eq!(ProbeType::from("k8sProbe".to_string()), ProbeType::K8s);
        assert_eq!(
            ProbeType::from("sloProbe".to_string()),
            ProbeType::Other("sloProbe".into())
        );
    }

    #[test]
    fn probe_spec_reads_slash_keyed_inputs() {
        let spec: ProbeSpec = serde_json::from_value(serde_json::json!({
            "name": "check-frontend",
            "type": "httpProbe",
            "mode": "Continuous",
            "runProperties": { "probeTimeout": "10s", "interval": "2s", "attempt": 3 },
            "httpProbe/inputs": {
                "url": "http://frontend:8080",
                "method": { "get": { "criteria": "==", "responseCode": "200" } }
            }
        }))
        .unwrap();

        assert_eq!(spec.probe_type, ProbeType::Http);
        assert_eq!(spec.run_properties.attempt, 3);
        let http = spec.http_inputs.unwrap();
        assert_eq!(http.method.get.unwrap().response_code, "200");
    }

    #[test]
    fn probe_ref_serializes_name_and_mode() {
        let refs = vec![ProbeRef {
            name: "check".into(),
            mode: "SOT".into(),
        }];
        assert_eq!(
            serde_json::to_string(&refs).unwrap(),
            r#"[{"name":"check","mode":"SOT"}]"#
        );
    }
}
