//! Probe provisioning.
//!
//! Translates probe specs found in chaos engine manifests into canonical
//! creation requests and creates them through the probe subsystem. One
//! probe is created per spec, per call.

use std::sync::Arc;

use tracing::debug;

use crate::domain::id::ProjectId;
use crate::domain::probe::{
    HttpMethod, HttpMethodInputs, ProbeProperties, ProbeRef, ProbeRequest, ProbeSpec, ProbeType,
};
use crate::error::{Error, ProbeError, Result};
use crate::port::outbound::probe::ProbeService;

/// Infrastructure type stamped on every provisioned probe.
pub const INFRASTRUCTURE_TYPE: &str = "Kubernetes";

impl From<&ProbeSpec> for ProbeRequest {
    fn from(spec: &ProbeSpec) -> Self {
        Self {
            name: spec.name.clone(),
            probe_type: spec.probe_type.clone(),
            run_properties: spec.run_properties.clone(),
            properties: properties(spec),
            infrastructure_type: INFRASTRUCTURE_TYPE.to_string(),
            tags: Vec::new(),
        }
    }
}

/// Family-specific configuration. Unknown families map to
/// [`ProbeProperties::Empty`].
fn properties(spec: &ProbeSpec) -> ProbeProperties {
    match spec.probe_type {
        ProbeType::Http => {
            let inputs = spec.http_inputs.clone().unwrap_or_default();
            ProbeProperties::Http {
                url: inputs.url,
                method: http_method(inputs.method),
                insecure_skip_verify: inputs.insecure_skip_verify,
            }
        }
        ProbeType::Cmd => {
            let inputs = spec.cmd_inputs.clone().unwrap_or_default();
            ProbeProperties::Cmd {
                command: inputs.command,
                comparator: inputs.comparator,
                source: inputs.source.map(|source| source.to_string()),
            }
        }
        ProbeType::Prom => {
            let inputs = spec.prom_inputs.clone().unwrap_or_default();
            ProbeProperties::Prom {
                endpoint: inputs.endpoint,
                query: inputs.query,
                query_path: inputs.query_path,
                comparator: inputs.comparator,
            }
        }
        ProbeType::K8s => {
            let inputs = spec.k8s_inputs.clone().unwrap_or_default();
            ProbeProperties::K8s {
                group: inputs.group,
                version: inputs.version,
                resource: inputs.resource,
                resource_names: inputs.resource_names,
                namespace: inputs.namespace,
                field_selector: inputs.field_selector,
                label_selector: inputs.label_selector,
                operation: inputs.operation,
            }
        }
        ProbeType::Other(_) => ProbeProperties::Empty,
    }
}

/// GET wins when both methods are declared.
fn http_method(inputs: HttpMethodInputs) -> Option<HttpMethod> {
    if let Some(get) = inputs.get {
        return Some(HttpMethod::Get {
            criteria: get.criteria,
            response_code: get.response_code,
        });
    }
    inputs.post.map(|post| HttpMethod::Post {
        criteria: post.criteria,
        response_code: post.response_code,
        content_type: post.content_type,
        body: post.body,
        body_path: post.body_path,
    })
}

/// Creates probes for the specs of one chaos engine fragment.
pub struct ProbeProvisioner<P> {
    service: Arc<P>,
}

impl<P> Clone for ProbeProvisioner<P> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<P: ProbeService> ProbeProvisioner<P> {
    pub fn new(service: Arc<P>) -> Self {
        Self { service }
    }

    /// Create one probe per spec and return the `probeRef` entries, in order.
    ///
    /// Stops at the first failure; probes created before it are not rolled
    /// back.
    ///
    /// # Errors
    /// Returns [`ProbeError::Provisioning`] naming the failing probe.
    pub async fn provision(
        &self,
        specs: &[ProbeSpec],
        project_id: &ProjectId,
    ) -> Result<Vec<ProbeRef>> {
        let mut refs = Vec::with_capacity(specs.len());
        for spec in specs {
            let request = ProbeRequest::from(spec);
            let probe = self
                .service
                .add_probe(request, project_id)
                .await
                .map_err(|e| provisioning_error(&spec.name, e))?;
            debug!(
                probe = %probe.name,
                probe_type = %probe.probe_type.as_str(),
                project_id = %project_id,
                "Probe provisioned"
            );
            refs.push(ProbeRef {
                name: probe.name,
                mode: spec.mode.clone(),
            });
        }
        Ok(refs)
    }
}

fn provisioning_error(name: &str, err: Error) -> Error {
    match err {
        Error::Probe(e) => Error::Probe(e),
        other => ProbeError::Provisioning {
            name: name.to_string(),
            reason: other.to_string(),
        }
        .into(),
    }
}
