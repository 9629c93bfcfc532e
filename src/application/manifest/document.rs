//! Helpers over the outer (JSON) manifest document.

use serde_json::{Map, Value};

use crate::domain::error::ManifestError;
use crate::domain::manifest::OrchestrationLabels;

pub(crate) type Object = Map<String, Value>;

/// `kind` and `metadata.name` of a manifest root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub kind: String,
    pub name: String,
}

/// Parse the outer manifest. The root must be an object.
pub(crate) fn parse(manifest: &str) -> Result<Value, ManifestError> {
    let doc: Value = serde_json::from_str(manifest).map_err(|e| ManifestError::Parse {
        what: "manifest",
        reason: e.to_string(),
    })?;
    if !doc.is_object() {
        return Err(ManifestError::Parse {
            what: "manifest",
            reason: "document root is not an object".into(),
        });
    }
    Ok(doc)
}

pub(crate) fn serialize(doc: &Value) -> Result<String, ManifestError> {
    serde_json::to_string(doc).map_err(|e| ManifestError::Serialize {
        what: "manifest",
        reason: e.to_string(),
    })
}

pub(crate) fn header(doc: &Value) -> Header {
    let text = |pointer: &str| {
        doc.pointer(pointer)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Header {
        kind: text("/kind"),
        name: text("/metadata/name"),
    }
}

/// Child object under `key`, created when absent or null.
pub(crate) fn child<'a>(
    parent: &'a mut Object,
    key: &str,
    what: &'static str,
) -> Result<&'a mut Object, ManifestError> {
    let entry = parent.entry(key.to_string()).or_insert(Value::Null);
    if entry.is_null() {
        *entry = Value::Object(Map::new());
    }
    entry.as_object_mut().ok_or_else(|| ManifestError::Parse {
        what,
        reason: format!("'{key}' is not an object"),
    })
}

/// Object at a JSON pointer, creating the final path segments when absent.
pub(crate) fn object_at<'a>(
    doc: &'a mut Value,
    path: &[&str],
    what: &'static str,
) -> Result<&'a mut Object, ManifestError> {
    let mut current = doc.as_object_mut().ok_or_else(|| ManifestError::Parse {
        what,
        reason: "document root is not an object".into(),
    })?;
    for key in path {
        current = child(current, key, what)?;
    }
    Ok(current)
}

/// Array at a JSON pointer; a missing array reads as empty.
pub(crate) fn array_at<'a>(doc: &'a mut Value, pointer: &str) -> &'a mut [Value] {
    match doc.pointer_mut(pointer) {
        Some(Value::Array(items)) => items.as_mut_slice(),
        _ => &mut [],
    }
}

/// Write labels into a label map, overwriting existing keys.
pub(crate) fn stamp(labels: &mut Object, orchestration: &OrchestrationLabels) {
    for (key, value) in orchestration.iter() {
        labels.insert(key.to_string(), Value::String(value.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::{ExperimentId, InfraId, RevisionId};
    use crate::domain::manifest::ManifestKind;
    use serde_json::json;

    #[test]
    fn parse_rejects_non_objects() {
        assert!(parse("[1, 2]").is_err());
        assert!(parse("not json").is_err());
        assert!(parse(r#"{"kind": "Workflow"}"#).is_ok());
    }

    #[test]
    fn header_reads_kind_and_name() {
        let doc = json!({ "kind": "Workflow", "metadata": { "name": "w1" } });
        assert_eq!(
            header(&doc),
            Header {
                kind: "Workflow".into(),
                name: "w1".into()
            }
        );
        assert_eq!(header(&json!({})).name, "");
    }

    #[test]
    fn object_at_creates_missing_levels() {
        let mut doc = json!({ "metadata": null });
        object_at(&mut doc, &["metadata", "labels"], "manifest")
            .unwrap()
            .insert("a".into(), json!("b"));
        assert_eq!(doc, json!({ "metadata": { "labels": { "a": "b" } } }));
    }

    #[test]
    fn object_at_refuses_scalars() {
        let mut doc = json!({ "metadata": "oops" });
        assert!(object_at(&mut doc, &["metadata", "labels"], "manifest").is_err());
    }

    #[test]
    fn array_at_missing_is_empty() {
        let mut doc = json!({ "spec": {} });
        assert!(array_at(&mut doc, "/spec/templates").is_empty());
    }

    #[test]
    fn stamp_overwrites_without_touching_other_labels() {
        let mut labels = Object::new();
        labels.insert("team".into(), json!("sre"));
        labels.insert("revision_id".into(), json!("old"));
        let orchestration = OrchestrationLabels::new(
            ManifestKind::Workflow,
            &ExperimentId::new("e1"),
            &InfraId::new("i1"),
            &RevisionId::new("r2"),
        );

        stamp(&mut labels, &orchestration);

        assert_eq!(labels["team"], "sre");
        assert_eq!(labels["revision_id"], "r2");
        assert_eq!(labels["workflows.argoproj.io/controller-instanceid"], "i1");
        assert_eq!(labels.len(), 5);
    }
}
