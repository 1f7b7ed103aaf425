use jsonschema::JSONSchema;
use serde_json::Value;

use crate::error::{DagError, Result};

/// included workflow request schema
static WORKFLOW_SCHEMA: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/workflow.json"));

/// Compile the embedded workflow request schema
pub fn load_schema() -> Result<JSONSchema> {
    let schema: Value = serde_json::from_str(WORKFLOW_SCHEMA)
        .map_err(|err| DagError::Request(format!("embedded schema isn't JSON: {err}")))?;
    JSONSchema::compile(&schema)
        .map_err(|err| DagError::Request(format!("embedded schema doesn't compile: {err}")))
}

/// Validate untyped JSON, collecting every violation into one error
pub fn validate(schema: &JSONSchema, json: &Value) -> Result<()> {
    schema.validate(json).map_err(|errors| {
        let reasons: Vec<String> =
            errors.map(|e| format!("{} (at '{}')", e, e.instance_path)).collect();
        DagError::Request(format!("workflow fails validation: {}", reasons.join("; ")))
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_chains_and_joins() {
        let schema = load_schema().unwrap();
        let json = json!({
            "chains": [[
                {"id": 1, "parent_id": -1, "name": "seg-1", "job_file": "1.sh",
                 "slurm_kwargs": {"--nodes": 1}, "slurm_commands": ["echo 1"]}
            ]],
            "joins": [
                {"id": 2, "parent_id": -1, "name": "features", "script_path": "f.sh",
                 "start_condition": "afterany"}
            ]
        });
        assert!(validate(&schema, &json).is_ok());
    }

    #[test]
    fn rejects_unknown_start_condition() {
        let schema = load_schema().unwrap();
        let json = json!({
            "chains": [[
                {"id": 1, "parent_id": -1, "name": "a", "script_path": "a.sh"},
                {"id": 2, "parent_id": 1, "name": "b", "script_path": "b.sh",
                 "start_condition": "afternotok"}
            ]]
        });
        assert!(matches!(validate(&schema, &json), Err(DagError::Request(_))));
    }

    #[test]
    fn accepts_none_start_condition() {
        let schema = load_schema().unwrap();
        let json = json!({
            "chains": [[
                {"id": 1, "parent_id": -1, "name": "a", "script_path": "a.sh",
                 "start_condition": "none"}
            ]],
            "joins": [
                {"id": 2, "parent_id": -1, "name": "features", "script_path": "f.sh",
                 "start_condition": null}
            ]
        });
        assert!(validate(&schema, &json).is_ok());
    }

    #[test]
    fn rejects_nested_resource_values() {
        let schema = load_schema().unwrap();
        let json = json!({
            "chains": [[
                {"id": 1, "parent_id": -1, "name": "a", "script_path": "a.sh",
                 "resource_request": {"--mem": {"gb": 10}}}
            ]]
        });
        assert!(validate(&schema, &json).is_err());
    }

    #[test]
    fn requires_a_script_path() {
        let schema = load_schema().unwrap();
        let json = json!({"chains": [[{"id": 1, "parent_id": -1, "name": "a"}]]});
        assert!(validate(&schema, &json).is_err());
    }
}
