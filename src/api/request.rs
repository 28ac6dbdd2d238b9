use anyhow::anyhow;
use jsonschema::JSONSchema;
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::pedigree::build::SampleEdit;

/// Body of a reanalysis (or pedigree preview) request
#[derive(Debug, Deserialize, PartialEq)]
pub struct RerunRequest {
    pub sample_ids: Vec<String>,
    #[serde(default)]
    pub edits: Vec<SampleEdit>,
}

#[derive(Debug)]
pub enum RequestError {
    JSONValidationError(Vec<String>),
    DeserialisationError(String),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RequestError::JSONValidationError(errors) => write!(f, "Invalid request: {}", errors.join("; ")),
            RequestError::DeserialisationError(err) => write!(f, "Invalid request: {err}"),
        }
    }
}

/// Compiled JSON schema for request bodies
pub struct RequestSchema {
    compiled_schema: JSONSchema,
}

impl RequestSchema {
    pub fn load() -> anyhow::Result<RequestSchema> {
        /// included request schema
        static SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/schema/rerun.json"));
        let schema: Value = serde_json::from_str(SCHEMA)?;
        let compiled_schema = JSONSchema::compile(&schema)
            .map_err(|err| anyhow!("Invalid request schema: {err}"))?;

        Ok(RequestSchema { compiled_schema })
    }

    pub fn read(&self, body: Value) -> Result<RerunRequest, RequestError> {
        self.validate(&body)?;
        info!("Request is valid");
        serde_json::from_value::<RerunRequest>(body)
            .map_err(|err| RequestError::DeserialisationError(err.to_string()))
    }

    fn validate(&self, body: &Value) -> Result<(), RequestError> {
        match self.compiled_schema.validate(body) {
            Ok(_) => Ok(()),
            Err(errors) => {
                let errors: Vec<String> = errors.map(|err| err.to_string()).collect();
                warn!("Request fails validation: {}", errors.join("; "));
                Err(RequestError::JSONValidationError(errors))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::pedigree::build::Code;

    #[test]
    fn test_read_valid_request() {
        let schema = RequestSchema::load().unwrap();
        let request = schema
            .read(json!({
                "sample_ids": ["9075-18", "2112-19"],
                "edits": [{"sample_id": "9075-18", "sex": "2"}, {"sample_id": "2112-19", "phenotype": 1}]
            }))
            .unwrap();

        assert_eq!(request.sample_ids, ["9075-18", "2112-19"]);
        assert_eq!(request.edits[0].sex, Some(Code::Text("2".to_string())));
        assert_eq!(request.edits[0].phenotype, None);
        assert_eq!(request.edits[1].phenotype, Some(Code::Number(1)));
    }

    #[test]
    fn test_edits_optional() {
        let schema = RequestSchema::load().unwrap();
        let request = schema.read(json!({"sample_ids": []})).unwrap();
        assert!(request.sample_ids.is_empty());
        assert!(request.edits.is_empty());
    }

    #[test]
    fn test_invalid_requests() {
        let schema = RequestSchema::load().unwrap();
        for body in [
            json!({}),
            json!({"sample_ids": "9075-18"}),
            json!({"sample_ids": [1, 2]}),
            json!({"sample_ids": ["9075-18"], "edits": [{"sex": "2"}]}),
            json!({"sample_ids": ["9075-18"], "edits": [{"sample_id": "9075-18", "sex": [2]}]}),
            json!({"sample_ids": ["9075-18"], "extra": true}),
        ] {
            assert!(matches!(schema.read(body), Err(RequestError::JSONValidationError(_))));
        }
    }
}
