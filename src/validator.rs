//! Structural validation of rule configuration documents.

use serde_json::Value;

use crate::error::{RulesetError, SchemaError};

/// JSON Schema every ruleset document must satisfy.
pub const RULESET_SCHEMA: &str = include_str!("../rulesets/ruleset.schema.json");

/// Validate a ruleset document against [`RULESET_SCHEMA`].
///
/// # Errors
///
/// Returns `RulesetError::Invalid` listing every violation.
pub fn validate_ruleset(document: &Value) -> Result<(), RulesetError> {
    let schema: Value =
        serde_json::from_str(RULESET_SCHEMA).map_err(|source| RulesetError::Malformed { source })?;
    validate_against_schema(&schema, document)
}

/// Validate an instance against an arbitrary JSON Schema.
pub fn validate_against_schema(schema: &Value, instance: &Value) -> Result<(), RulesetError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| RulesetError::Invalid {
        errors: vec![SchemaError {
            path: e.schema_path.to_string(),
            message: format!("invalid schema: {}", e),
        }],
    })?;

    let errors: Vec<SchemaError> = validator
        .iter_errors(instance)
        .map(|e| SchemaError {
            path: e.instance_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(RulesetError::Invalid { errors })
    }
}
