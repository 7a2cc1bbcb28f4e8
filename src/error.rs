//! Error types for document loading, reference resolution and rulesets.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading a document or resolving its `$ref` pointers.
#[derive(Debug, Error)]
pub enum ResolveError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },

    // Reference errors (exit code 2)
    #[error("unresolvable reference {pointer}: nothing defined at that location")]
    UnresolvableReference { pointer: String },

    #[error("invalid reference path {pointer}: cannot traverse \"{segment}\" on {actual}")]
    InvalidReferencePath {
        pointer: String,
        segment: String,
        actual: String,
    },

    #[error("circular reference {pointer}: target is still being resolved")]
    CircularReference { pointer: String },
}

impl ResolveError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ResolveError::FileNotFound { .. } | ResolveError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            ResolveError::NetworkError { .. } => 3,
            _ => 2,
        }
    }

    /// The pointer involved, for reference errors.
    pub fn pointer(&self) -> Option<&str> {
        match self {
            ResolveError::UnresolvableReference { pointer }
            | ResolveError::InvalidReferencePath { pointer, .. }
            | ResolveError::CircularReference { pointer } => Some(pointer),
            _ => None,
        }
    }
}

/// Errors while loading or selecting rules from a ruleset.
#[derive(Debug, Error)]
pub enum RulesetError {
    #[error(transparent)]
    Load(#[from] ResolveError),

    #[error("ruleset is invalid with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },

    #[error("malformed ruleset: {source}")]
    Malformed {
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown rule \"{name}\"")]
    UnknownRule { name: String },
}

impl RulesetError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RulesetError::Load(e) => e.exit_code(),
            RulesetError::Invalid { .. } => 1,
            RulesetError::Malformed { .. } | RulesetError::UnknownRule { .. } => 2,
        }
    }
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_error_exit_codes() {
        let err = ResolveError::FileNotFound {
            path: PathBuf::from("openapi.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = ResolveError::UnresolvableReference {
            pointer: "#/does/not/exist".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = ResolveError::CircularReference {
            pointer: "#/a".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn ruleset_error_exit_codes() {
        let err = RulesetError::Invalid {
            errors: vec![SchemaError {
                path: "/rules/foo/severity".into(),
                message: "\"loud\" is not one of the allowed values".into(),
            }],
        };
        assert_eq!(err.exit_code(), 1);

        let err = RulesetError::UnknownRule {
            name: "nope".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = RulesetError::Load(ResolveError::FileNotFound {
            path: PathBuf::from("rules.json"),
        });
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn reference_errors_expose_pointer() {
        let err = ResolveError::InvalidReferencePath {
            pointer: "#/a/b".into(),
            segment: "b".into(),
            actual: "string".into(),
        };
        assert_eq!(err.pointer(), Some("#/a/b"));
        assert_eq!(
            err.to_string(),
            "invalid reference path #/a/b: cannot traverse \"b\" on string"
        );

        let err = ResolveError::FileNotFound {
            path: PathBuf::from("x.json"),
        };
        assert_eq!(err.pointer(), None);
    }

    #[test]
    fn schema_error_display() {
        let err = SchemaError {
            path: "/rules/jsonapi-error-object/then".into(),
            message: "\"function\" is a required property".into(),
        };
        assert_eq!(
            err.to_string(),
            "/rules/jsonapi-error-object/then: \"function\" is a required property"
        );
    }
}
