//! Core types for reference resolution.

use serde_json::{Map, Value};

/// Reserved key marking a Reference Node.
pub const REF_KEY: &str = "$ref";

/// Pointer prefix of the OpenAPI shared-definitions subtree.
pub const DEFAULT_DEFINITIONS_PREFIX: &str = "#/components/";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A document value, discriminated before the resolver dispatches on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    /// A mapping whose `$ref` is a string pointer.
    Reference(&'a str),
    Mapping(&'a Map<String, Value>),
    Sequence(&'a [Value]),
    Scalar(&'a Value),
}

impl<'a> Node<'a> {
    /// Classify a value.
    ///
    /// A mapping is only a Reference Node when `$ref` holds a string; a
    /// non-string `$ref` (for example a property literally named `$ref`)
    /// leaves it a plain mapping.
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => match map.get(REF_KEY) {
                Some(Value::String(pointer)) => Node::Reference(pointer),
                _ => Node::Mapping(map),
            },
            Value::Array(items) => Node::Sequence(items),
            other => Node::Scalar(other),
        }
    }
}

/// What to do when a pointer closes back on a target still being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePolicy {
    /// Fail with `ResolveError::CircularReference`.
    #[default]
    Error,
    /// Leave the Reference Node in place so the output stays finite.
    Preserve,
}

/// Options for reference resolution.
#[derive(Debug, Clone)]
pub struct RefOptions {
    /// Pointers starting with this prefix are consumed definitions.
    pub definitions_prefix: String,
    /// Whether consumed definitions are pruned after resolution.
    pub prune: bool,
    pub on_cycle: CyclePolicy,
}

impl Default for RefOptions {
    fn default() -> Self {
        Self {
            definitions_prefix: DEFAULT_DEFINITIONS_PREFIX.to_string(),
            prune: true,
            on_cycle: CyclePolicy::Error,
        }
    }
}

impl RefOptions {
    /// Options with the OpenAPI `#/components/` prefix, pruning on, and
    /// cycles reported as errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shared-definitions prefix.
    ///
    /// A missing leading `#/` is added, and a trailing `/` is enforced so
    /// `#/components` does not match `#/componentsExtra`.
    pub fn definitions_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_start_matches('#').trim_matches('/');
        self.definitions_prefix = format!("#/{}/", trimmed);
        self
    }

    /// Enable or disable pruning of consumed definitions.
    pub fn prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    pub fn on_cycle(mut self, policy: CyclePolicy) -> Self {
        self.on_cycle = policy;
        self
    }

    /// Whether `pointer` lies inside the shared-definitions subtree.
    pub fn is_definition(&self, pointer: &str) -> bool {
        pointer.starts_with(&self.definitions_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_reference_node() {
        let value = json!({ "$ref": "#/a/b" });
        assert_eq!(Node::classify(&value), Node::Reference("#/a/b"));
    }

    #[test]
    fn classify_non_string_ref_is_mapping() {
        let value = json!({ "$ref": { "type": "string" } });
        assert!(matches!(Node::classify(&value), Node::Mapping(_)));
    }

    #[test]
    fn classify_sequence_and_scalars() {
        let seq = json!([1, 2]);
        assert!(matches!(Node::classify(&seq), Node::Sequence(items) if items.len() == 2));

        for scalar in [json!(null), json!(true), json!(1.5), json!("x")] {
            assert!(matches!(Node::classify(&scalar), Node::Scalar(_)));
        }
    }

    #[test]
    fn definitions_prefix_is_normalized() {
        let opts = RefOptions::new().definitions_prefix("definitions");
        assert_eq!(opts.definitions_prefix, "#/definitions/");

        let opts = RefOptions::new().definitions_prefix("#/components/schemas");
        assert_eq!(opts.definitions_prefix, "#/components/schemas/");
        assert!(opts.is_definition("#/components/schemas/Foo"));
        assert!(!opts.is_definition("#/components/responses/Foo"));
    }

    #[test]
    fn default_prefix_does_not_match_lookalikes() {
        let opts = RefOptions::default();
        assert!(opts.is_definition("#/components/schemas/Foo"));
        assert!(!opts.is_definition("#/componentsExtra/Foo"));
        assert!(!opts.is_definition("#/paths/~1users"));
    }

    #[test]
    fn json_type_names() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!([])), "array");
        assert_eq!(json_type_name(&json!({})), "object");
    }
}
