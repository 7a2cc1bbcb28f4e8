//! JSON:API lint support for OpenAPI documents
//!
//! Dereferences OpenAPI documents so that JSONPath-based lint rules can see
//! a fully inlined tree, and ships the JSON:API v1.0 rule table that checks
//! `application/vnd.api+json` schemas (resource objects, attributes, member
//! names and error objects).
//!
//! # Example
//!
//! ```
//! use jsonapi_lint::{dereference, RefOptions};
//! use serde_json::json;
//!
//! let mut doc = json!({
//!     "paths": {
//!         "/articles": {
//!             "get": { "schema": { "$ref": "#/components/schemas/Article" } }
//!         }
//!     },
//!     "components": {
//!         "schemas": {
//!             "Article": { "type": "object" }
//!         }
//!     }
//! });
//!
//! dereference(&mut doc, &RefOptions::default()).unwrap();
//!
//! // The reference is inlined and the consumed definition is dropped
//! assert_eq!(doc["paths"]["/articles"]["get"]["schema"]["type"], "object");
//! assert!(doc["components"]["schemas"].get("Article").is_none());
//! ```
//!
//! # Reference errors
//!
//! | Error | Cause |
//! |-------|-------|
//! | `UnresolvableReference` | A key or index on the pointer path is absent |
//! | `InvalidReferencePath` | A pointer segment is looked up on a scalar or null |
//! | `CircularReference` | A pointer closes back on a target still being resolved |
//!
//! Resolution is all-or-nothing: the first error aborts the call.

mod error;
mod linter;
mod loader;
mod pointer;
mod resolver;
mod ruleset;
mod types;
mod validator;

pub use error::{ResolveError, RulesetError, SchemaError};
pub use linter::{
    lint, lint_document, lint_file, Diagnostic, FileResult, FileStatus, LintResult,
    JSONAPI_MEDIA_TYPE,
};
pub use loader::{
    is_url, load_document, load_document_auto, load_document_str, DocumentFormat,
};
pub use pointer::navigate;
pub use resolver::{dereference, prune_consumed, resolve, resolve_refs, Resolution};
pub use ruleset::{
    jsonapi_ruleset, load_ruleset, AssertionFunction, Rule, RuleAction, Ruleset, Severity, Then,
};
pub use types::{CyclePolicy, Node, RefOptions, DEFAULT_DEFINITIONS_PREFIX, REF_KEY};
pub use validator::{validate_against_schema, validate_ruleset, RULESET_SCHEMA};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
