//! Lint rule configuration objects.
//!
//! A ruleset maps rule names to declarative rules: a JSONPath selector
//! (`given`) plus one or more assertions (`then`) naming an assertion
//! function. Rules are data here; they are evaluated by an external lint
//! engine against a document that has already been dereferenced with
//! [`crate::dereference`].
//!
//! # Format
//!
//! ```json
//! {
//!   "rules": {
//!     "jsonapi-resource-object-type": {
//!       "description": "A resource object MUST contain a type member.",
//!       "message": "Resource object schema is missing type",
//!       "severity": "error",
//!       "given": "$..content['application/vnd.api+json'].schema.properties.data.properties",
//!       "then": { "field": "type", "function": "truthy" }
//!     }
//!   }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::RulesetError;
use crate::loader::load_document;
use crate::validator::validate_ruleset;

/// JSON:API v1.0 rules for `application/vnd.api+json` schemas.
const JSONAPI_RULESET: &str = include_str!("../rulesets/jsonapi.json");

/// Severity reported for a rule violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "SeverityRepr")]
pub enum Severity {
    Error,
    Warn,
    Info,
    Hint,
}

impl Severity {
    /// Parse a severity name.
    ///
    /// Returns `None` for unknown values (caller should error).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "error" => Some(Severity::Error),
            "warn" => Some(Severity::Warn),
            "info" => Some(Severity::Info),
            "hint" => Some(Severity::Hint),
            _ => None,
        }
    }

    /// Numeric level, 0 (error) to 3 (hint).
    pub fn level(&self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warn => 1,
            Severity::Info => 2,
            Severity::Hint => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warn => "warn",
            Severity::Info => "info",
            Severity::Hint => "hint",
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeverityRepr {
    Name(String),
    Level(u8),
}

impl TryFrom<SeverityRepr> for Severity {
    type Error = String;

    fn try_from(repr: SeverityRepr) -> Result<Self, String> {
        match repr {
            SeverityRepr::Name(name) => {
                Severity::parse(&name).ok_or_else(|| format!("unknown severity \"{}\"", name))
            }
            SeverityRepr::Level(0) => Ok(Severity::Error),
            SeverityRepr::Level(1) => Ok(Severity::Warn),
            SeverityRepr::Level(2) => Ok(Severity::Info),
            SeverityRepr::Level(3) => Ok(Severity::Hint),
            SeverityRepr::Level(n) => Err(format!("severity level {} out of range 0..=3", n)),
        }
    }
}

/// Assertion primitives a rule may apply to the selected nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionFunction {
    Enumeration,
    Pattern,
    Falsy,
    Truthy,
    Schema,
    Length,
}

/// One assertion in a rule's `then` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAction {
    /// Member of the selected node to assert on; `@key` means the key itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub function: AssertionFunction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_options: Option<Value>,
}

/// A `then` clause: a single action or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Then {
    One(RuleAction),
    Many(Vec<RuleAction>),
}

impl Then {
    pub fn actions(&self) -> &[RuleAction] {
        match self {
            Then::One(action) => std::slice::from_ref(action),
            Then::Many(actions) => actions,
        }
    }
}

/// A declarative lint rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub description: String,
    pub message: String,
    pub severity: Severity,
    /// JSONPath selector.
    pub given: String,
    pub then: Then,
    /// Whether the rule is enabled when the ruleset is loaded.
    #[serde(default = "default_recommended")]
    pub recommended: bool,
}

fn default_recommended() -> bool {
    true
}

/// A named set of rules with per-rule enablement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    pub rules: BTreeMap<String, Rule>,
    #[serde(skip)]
    enabled: BTreeSet<String>,
}

impl Ruleset {
    /// Build a ruleset from a parsed document.
    ///
    /// Recommended rules start enabled.
    ///
    /// # Errors
    ///
    /// `RulesetError::Invalid` if the document does not match the ruleset
    /// schema, `Malformed` if it cannot be mapped onto the rule types.
    pub fn from_value(document: Value) -> Result<Self, RulesetError> {
        validate_ruleset(&document)?;
        let mut ruleset: Ruleset =
            serde_json::from_value(document).map_err(|source| RulesetError::Malformed { source })?;
        ruleset.enabled = ruleset
            .rules
            .iter()
            .filter(|(_, rule)| rule.recommended)
            .map(|(name, _)| name.clone())
            .collect();
        debug!(
            rules = ruleset.rules.len(),
            enabled = ruleset.enabled.len(),
            "loaded ruleset"
        );
        Ok(ruleset)
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.contains(name)
    }

    /// Enable a rule by name.
    pub fn enable(&mut self, name: &str) -> Result<(), RulesetError> {
        self.check_known(name)?;
        self.enabled.insert(name.to_string());
        Ok(())
    }

    /// Disable a rule by name.
    pub fn disable(&mut self, name: &str) -> Result<(), RulesetError> {
        self.check_known(name)?;
        self.enabled.remove(name);
        Ok(())
    }

    /// Enable exactly the named rules and disable all others.
    pub fn enable_only<'n>(
        &mut self,
        names: impl IntoIterator<Item = &'n str>,
    ) -> Result<(), RulesetError> {
        let mut selected = BTreeSet::new();
        for name in names {
            self.check_known(name)?;
            selected.insert(name.to_string());
        }
        self.enabled = selected;
        Ok(())
    }

    /// Enabled rules in name order.
    pub fn enabled_rules(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules
            .iter()
            .filter(move |(name, _)| self.enabled.contains(name.as_str()))
            .map(|(name, rule)| (name.as_str(), rule))
    }

    fn check_known(&self, name: &str) -> Result<(), RulesetError> {
        if self.rules.contains_key(name) {
            Ok(())
        } else {
            Err(RulesetError::UnknownRule {
                name: name.to_string(),
            })
        }
    }
}

/// The bundled JSON:API ruleset.
pub fn jsonapi_ruleset() -> Result<Ruleset, RulesetError> {
    let document: Value = serde_json::from_str(JSONAPI_RULESET)
        .map_err(|source| RulesetError::Malformed { source })?;
    Ruleset::from_value(document)
}

/// Load a ruleset from a JSON or YAML file.
pub fn load_ruleset(path: &Path) -> Result<Ruleset, RulesetError> {
    let document = load_document(path)?;
    Ruleset::from_value(document)
}
