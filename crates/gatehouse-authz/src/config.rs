//! Access control configuration.
//!
//! Plain-data rule specifications as handed over by the host's configuration
//! layer. Nothing here is compiled; [`RuleSet::build`](crate::RuleSet::build)
//! turns a config into matchers and reports any invalid value.
//!
//! # Example (TOML)
//!
//! ```toml
//! default_policy = "deny"
//!
//! [[networks]]
//! name = "internal"
//! networks = ["10.0.0.0/8", "192.168.0.0/16"]
//!
//! [[rules]]
//! domain = ["public.example.com"]
//! policy = "bypass"
//!
//! [[rules]]
//! domain = ["*.example.com"]
//! networks = ["internal"]
//! subject = [["group:admins", "!user:mallory"], "user:john"]
//! policy = "two_factor"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::AuthzResult;
use crate::error::AuthzError;
use crate::level::Level;
use crate::matcher::QueryOperator;

// =============================================================================
// Root Configuration
// =============================================================================

/// Root access control configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessControlConfig {
    /// Level applied when no rule matches.
    pub default_policy: Level,

    /// Named network definitions that rules may reference by name.
    pub networks: Vec<NetworkDefinition>,

    /// Rules in evaluation order.
    pub rules: Vec<RuleSpec>,
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            default_policy: Level::Denied,
            networks: Vec::new(),
            rules: Vec::new(),
        }
    }
}

impl AccessControlConfig {
    /// Deserialize from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::Config` if the document is not valid TOML or does
    /// not have the expected shape.
    pub fn from_toml_str(s: &str) -> AuthzResult<Self> {
        toml::from_str(s).map_err(|e| AuthzError::config(e.to_string()))
    }

    /// Deserialize from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::Config` if the document is not valid JSON or does
    /// not have the expected shape.
    pub fn from_json_str(s: &str) -> AuthzResult<Self> {
        serde_json::from_str(s).map_err(|e| AuthzError::config(e.to_string()))
    }

    /// Load from a file; `.json` files are read as JSON, anything else as TOML.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::Config` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> AuthzResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AuthzError::config(format!("failed to read {}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }
}

/// A named list of networks.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkDefinition {
    pub name: String,
    pub networks: Vec<String>,
}

// =============================================================================
// Rule Specification
// =============================================================================

/// One rule as written in configuration.
///
/// Every list left empty matches any request on that criterion.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleSpec {
    /// Literal domains; `*.`, `{user}.` and `{group}.` prefixes are supported.
    pub domain: Vec<String>,

    /// Domain regular expressions, matched case-insensitively.
    pub domain_regex: Vec<String>,

    /// Regular expressions matched against the path and query string.
    pub resources: Vec<String>,

    /// Query alternatives (OR); each alternative is a list of conditions (AND).
    pub query: Vec<QuerySpec>,

    /// HTTP methods.
    pub methods: Vec<String>,

    /// Network literals or network definition names.
    pub networks: Vec<String>,

    /// Subject alternatives (OR); a list entry is an AND group.
    pub subject: Vec<SubjectSpec>,

    /// Policy level name.
    pub policy: String,
}

impl RuleSpec {
    /// A rule with every criterion empty.
    #[must_use]
    pub fn new(policy: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            ..Default::default()
        }
    }
}

/// Subject entry: a single matcher or a group that must all match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SubjectSpec {
    One(String),
    All(Vec<String>),
}

impl SubjectSpec {
    /// The entries of this group.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        match self {
            Self::One(entry) => std::slice::from_ref(entry),
            Self::All(entries) => entries,
        }
    }
}

impl From<&str> for SubjectSpec {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

/// Query entry: a single condition or a list that must all hold.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum QuerySpec {
    One(QueryConditionSpec),
    All(Vec<QueryConditionSpec>),
}

impl QuerySpec {
    /// The conditions of this alternative.
    #[must_use]
    pub fn conditions(&self) -> &[QueryConditionSpec] {
        match self {
            Self::One(condition) => std::slice::from_ref(condition),
            Self::All(conditions) => conditions,
        }
    }
}

/// A single query condition.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConditionSpec {
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<QueryOperator>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}
