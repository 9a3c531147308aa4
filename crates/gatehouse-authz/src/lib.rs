//! # gatehouse-authz
//!
//! Access control decision engine for the Gatehouse authentication gateway.
//!
//! Given a request description (who is asking, from where, for which host,
//! path, method and query) and an ordered list of rules, the engine returns
//! the policy [`Level`] that applies: bypass, one factor, two factor or deny.
//! The first rule whose criteria all match decides; when none matches, the
//! configured default applies.
//!
//! ## Modules
//!
//! - [`config`] - Plain-data rule specifications (TOML/JSON)
//! - [`rule_set`] - Rule set construction and first-match evaluation
//! - [`rule`] - A single rule and its AND-of-criteria predicate
//! - [`matcher`] - Domain, resource, query and subject matchers
//! - [`network`] - Network literal parsing and the per-rule-set cache
//! - [`request`] - Subject and object value types
//! - [`reload`] - Atomic publication of rebuilt rule sets
//! - [`level`] - Policy levels
//! - [`error`] - Construction errors

pub mod config;
pub mod error;
pub mod level;
pub mod matcher;
pub mod network;
pub mod reload;
pub mod request;
pub mod rule;
pub mod rule_set;

pub use config::{
    AccessControlConfig, NetworkDefinition, QueryConditionSpec, QuerySpec, RuleSpec, SubjectSpec,
};
pub use error::AuthzError;
pub use level::Level;
pub use matcher::{
    DomainMatcher, QueryCondition, QueryMatcher, QueryOperator, ResourceMatcher, SubjectGroup,
    SubjectMatcher,
};
pub use network::{NetworksCache, NetworksCacheBuilder, parse_network};
pub use reload::ReloadableRuleSet;
pub use request::{Identity, Object, QueryParams, Subject};
pub use rule::{AccessControlRule, RuleMatchResult};
pub use rule_set::{Decision, METHODS, RuleSet, build_rules};

/// Type alias for rule construction results.
pub type AuthzResult<T> = Result<T, AuthzError>;
