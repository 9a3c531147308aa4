//! Rule set construction and evaluation.
//!
//! A [`RuleSet`] is the immutable product of one configuration: the rules in
//! author order, the networks cache they were resolved through, and the
//! default level. Evaluation walks the rules in order and returns the policy
//! of the first that matches.
//!
//! # Example
//!
//! ```ignore
//! use gatehouse_authz::{AccessControlConfig, Level, Object, RuleSet, Subject};
//!
//! let config = AccessControlConfig::from_toml_str(toml)?;
//! let rules = RuleSet::build(&config)?;
//!
//! let subject = Subject::authenticated("john", ["dev"], source_ip);
//! let object = Object::new("app.example.com", "/api/users", "GET");
//!
//! match rules.evaluate(&subject, &object) {
//!     Level::Bypass => { /* forward */ }
//!     Level::Denied => { /* 403 */ }
//!     level => { /* require `level` authentication */ }
//! }
//! ```

use regex::{Regex, RegexBuilder};
use serde::Serialize;

use crate::AuthzResult;
use crate::config::{AccessControlConfig, NetworkDefinition, QuerySpec, RuleSpec};
use crate::error::AuthzError;
use crate::level::Level;
use crate::matcher::{
    DomainMatcher, QueryCondition, QueryMatcher, ResourceMatcher, SubjectGroup,
};
use crate::network::{NetworksCache, NetworksCacheBuilder};
use crate::request::{Object, Subject};
use crate::rule::{AccessControlRule, RuleMatchResult};

/// HTTP methods accepted in a rule's `methods` list.
pub const METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "TRACE", "CONNECT", "OPTIONS", "COPY",
    "LOCK", "MKCOL", "MOVE", "PROPFIND", "PROPPATCH", "UNLOCK",
];

// =============================================================================
// Decision
// =============================================================================

/// Outcome of evaluating a request against a rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Level that applies to the request.
    pub level: Level,
    /// Position of the matching rule; `None` when the default applied.
    pub position: Option<usize>,
}

impl Decision {
    /// Returns `true` if the level came from the default policy.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.position.is_none()
    }
}

// =============================================================================
// Rule Set
// =============================================================================

/// Immutable, ordered set of access control rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<AccessControlRule>,
    default_policy: Level,
    networks: NetworksCache,
}

impl RuleSet {
    /// A rule set with no rules; every request gets `default_policy`.
    #[must_use]
    pub fn empty(default_policy: Level) -> Self {
        Self {
            rules: Vec::new(),
            default_policy,
            networks: NetworksCache::default(),
        }
    }

    /// Build a rule set from configuration.
    ///
    /// # Errors
    ///
    /// See [`build_rules`].
    pub fn build(config: &AccessControlConfig) -> AuthzResult<Self> {
        build_rules(&config.rules, &config.networks, config.default_policy)
    }

    /// Level for a request: the first matching rule's policy, or the default.
    #[must_use]
    pub fn evaluate(&self, subject: &Subject, object: &Object) -> Level {
        self.evaluate_detailed(subject, object).level
    }

    /// Like [`evaluate`](Self::evaluate), also reporting which rule decided.
    #[must_use]
    pub fn evaluate_detailed(&self, subject: &Subject, object: &Object) -> Decision {
        for rule in &self.rules {
            if rule.is_match(subject, object) {
                tracing::debug!(
                    position = rule.position,
                    level = %rule.policy,
                    domain = %object.domain,
                    method = %object.method,
                    "Access control rule matched"
                );
                return Decision {
                    level: rule.policy,
                    position: Some(rule.position),
                };
            }
        }

        tracing::trace!(
            level = %self.default_policy,
            domain = %object.domain,
            "No access control rule matched, applying default policy"
        );
        Decision {
            level: self.default_policy,
            position: None,
        }
    }

    /// Per-criterion results of every rule, in order.
    #[must_use]
    pub fn explain(&self, subject: &Subject, object: &Object) -> Vec<RuleMatchResult> {
        self.rules
            .iter()
            .map(|rule| rule.explain(subject, object))
            .collect()
    }

    /// Returns `true` if some request to `domain` could require more than
    /// bypass.
    ///
    /// Subject-dependent domain entries are treated as matching any subject.
    #[must_use]
    pub fn is_potentially_restricted(&self, domain: &str) -> bool {
        let domain = domain.to_ascii_lowercase();

        self.default_policy.is_restricted()
            || self.rules.iter().any(|rule| {
                rule.policy.is_restricted()
                    && (rule.domains.is_empty()
                        || rule.domains.iter().any(|d| d.may_match(&domain)))
            })
    }

    /// The rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[AccessControlRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Level applied when no rule matches.
    #[must_use]
    pub fn default_policy(&self) -> Level {
        self.default_policy
    }

    /// Networks cache the rules were resolved through.
    #[must_use]
    pub fn networks(&self) -> &NetworksCache {
        &self.networks
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Build a rule set from rule specifications.
///
/// Rules get positions `1..=n` in input order. Network definitions are
/// registered first so rules can reference them by name.
///
/// # Errors
///
/// Returns the first construction error: an invalid network definition, or
/// an invalid value in a rule (network literal, policy, pattern, subject,
/// query condition, method). No rule set is produced on error.
pub fn build_rules(
    rule_specs: &[RuleSpec],
    network_specs: &[NetworkDefinition],
    default_policy: Level,
) -> AuthzResult<RuleSet> {
    let mut networks = NetworksCacheBuilder::new();
    for definition in network_specs {
        networks.define(&definition.name, &definition.networks)?;
    }

    let rules = rule_specs
        .iter()
        .enumerate()
        .map(|(idx, spec)| build_rule(idx + 1, spec, &mut networks))
        .collect::<AuthzResult<Vec<_>>>()?;

    let networks = networks.build();

    tracing::info!(
        rules = rules.len(),
        cached_networks = networks.len(),
        default_policy = %default_policy,
        "Access control rules built"
    );

    Ok(RuleSet {
        rules,
        default_policy,
        networks,
    })
}

fn build_rule(
    position: usize,
    spec: &RuleSpec,
    networks: &mut NetworksCacheBuilder,
) -> AuthzResult<AccessControlRule> {
    let mut domains: Vec<DomainMatcher> = spec
        .domain
        .iter()
        .map(|d| {
            DomainMatcher::parse(d)
                .map_err(|message| AuthzError::invalid_rule(position, "domain", message))
        })
        .collect::<AuthzResult<_>>()?;

    for pattern in &spec.domain_regex {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| AuthzError::invalid_pattern(position, "domain_regex", pattern, e))?;
        domains.push(DomainMatcher::pattern(regex));
    }

    let resources = spec
        .resources
        .iter()
        .map(|pattern| {
            Regex::new(pattern)
                .map(ResourceMatcher::new)
                .map_err(|e| AuthzError::invalid_pattern(position, "resources", pattern, e))
        })
        .collect::<AuthzResult<Vec<_>>>()?;

    let query = spec
        .query
        .iter()
        .map(|alternative| build_query(position, alternative))
        .collect::<AuthzResult<Vec<_>>>()?;

    for method in &spec.methods {
        if !METHODS.contains(&method.as_str()) {
            return Err(AuthzError::invalid_rule(
                position,
                "methods",
                format!("unknown method '{}'", method),
            ));
        }
    }

    let networks = networks.resolve_rule(position, &spec.networks)?;

    let subjects = spec
        .subject
        .iter()
        .map(|group| SubjectGroup::parse(position, group.entries()))
        .collect::<AuthzResult<Vec<_>>>()?;

    let policy = spec
        .policy
        .parse::<Level>()
        .map_err(|e| e.at_rule(position))?;

    Ok(AccessControlRule {
        position,
        domains,
        resources,
        query,
        methods: spec.methods.clone(),
        networks,
        subjects,
        policy,
    })
}

fn build_query(position: usize, alternative: &QuerySpec) -> AuthzResult<QueryMatcher> {
    let conditions = alternative.conditions();
    if conditions.is_empty() {
        return Err(AuthzError::invalid_rule(
            position,
            "query",
            "query alternative cannot be empty",
        ));
    }

    conditions
        .iter()
        .map(|c| QueryCondition::new(position, &c.key, c.operator, c.value.as_deref()))
        .collect::<AuthzResult<Vec<_>>>()
        .map(QueryMatcher::new)
}
