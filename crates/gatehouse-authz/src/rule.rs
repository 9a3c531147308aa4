//! Access control rules.
//!
//! A rule is the AND of six criteria. Within a criterion the entries are
//! OR'd, and an empty criterion matches anything:
//!
//! | Criterion | Entry type | Compared with |
//! |-----------|------------|---------------|
//! | domains   | [`DomainMatcher`] | `Object::domain` |
//! | resources | [`ResourceMatcher`] | `Object::path` |
//! | query     | [`QueryMatcher`] | `Object::query` |
//! | methods   | `String` | `Object::method` |
//! | networks  | [`IpNetwork`] | `Subject::ip` |
//! | subjects  | [`SubjectGroup`] | `Subject::identity` |
//!
//! Anonymous subjects always pass the subject criterion. A rule such as
//! `subject = ["group:admins"], policy = "two_factor"` therefore matches an
//! anonymous request too, which is what makes the host ask it to log in.
//! Rules meant to exclude anonymous users entirely must be preceded by a
//! rule that catches them.

use ipnetwork::IpNetwork;
use serde::Serialize;

use crate::level::Level;
use crate::matcher::{DomainMatcher, QueryMatcher, ResourceMatcher, SubjectGroup};
use crate::request::{Object, Subject};

// =============================================================================
// Access Control Rule
// =============================================================================

/// A single built rule.
#[derive(Debug, Clone)]
pub struct AccessControlRule {
    /// 1-based position in the configured rule list.
    pub position: usize,
    pub domains: Vec<DomainMatcher>,
    pub resources: Vec<ResourceMatcher>,
    pub query: Vec<QueryMatcher>,
    pub methods: Vec<String>,
    pub networks: Vec<IpNetwork>,
    pub subjects: Vec<SubjectGroup>,
    /// Level applied when the rule matches.
    pub policy: Level,
}

impl AccessControlRule {
    /// A rule at `position` with every criterion empty.
    #[must_use]
    pub fn new(position: usize, policy: Level) -> Self {
        Self {
            position,
            domains: Vec::new(),
            resources: Vec::new(),
            query: Vec::new(),
            methods: Vec::new(),
            networks: Vec::new(),
            subjects: Vec::new(),
            policy,
        }
    }

    /// Returns `true` if every criterion matches.
    ///
    /// Criteria are checked in a fixed order, cheapest first, stopping at the
    /// first that fails.
    #[must_use]
    pub fn is_match(&self, subject: &Subject, object: &Object) -> bool {
        self.matches_domains(subject, object)
            && self.matches_resources(object)
            && self.matches_query(object)
            && self.matches_methods(object)
            && self.matches_networks(subject)
            && self.matches_subjects(subject)
    }

    /// Evaluate every criterion without short-circuiting.
    #[must_use]
    pub fn explain(&self, subject: &Subject, object: &Object) -> RuleMatchResult {
        RuleMatchResult {
            position: self.position,
            policy: self.policy,
            domains: self.matches_domains(subject, object),
            resources: self.matches_resources(object),
            query: self.matches_query(object),
            methods: self.matches_methods(object),
            networks: self.matches_networks(subject),
            subjects: self.matches_subjects(subject),
        }
    }

    pub fn matches_domains(&self, subject: &Subject, object: &Object) -> bool {
        self.domains.is_empty() || self.domains.iter().any(|d| d.is_match(subject, object))
    }

    pub fn matches_resources(&self, object: &Object) -> bool {
        self.resources.is_empty() || self.resources.iter().any(|r| r.is_match(object))
    }

    pub fn matches_query(&self, object: &Object) -> bool {
        self.query.is_empty() || self.query.iter().any(|q| q.is_match(object))
    }

    pub fn matches_methods(&self, object: &Object) -> bool {
        self.methods.is_empty() || self.methods.iter().any(|m| *m == object.method)
    }

    pub fn matches_networks(&self, subject: &Subject) -> bool {
        self.networks.is_empty() || self.networks.iter().any(|n| n.contains(subject.ip()))
    }

    /// Subject criterion; anonymous subjects always pass.
    pub fn matches_subjects(&self, subject: &Subject) -> bool {
        subject.is_anonymous() || self.matches_subjects_exact(subject)
    }

    /// Subject criterion without the anonymous pass-through.
    ///
    /// Anonymous subjects match only when the criterion is empty.
    pub fn matches_subjects_exact(&self, subject: &Subject) -> bool {
        if self.subjects.is_empty() {
            return true;
        }
        if subject.is_anonymous() {
            return false;
        }

        self.subjects.iter().any(|s| s.is_match(subject))
    }
}

// =============================================================================
// Match Result
// =============================================================================

/// Per-criterion outcome of one rule against one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleMatchResult {
    pub position: usize,
    pub policy: Level,
    pub domains: bool,
    pub resources: bool,
    pub query: bool,
    pub methods: bool,
    pub networks: bool,
    pub subjects: bool,
}

impl RuleMatchResult {
    /// Returns `true` if every criterion matched.
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.domains
            && self.resources
            && self.query
            && self.methods
            && self.networks
            && self.subjects
    }
}
