//! Subject criterion.
//!
//! Subject entries are written as `user:<name>`, `group:<name>`, or the same
//! prefixed with `!` to negate. Entries are grouped: a [`SubjectGroup`]
//! matches when all of its entries match, and a rule's subject criterion
//! matches when any group does.
//!
//! Anonymous subjects are handled by the rule, not here: the rule lets them
//! through the subject criterion unconditionally.

use std::str::FromStr;

use crate::error::AuthzError;
use crate::request::Subject;

/// One subject entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectMatcher {
    /// The subject's username equals the value.
    User(String),
    /// The subject is a member of the group.
    Group(String),
    /// The subject's username is not the value.
    NotUser(String),
    /// The subject is not a member of the group.
    NotGroup(String),
}

impl SubjectMatcher {
    /// Check the entry against an authenticated subject.
    #[must_use]
    pub fn is_match(&self, subject: &Subject) -> bool {
        match self {
            Self::User(name) => subject.username() == Some(name.as_str()),
            Self::Group(name) => subject.in_group(name),
            Self::NotUser(name) => subject.username() != Some(name.as_str()),
            Self::NotGroup(name) => !subject.in_group(name),
        }
    }
}

impl FromStr for SubjectMatcher {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negated, rest) = match s.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (kind, name) = rest
            .split_once(':')
            .ok_or_else(|| format!("'{}' must be of the form user:<name> or group:<name>", s))?;

        if name.is_empty() {
            return Err(format!("'{}' has an empty name", s));
        }

        let name = name.to_string();
        match (kind, negated) {
            ("user", false) => Ok(Self::User(name)),
            ("group", false) => Ok(Self::Group(name)),
            ("user", true) => Ok(Self::NotUser(name)),
            ("group", true) => Ok(Self::NotGroup(name)),
            _ => Err(format!("'{}' has unknown subject type '{}'", s, kind)),
        }
    }
}

/// AND-combination of subject entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectGroup {
    matchers: Vec<SubjectMatcher>,
}

impl SubjectGroup {
    #[must_use]
    pub fn new(matchers: Vec<SubjectMatcher>) -> Self {
        Self { matchers }
    }

    /// Parse a group from its entries.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::InvalidRule` for the first malformed entry or an
    /// empty group.
    pub fn parse<S: AsRef<str>>(position: usize, entries: &[S]) -> Result<Self, AuthzError> {
        if entries.is_empty() {
            return Err(AuthzError::invalid_rule(
                position,
                "subject",
                "subject group cannot be empty",
            ));
        }

        let matchers = entries
            .iter()
            .map(|e| {
                e.as_ref()
                    .parse()
                    .map_err(|message| AuthzError::invalid_rule(position, "subject", message))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(matchers))
    }

    #[must_use]
    pub fn is_match(&self, subject: &Subject) -> bool {
        self.matchers.iter().all(|m| m.is_match(subject))
    }
}
