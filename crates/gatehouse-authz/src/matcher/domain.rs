//! Domain criterion.

use regex::Regex;

use crate::request::{Object, Subject};

const WILDCARD_LABEL: &str = "*";
const USER_PLACEHOLDER: &str = "{user}";
const GROUP_PLACEHOLDER: &str = "{group}";

/// Capture group name constraining a domain pattern to the username.
pub const USER_CAPTURE: &str = "User";
/// Capture group name constraining a domain pattern to a group.
pub const GROUP_CAPTURE: &str = "Group";

/// One entry of a rule's domain criterion.
#[derive(Debug, Clone)]
pub enum DomainMatcher {
    /// Exact host, lowercased.
    Exact(String),
    /// `*.example.com`; stores `.example.com`.
    Wildcard(String),
    /// `{user}.example.com`; stores `.example.com`.
    UserWildcard(String),
    /// `{group}.example.com`; stores `.example.com`.
    GroupWildcard(String),
    /// Compiled host pattern, possibly with `User`/`Group` captures.
    Regex(Regex),
}

impl DomainMatcher {
    /// Classify a literal domain entry.
    ///
    /// Only a leading `*.`, `{user}.` or `{group}.` label is special; any
    /// other entry is an exact host.
    #[must_use]
    pub fn literal(domain: &str) -> Self {
        let domain = domain.trim().to_ascii_lowercase();

        if let Some(suffix) = label_suffix(&domain, WILDCARD_LABEL) {
            Self::Wildcard(suffix)
        } else if let Some(suffix) = label_suffix(&domain, USER_PLACEHOLDER) {
            Self::UserWildcard(suffix)
        } else if let Some(suffix) = label_suffix(&domain, GROUP_PLACEHOLDER) {
            Self::GroupWildcard(suffix)
        } else {
            Self::Exact(domain)
        }
    }

    /// Classify a literal domain entry from configuration.
    ///
    /// Unlike [`literal`](Self::literal), rejects entries that carry `*`,
    /// `{` or `}` anywhere but in a leading wildcard or placeholder label.
    pub fn parse(domain: &str) -> Result<Self, String> {
        let matcher = Self::literal(domain);
        let rest = match &matcher {
            Self::Exact(name) => name.as_str(),
            Self::Wildcard(suffix) | Self::UserWildcard(suffix) | Self::GroupWildcard(suffix) => {
                suffix.as_str()
            }
            Self::Regex(_) => return Ok(matcher),
        };

        if rest.is_empty() || rest == "." {
            return Err("domain cannot be empty".to_string());
        }
        if rest.contains(['*', '{', '}']) {
            return Err(format!(
                "'{}' must use '*.', '{{user}}.' or '{{group}}.' as a leading label only",
                domain.trim()
            ));
        }

        Ok(matcher)
    }

    /// Wrap a compiled host pattern.
    #[must_use]
    pub fn pattern(regex: Regex) -> Self {
        Self::Regex(regex)
    }

    /// Check whether this entry matches the object's host.
    #[must_use]
    pub fn is_match(&self, subject: &Subject, object: &Object) -> bool {
        let host = object.domain.as_str();

        match self {
            Self::Exact(name) => host == name,
            Self::Wildcard(suffix) => host.ends_with(suffix.as_str()),
            Self::UserWildcard(suffix) => subject
                .username()
                .is_some_and(|user| prefixed_by(host, user, suffix)),
            Self::GroupWildcard(suffix) => subject
                .groups()
                .iter()
                .any(|group| prefixed_by(host, group, suffix)),
            Self::Regex(regex) => matches_pattern(regex, subject, host),
        }
    }

    /// Check whether this entry could match `host` for some subject.
    ///
    /// `host` must already be lowercased.
    #[must_use]
    pub fn may_match(&self, host: &str) -> bool {
        match self {
            Self::Exact(name) => host == name,
            Self::Wildcard(suffix) => host.ends_with(suffix.as_str()),
            Self::UserWildcard(suffix) | Self::GroupWildcard(suffix) => {
                host.len() > suffix.len() && host.ends_with(suffix.as_str())
            }
            Self::Regex(regex) => regex.is_match(host),
        }
    }
}

/// Suffix after a leading `label.`, keeping the dot.
fn label_suffix(domain: &str, label: &str) -> Option<String> {
    domain
        .strip_prefix(label)
        .filter(|rest| rest.starts_with('.'))
        .map(str::to_string)
}

/// `host == label + suffix`, comparing the label case-insensitively.
fn prefixed_by(host: &str, label: &str, suffix: &str) -> bool {
    host.strip_suffix(suffix)
        .is_some_and(|head| head.eq_ignore_ascii_case(label))
}

fn matches_pattern(regex: &Regex, subject: &Subject, host: &str) -> bool {
    let Some(captures) = regex.captures(host) else {
        return false;
    };

    if let Some(user) = captures.name(USER_CAPTURE) {
        let owns = subject
            .username()
            .is_some_and(|name| name.eq_ignore_ascii_case(user.as_str()));
        if !owns {
            return false;
        }
    }

    if let Some(group) = captures.name(GROUP_CAPTURE) {
        let member = subject
            .groups()
            .iter()
            .any(|name| name.eq_ignore_ascii_case(group.as_str()));
        if !member {
            return false;
        }
    }

    true
}
