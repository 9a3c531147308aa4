//! Resource (path) criterion.

use regex::Regex;

use crate::request::Object;

/// One entry of a rule's resource criterion.
///
/// The pattern is matched against the full request URI: path plus query
/// string. Anchors are up to the rule author.
#[derive(Debug, Clone)]
pub struct ResourceMatcher {
    pattern: Regex,
}

impl ResourceMatcher {
    /// Wrap a compiled pattern.
    #[must_use]
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    /// The pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    #[must_use]
    pub fn is_match(&self, object: &Object) -> bool {
        self.pattern.is_match(&object.path)
    }
}
