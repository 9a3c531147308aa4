//! Access control error types.
//!
//! Every error in this module is a construction error: it is produced while
//! turning rule specifications into matchers. Evaluation of a built rule set
//! never fails.

/// Errors that can occur while building an access control rule set.
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// A network literal in a rule is neither a defined network name, a CIDR
    /// nor a plain IP address.
    #[error("Rule #{position}: invalid network '{network}': {message}")]
    InvalidNetwork {
        /// Position of the offending rule.
        position: usize,
        /// The literal as written in the rule.
        network: String,
        /// Parser error message.
        message: String,
    },

    /// A named network definition is malformed.
    #[error("Network definition '{name}': {message}")]
    InvalidNetworkDefinition {
        /// The definition name.
        name: String,
        /// Description of the problem.
        message: String,
    },

    /// A policy string does not name a known level.
    #[error("Unknown policy level '{value}'. Must be bypass, one_factor, two_factor or deny")]
    UnknownPolicy {
        /// The unrecognized value.
        value: String,
    },

    /// A rule field holds a value that cannot be turned into a matcher.
    #[error("Rule #{position}: invalid {field}: {message}")]
    InvalidRule {
        /// Position of the offending rule (0 for the default policy).
        position: usize,
        /// Field name as it appears in configuration.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// A regular expression in a rule failed to compile.
    #[error("Rule #{position}: invalid {field} pattern '{pattern}': {source}")]
    InvalidPattern {
        /// Position of the offending rule.
        position: usize,
        /// Field name as it appears in configuration.
        field: &'static str,
        /// The pattern as written.
        pattern: String,
        /// Underlying compile error.
        #[source]
        source: regex::Error,
    },

    /// The configuration document could not be read or deserialized.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthzError {
    /// Creates a new `InvalidNetwork` error.
    #[must_use]
    pub fn invalid_network(
        position: usize,
        network: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidNetwork {
            position,
            network: network.into(),
            message: message.into(),
        }
    }

    /// Creates a new `InvalidNetworkDefinition` error.
    #[must_use]
    pub fn invalid_network_definition(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidNetworkDefinition {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a new `UnknownPolicy` error.
    #[must_use]
    pub fn unknown_policy(value: impl Into<String>) -> Self {
        Self::UnknownPolicy {
            value: value.into(),
        }
    }

    /// Creates a new `InvalidRule` error.
    #[must_use]
    pub fn invalid_rule(position: usize, field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            position,
            field,
            message: message.into(),
        }
    }

    /// Creates a new `InvalidPattern` error.
    #[must_use]
    pub fn invalid_pattern(
        position: usize,
        field: &'static str,
        pattern: impl Into<String>,
        source: regex::Error,
    ) -> Self {
        Self::InvalidPattern {
            position,
            field,
            pattern: pattern.into(),
            source,
        }
    }

    /// Creates a new `Config` error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Position of the rule that caused the error, if any.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::InvalidNetwork { position, .. }
            | Self::InvalidRule { position, .. }
            | Self::InvalidPattern { position, .. } => Some(*position),
            Self::InvalidNetworkDefinition { .. }
            | Self::UnknownPolicy { .. }
            | Self::Config { .. } => None,
        }
    }

    /// Configuration field that caused the error, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidNetwork { .. } => Some("networks"),
            Self::InvalidRule { field, .. } | Self::InvalidPattern { field, .. } => Some(field),
            Self::UnknownPolicy { .. } => Some("policy"),
            Self::InvalidNetworkDefinition { .. } | Self::Config { .. } => None,
        }
    }

    /// Attach a rule position to an error raised without one.
    ///
    /// `UnknownPolicy` is produced by [`Level`](crate::Level) parsing, which
    /// knows nothing about rules; the builder rewraps it here.
    #[must_use]
    pub(crate) fn at_rule(self, position: usize) -> Self {
        match self {
            Self::UnknownPolicy { value } => Self::InvalidRule {
                position,
                field: "policy",
                message: format!(
                    "unknown policy level '{}'. Must be bypass, one_factor, two_factor or deny",
                    value
                ),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_network_display() {
        let err = AuthzError::invalid_network(3, "10.0.0.0/33", "invalid prefix");
        assert_eq!(
            err.to_string(),
            "Rule #3: invalid network '10.0.0.0/33': invalid prefix"
        );
        assert_eq!(err.position(), Some(3));
        assert_eq!(err.field(), Some("networks"));
    }

    #[test]
    fn test_unknown_policy_at_rule() {
        let err = AuthzError::unknown_policy("allow").at_rule(2);
        assert_eq!(err.position(), Some(2));
        assert_eq!(err.field(), Some("policy"));
        assert!(err.to_string().contains("'allow'"));
    }

    #[test]
    fn test_config_error_has_no_position() {
        let err = AuthzError::config("missing rules");
        assert_eq!(err.position(), None);
        assert_eq!(err.field(), None);
    }
}
