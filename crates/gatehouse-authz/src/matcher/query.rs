//! Query-parameter criterion.
//!
//! A rule's query criterion is a list of alternatives; the criterion matches
//! when any alternative matches. Each alternative ([`QueryMatcher`]) is a list
//! of conditions that must all hold.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::AuthzResult;
use crate::error::AuthzError;
use crate::request::Object;

const FIELD: &str = "query";

/// Comparison applied to a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOperator {
    /// Some value equals the expected value.
    Equal,
    /// No value equals the expected value (or the key is absent).
    NotEqual,
    /// Some value contains the expected value as a substring.
    Contains,
    /// The key appears at least once.
    Present,
    /// The key does not appear.
    Absent,
    /// Some value matches the expected pattern.
    Pattern,
    /// No value matches the expected pattern (or the key is absent).
    NotPattern,
}

impl QueryOperator {
    /// Whether this operator compares against a value.
    #[must_use]
    pub fn takes_value(&self) -> bool {
        !matches!(self, Self::Present | Self::Absent)
    }
}

#[derive(Debug, Clone)]
enum Check {
    Equal(String),
    NotEqual(String),
    Contains(String),
    Present,
    Absent,
    Pattern(Regex),
    NotPattern(Regex),
}

/// A single condition on one query parameter.
#[derive(Debug, Clone)]
pub struct QueryCondition {
    key: String,
    check: Check,
}

impl QueryCondition {
    /// Build a condition for the rule at `position`.
    ///
    /// Without an explicit operator, a condition with a value means
    /// [`QueryOperator::Equal`] and one without means
    /// [`QueryOperator::Present`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty, the operator's need for a value
    /// is not met, or a pattern fails to compile.
    pub fn new(
        position: usize,
        key: &str,
        operator: Option<QueryOperator>,
        value: Option<&str>,
    ) -> AuthzResult<Self> {
        if key.is_empty() {
            return Err(AuthzError::invalid_rule(position, FIELD, "key cannot be empty"));
        }

        let operator = operator.unwrap_or(if value.is_some() {
            QueryOperator::Equal
        } else {
            QueryOperator::Present
        });

        let value = match (operator.takes_value(), value) {
            (true, Some(value)) => value,
            (true, None) => {
                return Err(AuthzError::invalid_rule(
                    position,
                    FIELD,
                    format!("operator {:?} on key '{}' requires a value", operator, key),
                ));
            }
            (false, Some(_)) => {
                return Err(AuthzError::invalid_rule(
                    position,
                    FIELD,
                    format!("operator {:?} on key '{}' does not take a value", operator, key),
                ));
            }
            (false, None) => "",
        };

        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| AuthzError::invalid_pattern(position, FIELD, pattern, e))
        };

        let check = match operator {
            QueryOperator::Equal => Check::Equal(value.to_string()),
            QueryOperator::NotEqual => Check::NotEqual(value.to_string()),
            QueryOperator::Contains => Check::Contains(value.to_string()),
            QueryOperator::Present => Check::Present,
            QueryOperator::Absent => Check::Absent,
            QueryOperator::Pattern => Check::Pattern(compile(value)?),
            QueryOperator::NotPattern => Check::NotPattern(compile(value)?),
        };

        Ok(Self {
            key: key.to_string(),
            check,
        })
    }

    #[must_use]
    pub fn is_match(&self, object: &Object) -> bool {
        let values = object.query.get_all(&self.key);

        match &self.check {
            Check::Equal(expected) => values.iter().any(|v| v == expected),
            Check::NotEqual(expected) => !values.iter().any(|v| v == expected),
            Check::Contains(needle) => values.iter().any(|v| v.contains(needle.as_str())),
            Check::Present => object.query.contains_key(&self.key),
            Check::Absent => !object.query.contains_key(&self.key),
            Check::Pattern(regex) => values.iter().any(|v| regex.is_match(v)),
            Check::NotPattern(regex) => !values.iter().any(|v| regex.is_match(v)),
        }
    }
}

/// One alternative of a query criterion: every condition must hold.
#[derive(Debug, Clone, Default)]
pub struct QueryMatcher {
    conditions: Vec<QueryCondition>,
}

impl QueryMatcher {
    #[must_use]
    pub fn new(conditions: Vec<QueryCondition>) -> Self {
        Self { conditions }
    }

    #[must_use]
    pub fn is_match(&self, object: &Object) -> bool {
        self.conditions.iter().all(|c| c.is_match(object))
    }
}
