//! Policy levels produced by rule evaluation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::AuthzResult;
use crate::error::AuthzError;

/// Authorization level required for a request.
///
/// Ordered from least to most restrictive, so `Level::Bypass < Level::Denied`.
/// "No rule matched" is not a level; callers supply the fallback to
/// [`RuleSet`](crate::RuleSet) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// No authentication required.
    Bypass,
    /// Single-factor authentication required.
    OneFactor,
    /// Multi-factor authentication required.
    TwoFactor,
    /// Access is denied.
    Denied,
}

impl Level {
    /// Canonical configuration string for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bypass => "bypass",
            Self::OneFactor => "one_factor",
            Self::TwoFactor => "two_factor",
            Self::Denied => "deny",
        }
    }

    /// Returns `true` if this level requires any authentication or denies.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        *self > Self::Bypass
    }
}

impl FromStr for Level {
    type Err = AuthzError;

    fn from_str(s: &str) -> AuthzResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bypass" => Ok(Self::Bypass),
            "one_factor" => Ok(Self::OneFactor),
            "two_factor" => Ok(Self::TwoFactor),
            "deny" => Ok(Self::Denied),
            _ => Err(AuthzError::unknown_policy(s)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Bypass < Level::OneFactor);
        assert!(Level::OneFactor < Level::TwoFactor);
        assert!(Level::TwoFactor < Level::Denied);
        assert!(!Level::Bypass.is_restricted());
        assert!(Level::OneFactor.is_restricted());
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("bypass".parse::<Level>().unwrap(), Level::Bypass);
        assert_eq!("one_factor".parse::<Level>().unwrap(), Level::OneFactor);
        assert_eq!(" Two_Factor ".parse::<Level>().unwrap(), Level::TwoFactor);
        assert_eq!("deny".parse::<Level>().unwrap(), Level::Denied);
    }

    #[test]
    fn test_level_parse_unknown() {
        let err = "allow".parse::<Level>().unwrap_err();
        assert!(matches!(err, AuthzError::UnknownPolicy { ref value } if value == "allow"));
        assert!("".parse::<Level>().is_err());
        assert!("denied".parse::<Level>().is_err());
    }

    #[test]
    fn test_level_display_matches_parse() {
        for level in [Level::Bypass, Level::OneFactor, Level::TwoFactor, Level::Denied] {
            assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
        }
    }

    #[test]
    fn test_level_serde() {
        let json = serde_json::to_string(&Level::TwoFactor).unwrap();
        assert_eq!(json, r#""two_factor""#);

        let parsed: Level = serde_json::from_str(r#""deny""#).unwrap();
        assert_eq!(parsed, Level::Denied);

        assert!(serde_json::from_str::<Level>(r#""maybe""#).is_err());
    }
}
