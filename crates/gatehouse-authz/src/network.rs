//! Network resolution for the network criterion.
//!
//! Rules name source networks either by literal (`10.0.0.0/8`, `192.168.1.10`)
//! or by the name of a network definition from configuration. Literals are
//! parsed once per rule set: the [`NetworksCacheBuilder`] remembers every
//! literal it has seen and hands out the same parsed network for repeats.
//! The finished [`NetworksCache`] is frozen and owned by the rule set.

use std::collections::HashMap;
use std::net::IpAddr;

use ipnetwork::IpNetwork;

use crate::AuthzResult;
use crate::error::AuthzError;

/// Parse a network literal.
///
/// Accepts CIDR notation or a plain IPv4/IPv6 address, which becomes a
/// single-host network (`/32` or `/128`).
pub fn parse_network(literal: &str) -> Result<IpNetwork, String> {
    let literal = literal.trim();
    if literal.contains('/') {
        literal.parse::<IpNetwork>().map_err(|e| e.to_string())
    } else {
        literal
            .parse::<IpAddr>()
            .map(IpNetwork::from)
            .map_err(|e| e.to_string())
    }
}

// =============================================================================
// Networks Cache
// =============================================================================

/// Frozen lookup of parsed networks for one rule set.
#[derive(Debug, Clone, Default)]
pub struct NetworksCache {
    /// Literal as written -> parsed network.
    literals: HashMap<String, IpNetwork>,
    /// Definition name -> member networks.
    definitions: HashMap<String, Vec<IpNetwork>>,
}

impl NetworksCache {
    /// The parsed network for a literal seen during construction.
    #[must_use]
    pub fn get(&self, literal: &str) -> Option<IpNetwork> {
        self.literals.get(literal.trim()).copied()
    }

    /// The member networks of a named definition.
    #[must_use]
    pub fn definition(&self, name: &str) -> Option<&[IpNetwork]> {
        self.definitions.get(name).map(Vec::as_slice)
    }

    /// Number of distinct literals parsed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Returns `true` if no literal was parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Mutable side of [`NetworksCache`], used only while building a rule set.
#[derive(Debug, Default)]
pub struct NetworksCacheBuilder {
    cache: NetworksCache,
}

impl NetworksCacheBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named network definition.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::InvalidNetworkDefinition` if the name is empty or
    /// already defined, the definition has no networks, or one of its
    /// literals does not parse.
    pub fn define(&mut self, name: &str, literals: &[String]) -> AuthzResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthzError::invalid_network_definition(
                name,
                "name cannot be empty",
            ));
        }
        if self.cache.definitions.contains_key(name) {
            return Err(AuthzError::invalid_network_definition(
                name,
                "name is defined more than once",
            ));
        }
        if literals.is_empty() {
            return Err(AuthzError::invalid_network_definition(
                name,
                "at least one network is required",
            ));
        }

        let mut networks = Vec::with_capacity(literals.len());
        for literal in literals {
            let network = self.resolve_literal(literal).map_err(|message| {
                AuthzError::invalid_network_definition(
                    name,
                    format!("invalid network '{}': {}", literal, message),
                )
            })?;
            networks.push(network);
        }

        self.cache.definitions.insert(name.to_string(), networks);
        Ok(())
    }

    /// Resolve a literal through the cache, parsing it on first sight.
    pub fn resolve_literal(&mut self, literal: &str) -> Result<IpNetwork, String> {
        let literal = literal.trim();
        if let Some(network) = self.cache.literals.get(literal) {
            return Ok(*network);
        }

        let network = parse_network(literal)?;
        self.cache.literals.insert(literal.to_string(), network);
        Ok(network)
    }

    /// Resolve the network entries of one rule.
    ///
    /// An entry naming a definition expands to all of its networks; any
    /// other entry is treated as a literal.
    ///
    /// # Errors
    ///
    /// Returns `AuthzError::InvalidNetwork` for the first entry that is
    /// neither a definition name nor a valid literal.
    pub fn resolve_rule(&mut self, position: usize, entries: &[String]) -> AuthzResult<Vec<IpNetwork>> {
        let mut networks = Vec::with_capacity(entries.len());

        for entry in entries {
            if let Some(defined) = self.cache.definitions.get(entry.trim()) {
                networks.extend_from_slice(defined);
                continue;
            }

            let network = self
                .resolve_literal(entry)
                .map_err(|message| AuthzError::invalid_network(position, entry.as_str(), message))?;
            networks.push(network);
        }

        Ok(networks)
    }

    /// Freeze the cache.
    #[must_use]
    pub fn build(self) -> NetworksCache {
        self.cache
    }
}
