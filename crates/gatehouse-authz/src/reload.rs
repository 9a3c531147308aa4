//! Publication of rebuilt rule sets.
//!
//! Request handlers read the current [`RuleSet`] through a lock-free atomic
//! load. A reload builds a complete new rule set off to the side and swaps it
//! in; evaluations already holding the old set finish against it.
//!
//! # Usage
//!
//! ```ignore
//! use gatehouse_authz::{AccessControlConfig, ReloadableRuleSet, RuleSet};
//!
//! let rules = ReloadableRuleSet::new(RuleSet::build(&config)?);
//!
//! // Request path
//! let level = rules.evaluate(&subject, &object);
//!
//! // Configuration changed
//! if let Err(e) = rules.reload(&new_config) {
//!     // previous rules stay in effect
//! }
//! ```

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{info, warn};

use crate::AuthzResult;
use crate::config::AccessControlConfig;
use crate::level::Level;
use crate::request::{Object, Subject};
use crate::rule_set::RuleSet;

/// A [`RuleSet`] that can be replaced while in use.
#[derive(Clone)]
pub struct ReloadableRuleSet {
    inner: Arc<ArcSwap<RuleSet>>,
}

impl ReloadableRuleSet {
    /// Publish an initial rule set.
    #[must_use]
    pub fn new(rules: RuleSet) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(rules)),
        }
    }

    /// Build and publish the initial rule set from configuration.
    ///
    /// # Errors
    ///
    /// Returns the construction error; nothing is published.
    pub fn from_config(config: &AccessControlConfig) -> AuthzResult<Self> {
        RuleSet::build(config).map(Self::new)
    }

    /// Snapshot of the current rule set.
    #[must_use]
    pub fn current(&self) -> Arc<RuleSet> {
        self.inner.load_full()
    }

    /// Evaluate against the current rule set.
    #[must_use]
    pub fn evaluate(&self, subject: &Subject, object: &Object) -> Level {
        self.inner.load().evaluate(subject, object)
    }

    /// Rebuild from configuration and publish on success.
    ///
    /// # Errors
    ///
    /// Returns the construction error. The previously published rule set
    /// stays in effect.
    pub fn reload(&self, config: &AccessControlConfig) -> AuthzResult<()> {
        match RuleSet::build(config) {
            Ok(rules) => {
                self.replace(rules);
                Ok(())
            }
            Err(e) => {
                warn!(
                    error = %e,
                    rules = self.inner.load().len(),
                    "Access control reload rejected, keeping previous rules"
                );
                Err(e)
            }
        }
    }

    /// Publish an already-built rule set.
    pub fn replace(&self, rules: RuleSet) {
        let count = rules.len();
        self.inner.store(Arc::new(rules));
        info!(rules = count, "Access control rules published");
    }
}

impl std::fmt::Debug for ReloadableRuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadableRuleSet")
            .field("rules", &self.inner.load().len())
            .finish()
    }
}
