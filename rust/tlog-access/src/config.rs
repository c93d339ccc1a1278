use serde::{Deserialize, Serialize};
use tlog_capability::{AbilityTable, TableError, abilities, allows, is_well_formed};

use crate::{Did, traversal::TraversalLimits};

/// Errors raised while loading an [`AuthorizerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON for this shape.
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The ability table contains a malformed ability.
    #[error(transparent)]
    Table(#[from] TableError),

    /// A direct-only ability is malformed.
    #[error("Invalid direct-only ability '{0}'")]
    InvalidDirectOnly(String),

    /// The service principal is empty.
    #[error("Configuration has no audience")]
    MissingAudience,
}

fn default_direct_only() -> Vec<String> {
    vec![abilities::BLOB_REMOVE.to_string()]
}

/// Everything an [`Authorizer`](crate::Authorizer) needs besides its proof
/// resolver.
///
/// ```json
/// {
///   "audience": "did:key:zService",
///   "abilities": { "append": "tlog/append", "erase": "blob/remove" },
///   "limits": { "max_depth": 8 },
///   "direct_only": ["blob/remove"]
/// }
/// ```
///
/// Every field but `audience` may be omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerConfig {
    /// The service principal; presented credentials must be addressed to it.
    pub audience: Did,

    /// Operation → required ability.
    #[serde(default)]
    pub abilities: AbilityTable,

    /// Bounds on every proof-graph traversal.
    #[serde(default)]
    pub limits: TraversalLimits,

    /// Abilities that may only be exercised with a credential issued
    /// directly by the resource owner. Any operation whose required ability
    /// falls under one of these is routed through the erase policy.
    #[serde(default = "default_direct_only")]
    pub direct_only: Vec<String>,
}

impl AuthorizerConfig {
    /// Default configuration for the service principal `audience`.
    pub fn new(audience: impl Into<Did>) -> Self {
        Self {
            audience: audience.into(),
            abilities: AbilityTable::default(),
            limits: TraversalLimits::default(),
            direct_only: default_direct_only(),
        }
    }

    /// Replace the ability table.
    pub fn with_abilities(mut self, abilities: AbilityTable) -> Self {
        self.abilities = abilities;
        self
    }

    /// Replace the traversal limits.
    pub fn with_limits(mut self, limits: TraversalLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the direct-only abilities.
    pub fn with_direct_only<I, S>(mut self, direct_only: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.direct_only = direct_only.into_iter().map(Into::into).collect();
        self
    }

    /// Decode and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the authorizer cannot act on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.audience.is_empty() {
            return Err(ConfigError::MissingAudience);
        }
        self.abilities.validate()?;
        if let Some(bad) = self.direct_only.iter().find(|a| !is_well_formed(a)) {
            return Err(ConfigError::InvalidDirectOnly(bad.clone()));
        }
        Ok(())
    }

    /// Returns `true` if `ability` may only be exercised directly.
    pub fn is_direct_only(&self, ability: &str) -> bool {
        self.direct_only.iter().any(|held| allows(held, ability))
    }
}
