use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::allows;

/// An ability held over a resource.
///
/// Serialized with the `can` / `with` field names used by capability tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Capability {
    /// Ability path, e.g. `tlog/admin/revoke`, or the wildcard `*`.
    pub can: String,
    /// URI of the protected resource (a log, a group, a space).
    pub with: String,
}

impl Capability {
    /// Create a capability for `can` over `with`.
    pub fn new(can: impl Into<String>, with: impl Into<String>) -> Self {
        Self {
            can: can.into(),
            with: with.into(),
        }
    }

    /// The ability this capability grants.
    pub fn can(&self) -> &str {
        &self.can
    }

    /// The resource this capability is scoped to.
    pub fn with(&self) -> &str {
        &self.with
    }

    /// Returns `true` if this capability permits `ability` over exactly
    /// `resource`.
    pub fn allows(&self, ability: &str, resource: &str) -> bool {
        self.with == resource && allows(&self.can, ability)
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} with {}", self.can, self.with)
    }
}
