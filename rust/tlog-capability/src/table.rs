use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{TableError, WILDCARD, abilities, is_well_formed};

/// Operations the log service exposes, by name.
pub mod operations {
    /// Append an entry to a log.
    pub const APPEND: &str = "append";
    /// Read entries from a log.
    pub const READ: &str = "read";
    /// Revoke a credential.
    pub const REVOKE: &str = "revoke";
    /// Change log configuration.
    pub const CONFIGURE: &str = "configure";
    /// Upload a blob referenced by a log entry.
    pub const UPLOAD: &str = "upload";
    /// Permanently erase a blob.
    pub const ERASE: &str = "erase";
}

/// Mapping from operation name to the ability it requires.
///
/// The table is configuration injected into the authorizer; callers extend
/// the vocabulary with [`AbilityTable::insert`] or by loading a JSON object
/// of `"operation": "ability"` pairs. Operations missing from the table
/// require the [`WILDCARD`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AbilityTable(BTreeMap<String, String>);

impl AbilityTable {
    /// A table with no operations at all. Every lookup yields the wildcard.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Decode a table from a JSON object, rejecting malformed abilities.
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let table: Self = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Check every ability in the table with [`is_well_formed`].
    pub fn validate(&self) -> Result<(), TableError> {
        for (operation, ability) in &self.0 {
            if !is_well_formed(ability) {
                return Err(TableError::InvalidAbility {
                    operation: operation.clone(),
                    ability: ability.clone(),
                });
            }
        }
        Ok(())
    }

    /// Ability required by `operation`, or the wildcard when unknown.
    pub fn required(&self, operation: &str) -> &str {
        self.get(operation).unwrap_or(WILDCARD)
    }

    /// Ability mapped to `operation`, if any.
    pub fn get(&self, operation: &str) -> Option<&str> {
        self.0.get(operation).map(String::as_str)
    }

    /// Build the full [`Requirement`] for `operation` over `resource`.
    pub fn requirement(&self, operation: &str, resource: &str) -> Requirement {
        Requirement {
            operation: operation.to_string(),
            ability: self.required(operation).to_string(),
            resource: resource.to_string(),
        }
    }

    /// Map `operation` to `ability`, returning the ability it replaced.
    pub fn insert(
        &mut self,
        operation: impl Into<String>,
        ability: impl Into<String>,
    ) -> Result<Option<String>, TableError> {
        let operation = operation.into();
        let ability = ability.into();
        if !is_well_formed(&ability) {
            return Err(TableError::InvalidAbility { operation, ability });
        }
        Ok(self.0.insert(operation, ability))
    }

    /// Builder-style [`AbilityTable::insert`].
    pub fn with(
        mut self,
        operation: impl Into<String>,
        ability: impl Into<String>,
    ) -> Result<Self, TableError> {
        self.insert(operation, ability)?;
        Ok(self)
    }

    /// Insert every `(operation, ability)` pair, stopping at the first
    /// malformed ability. Pairs before it stay inserted.
    pub fn extend<I, O, A>(&mut self, entries: I) -> Result<(), TableError>
    where
        I: IntoIterator<Item = (O, A)>,
        O: Into<String>,
        A: Into<String>,
    {
        for (operation, ability) in entries {
            self.insert(operation, ability)?;
        }
        Ok(())
    }

    /// Iterate `(operation, ability)` pairs in operation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(op, ability)| (op.as_str(), ability.as_str()))
    }

    /// Number of known operations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no operation is known.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for AbilityTable {
    fn default() -> Self {
        Self(BTreeMap::from(
            [
                (operations::APPEND, abilities::APPEND),
                (operations::READ, abilities::READ),
                (operations::REVOKE, abilities::REVOKE),
                (operations::CONFIGURE, abilities::CONFIGURE),
                (operations::UPLOAD, abilities::BLOB_ADD),
                (operations::ERASE, abilities::BLOB_REMOVE),
            ]
            .map(|(op, ability)| (op.to_string(), ability.to_string())),
        ))
    }
}

/// The ability and resource an operation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Operation name as received.
    pub operation: String,
    /// Ability the operation requires.
    pub ability: String,
    /// Resource the operation targets.
    pub resource: String,
}
