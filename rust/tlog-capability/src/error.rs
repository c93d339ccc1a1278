/// Errors raised while building an [`AbilityTable`](crate::AbilityTable).
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The table could not be decoded from JSON.
    #[error("Invalid ability table: {0}")]
    Json(#[from] serde_json::Error),

    /// An operation maps to an ability that is not a valid path.
    #[error("Operation '{operation}' maps to malformed ability '{ability}'")]
    InvalidAbility {
        /// The operation name.
        operation: String,
        /// The rejected ability.
        ability: String,
    },
}
