use crate::{AuthorizationError, Credential};

/// Require `invoker` to be the issuer of the credential it presents.
///
/// Possessing a credential is not enough to use it: the party signing the
/// operation must be the one that issued the credential. This holds even for
/// the credential's audience, and closes the door on intercepted or replayed
/// credentials.
pub fn validate_invoker<C: Credential + ?Sized>(
    invoker: &str,
    credential: &C,
) -> Result<(), AuthorizationError> {
    if invoker != credential.issuer() {
        return Err(AuthorizationError::invocation_not_authorized(
            invoker,
            credential.issuer(),
        ));
    }
    Ok(())
}
