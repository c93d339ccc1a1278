//! Policy for permanently erasing data.
//!
//! Erase is the one ability that can never travel through a delegation
//! chain. A credential used for it must be issued first-hand by the resource
//! owner and carry no proofs at all, whether or not those proofs would trace
//! back to the owner.

use tlog_capability::Requirement;

use crate::{
    AuthorizationError, Credential,
    direct::{check_audience, check_expiration},
    time::Timestamp,
};

/// Validate a credential for an erase operation.
///
/// Checks, in order:
/// 1. the audience is `expected_audience`
/// 2. the credential is not expired at `now`
/// 3. the issuer is `owner` (`NotDirect` otherwise)
/// 4. the credential carries no proofs (`NotDirect` otherwise)
/// 5. the credential lists exactly `requirement.ability` over
///    `requirement.resource` (`MissingCapability` otherwise)
pub fn validate_for_erase<C: Credential + ?Sized>(
    credential: &C,
    expected_audience: &str,
    owner: &str,
    requirement: &Requirement,
    now: Timestamp,
) -> Result<(), AuthorizationError> {
    check_audience(credential, expected_audience)?;
    check_expiration(credential, now)?;

    if credential.issuer() != owner {
        return Err(AuthorizationError::not_direct(format!(
            "Erase credential issued by {}, not by owner {}",
            credential.issuer(),
            owner
        )));
    }

    if !credential.proofs().is_empty() {
        return Err(AuthorizationError::not_direct(format!(
            "Erase credential carries {} proof(s); it must be issued directly",
            credential.proofs().len()
        )));
    }

    let granted = credential
        .capabilities()
        .iter()
        .any(|c| c.can() == requirement.ability && c.with() == requirement.resource);
    if !granted {
        return Err(AuthorizationError::missing_capability(&requirement.ability));
    }

    Ok(())
}
