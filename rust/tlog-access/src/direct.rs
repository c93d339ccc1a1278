//! Checks on a single credential, without looking at its proofs.
//!
//! These are the cheap, local checks that run before any proof resolution.
//! Each function returns the first failing check as an error; nothing is
//! aggregated.

use std::collections::HashMap;
use tlog_capability::Capability;
use tracing::debug;

use crate::{
    AuthorizationError, Credential, ErrorKind,
    time::{Timestamp, is_expired},
};

/// Require the credential to be addressed to `expected`.
pub fn check_audience<C: Credential + ?Sized>(
    credential: &C,
    expected: &str,
) -> Result<(), AuthorizationError> {
    if credential.audience() != expected {
        return Err(AuthorizationError::wrong_audience(
            expected,
            credential.audience(),
        ));
    }
    Ok(())
}

/// Require the credential not to be expired at `now`.
pub fn check_expiration<C: Credential + ?Sized>(
    credential: &C,
    now: Timestamp,
) -> Result<(), AuthorizationError> {
    match credential.expiration() {
        Some(expiration) if is_expired(Some(expiration), now) => {
            Err(AuthorizationError::expired(expiration, now))
        }
        _ => Ok(()),
    }
}

/// Validate a credential in isolation for an operation class.
///
/// Checks, in order:
/// 1. the audience is `expected_audience`
/// 2. the credential is not expired at `now`
/// 3. every ability in `required` is listed by the credential
/// 4. each of those abilities is scoped to `expected_resource`
///
/// Abilities are matched exactly. When a credential lists the same ability
/// more than once, the last listing decides its resource.
pub fn validate_direct<C, I, S>(
    credential: &C,
    expected_audience: &str,
    expected_resource: &str,
    required: I,
    now: Timestamp,
) -> Result<(), AuthorizationError>
where
    C: Credential + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    check_audience(credential, expected_audience)?;
    check_expiration(credential, now)?;

    let granted = ability_map(credential.capabilities());
    for ability in required {
        let ability = ability.as_ref();
        let Some(resource) = granted.get(ability) else {
            return Err(AuthorizationError::missing_capability(ability));
        };
        if *resource != expected_resource {
            return Err(AuthorizationError::wrong_resource(
                ability,
                expected_resource,
                resource,
            ));
        }
    }

    Ok(())
}

/// Ability → resource, last listing wins.
fn ability_map(capabilities: &[Capability]) -> HashMap<&str, &str> {
    let mut granted = HashMap::with_capacity(capabilities.len());
    for capability in capabilities {
        if let Some(previous) = granted.insert(capability.can(), capability.with()) {
            if previous != capability.with() {
                debug!(
                    ability = capability.can(),
                    previous,
                    resource = capability.with(),
                    "Duplicate ability; later resource takes precedence"
                );
            }
        }
    }
    granted
}

/// The single resource shared by all of the credential's capabilities.
pub fn extract_resource<C: Credential + ?Sized>(
    credential: &C,
) -> Result<&str, AuthorizationError> {
    let mut capabilities = credential.capabilities().iter();
    let Some(first) = capabilities.next() else {
        return Err(AuthorizationError::new(
            ErrorKind::MissingCapability,
            "Credential grants no capabilities",
        ));
    };

    for capability in capabilities {
        if capability.with() != first.with() {
            return Err(AuthorizationError::mismatched_resources(
                first.with(),
                capability.with(),
            ));
        }
    }

    Ok(first.with())
}

/// Find a capability that allows `ability` over `resource`, using the
/// hierarchical ability algebra.
///
/// Fails with `WrongResource` when some capability would allow the ability
/// but only over other resources, and `MissingCapability` otherwise.
pub fn check_grant<'a, C: Credential + ?Sized>(
    credential: &'a C,
    ability: &str,
    resource: &str,
) -> Result<&'a Capability, AuthorizationError> {
    let mut elsewhere = None;
    for capability in credential.capabilities() {
        if capability.allows(ability, resource) {
            return Ok(capability);
        }
        if elsewhere.is_none() && tlog_capability::allows(capability.can(), ability) {
            elsewhere = Some(capability.with());
        }
    }

    match elsewhere {
        Some(other) => Err(AuthorizationError::wrong_resource(ability, resource, other)),
        None => Err(AuthorizationError::missing_capability(ability)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Delegation;
    use proptest::prelude::*;
    use tlog_capability::{WILDCARD, abilities};

    const SERVICE: &str = "did:key:zService";
    const SPACE: &str = "did:key:zSpace";
    const NOW: Timestamp = 1_700_000_000;

    fn credential() -> Delegation {
        Delegation::new(SPACE, SERVICE)
            .grant(abilities::APPEND, SPACE)
            .grant(abilities::READ, SPACE)
    }

    #[test]
    fn it_accepts_a_matching_credential() {
        let result = validate_direct(
            &credential(),
            SERVICE,
            SPACE,
            [abilities::APPEND, abilities::READ],
            NOW,
        );
        assert!(result.is_ok(), "Expected success, got {:?}", result);
    }

    #[test]
    fn it_rejects_wrong_audience_first() {
        // Also expired and missing the ability; audience is reported.
        let credential = Delegation::new(SPACE, "did:key:zOther").expires(NOW - 1);

        let error =
            validate_direct(&credential, SERVICE, SPACE, [abilities::REVOKE], NOW).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::WrongAudience);
    }

    #[test]
    fn it_rejects_expired_before_capability_checks() {
        let credential = Delegation::new(SPACE, SERVICE).expires(NOW - 1);

        let error =
            validate_direct(&credential, SERVICE, SPACE, [abilities::REVOKE], NOW).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Expired);
    }

    #[test]
    fn it_rejects_missing_capability() {
        let error = validate_direct(&credential(), SERVICE, SPACE, [abilities::REVOKE], NOW)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingCapability);
        assert!(error.message.contains(abilities::REVOKE));
    }

    #[test]
    fn it_matches_abilities_exactly() {
        let credential = Delegation::new(SPACE, SERVICE).grant(abilities::ADMIN, SPACE);

        let error =
            validate_direct(&credential, SERVICE, SPACE, [abilities::REVOKE], NOW).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingCapability);
    }

    #[test]
    fn it_rejects_wrong_resource() {
        let credential = Delegation::new(SPACE, SERVICE).grant(abilities::APPEND, "did:key:zOther");

        let error =
            validate_direct(&credential, SERVICE, SPACE, [abilities::APPEND], NOW).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::WrongResource);
    }

    #[test]
    fn it_lets_the_last_duplicate_ability_win() {
        let credential = Delegation::new(SPACE, SERVICE)
            .grant(abilities::APPEND, SPACE)
            .grant(abilities::APPEND, "did:key:zOther");
        let error =
            validate_direct(&credential, SERVICE, SPACE, [abilities::APPEND], NOW).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::WrongResource);

        let credential = Delegation::new(SPACE, SERVICE)
            .grant(abilities::APPEND, "did:key:zOther")
            .grant(abilities::APPEND, SPACE);
        assert!(validate_direct(&credential, SERVICE, SPACE, [abilities::APPEND], NOW).is_ok());
    }

    #[test]
    fn it_accepts_empty_requirements_but_still_checks_envelope() {
        let empty: [&str; 0] = [];
        let credential = Delegation::new(SPACE, SERVICE);
        assert!(validate_direct(&credential, SERVICE, SPACE, empty, NOW).is_ok());

        let expired = credential.expires(NOW - 10);
        let error = validate_direct(&expired, SERVICE, SPACE, empty, NOW).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Expired);
    }

    #[test]
    fn it_extracts_common_resource() {
        assert_eq!(extract_resource(&credential()).ok(), Some(SPACE));
    }

    #[test]
    fn it_rejects_extracting_from_empty_capabilities() {
        let error = extract_resource(&Delegation::new(SPACE, SERVICE)).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingCapability);
    }

    #[test]
    fn it_rejects_extracting_from_mixed_resources() {
        let credential = credential().grant(abilities::REVOKE, "did:key:zOther");

        let error = extract_resource(&credential).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MismatchedResources);
    }

    #[test]
    fn it_grants_through_ability_hierarchy() {
        let credential = Delegation::new(SPACE, SERVICE).grant(abilities::ADMIN, SPACE);

        let capability = check_grant(&credential, abilities::REVOKE, SPACE).unwrap();
        assert_eq!(capability.can(), abilities::ADMIN);
    }

    #[test]
    fn it_distinguishes_wrong_resource_from_missing_grant() {
        let elsewhere = Delegation::new(SPACE, SERVICE).grant(WILDCARD, "did:key:zOther");

        let error = check_grant(&elsewhere, abilities::APPEND, SPACE).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::WrongResource);

        let error = check_grant(&credential(), abilities::REVOKE, SPACE).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingCapability);
    }

    #[test]
    fn it_never_grants_from_empty_capabilities() {
        let credential = Delegation::new(SPACE, SERVICE);

        let error = check_grant(&credential, abilities::READ, SPACE).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingCapability);
    }

    proptest! {
        #[test]
        fn expiration_is_rejected_iff_in_the_past(
            expiration in proptest::option::of(0u64..2_000_000_000),
            now in 0u64..2_000_000_000,
        ) {
            let mut credential = credential();
            credential.expiration = expiration;

            let result = validate_direct(&credential, SERVICE, SPACE, [abilities::APPEND], now);
            let expired = matches!(expiration, Some(exp) if now > exp);

            prop_assert_eq!(
                result.as_ref().err().map(|e| e.kind()) == Some(ErrorKind::Expired),
                expired
            );
            prop_assert_eq!(result.is_ok(), !expired);
        }
    }
}
