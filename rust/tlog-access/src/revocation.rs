//! Standing to revoke a credential.
//!
//! A principal may revoke a credential it issued, or any credential whose
//! proofs lead back to a credential it issued. Being the audience of a
//! credential in the chain confers nothing: only issuers are upstream.

use tracing::debug;

use crate::{
    AuthorizationError, Credential, ProofResolver,
    sync::ConditionalSend,
    traversal::{Traversal, TraversalLimits, walk},
};

/// Returns whether `revoker` issued `target` or any credential among its
/// transitive proofs.
///
/// Every resolvable proof is followed, linked or not. Fails with
/// `DepthExceeded` when the search was cut short without a match.
pub async fn is_upstream_or_self<C, R>(
    revoker: &str,
    target: &C,
    resolver: &R,
    limits: TraversalLimits,
) -> Result<bool, AuthorizationError>
where
    C: Credential + ConditionalSend,
    R: ProofResolver<C> + ?Sized,
{
    let outcome = walk(
        target,
        resolver,
        limits,
        |_, _| true,
        |candidate| candidate.issuer() == revoker,
    )
    .await;

    match outcome {
        Traversal::Reached { depth } => {
            debug!(revoker, depth, "Revoker is upstream of target");
            Ok(true)
        }
        Traversal::Exhausted => Ok(false),
        Traversal::Truncated => Err(AuthorizationError::depth_exceeded(&format!(
            "max depth {} / max visits {} while looking for {}",
            limits.max_depth, limits.max_visits, revoker
        ))),
    }
}

/// Like [`is_upstream_or_self`], failing with `RevocationNotAuthorized`
/// instead of returning `false`.
pub async fn authorize_revocation<C, R>(
    revoker: &str,
    target: &C,
    resolver: &R,
    limits: TraversalLimits,
) -> Result<(), AuthorizationError>
where
    C: Credential + ConditionalSend,
    R: ProofResolver<C> + ?Sized,
{
    if is_upstream_or_self(revoker, target, resolver, limits).await? {
        Ok(())
    } else {
        Err(AuthorizationError::revocation_not_authorized(revoker))
    }
}
