//! Proof-chain authority: does a credential's authority come from the
//! resource owner?
//!
//! A credential issued by the root principal is authoritative on its own.
//! Otherwise one of its proofs must be a credential addressed _to_ its
//! issuer, and that proof must in turn be issued by the root or be backed by
//! such a chain. A proof addressed to somebody else grants the issuer
//! nothing and is ignored, so stolen credentials cannot be spliced into a
//! chain.
//!
//! ```text
//!  Owner ──▶ A ──▶ B ──▶ Service
//!  (root)   proof  proof  presented
//! ```

use tracing::debug;

use crate::{
    AuthorizationError, Credential, ProofResolver,
    sync::ConditionalSend,
    traversal::{Traversal, TraversalLimits, walk},
};

/// Walk the proof graph of `credential` looking for the root principal.
pub async fn trace_to_root<C, R>(
    credential: &C,
    root: &str,
    resolver: &R,
    limits: TraversalLimits,
) -> Traversal
where
    C: Credential + ConditionalSend,
    R: ProofResolver<C> + ?Sized,
{
    walk(
        credential,
        resolver,
        limits,
        |parent, proof| proof.audience() == parent.issuer(),
        |candidate| candidate.issuer() == root,
    )
    .await
}

/// Returns whether `credential`'s authority traces back to `root`.
///
/// Fails with `DepthExceeded` when no chain reached the root and at least
/// one branch was cut short by `limits`; the answer is then unknown, and
/// unknown is a rejection.
pub async fn traces_to_root<C, R>(
    credential: &C,
    root: &str,
    resolver: &R,
    limits: TraversalLimits,
) -> Result<bool, AuthorizationError>
where
    C: Credential + ConditionalSend,
    R: ProofResolver<C> + ?Sized,
{
    match trace_to_root(credential, root, resolver, limits).await {
        Traversal::Reached { depth } => {
            debug!(root, depth, "Proof chain traces to root");
            Ok(true)
        }
        Traversal::Exhausted => Ok(false),
        Traversal::Truncated => Err(AuthorizationError::depth_exceeded(&format!(
            "max depth {} / max visits {} while tracing to {}",
            limits.max_depth, limits.max_visits, root
        ))),
    }
}

/// Like [`traces_to_root`], failing with `NoAuthority` instead of returning
/// `false`.
pub async fn require_root_authority<C, R>(
    credential: &C,
    root: &str,
    resolver: &R,
    limits: TraversalLimits,
) -> Result<(), AuthorizationError>
where
    C: Credential + ConditionalSend,
    R: ProofResolver<C> + ?Sized,
{
    if traces_to_root(credential, root, resolver, limits).await? {
        Ok(())
    } else {
        Err(AuthorizationError::no_authority(credential.issuer(), root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ErrorKind,
        memory::{Delegation, MemoryBlocks},
    };
    use testresult::TestResult;
    use tlog_capability::abilities;

    const OWNER: &str = "did:key:zOwner";
    const SPACE: &str = "did:key:zSpace";

    #[tokio::test]
    async fn it_accepts_root_issued_credential_regardless_of_proofs() -> TestResult {
        let blocks = MemoryBlocks::new();
        let bogus = blocks.insert(&Delegation::new("did:key:zX", "did:key:zY"))?;
        let credential = Delegation::new(OWNER, "did:key:zAgent")
            .grant(abilities::APPEND, SPACE)
            .proof(bogus);

        assert!(traces_to_root(&credential, OWNER, &blocks.resolver(), Default::default()).await?);
        Ok(())
    }

    #[tokio::test]
    async fn it_ignores_proofs_addressed_to_someone_else() -> TestResult {
        let blocks = MemoryBlocks::new();
        // Owner delegated to Alice; Mallory presents Alice's proof as her own.
        let stolen = blocks.insert(&Delegation::new(OWNER, "did:key:zAlice"))?;
        let credential = Delegation::new("did:key:zMallory", "did:key:zService")
            .grant(abilities::APPEND, SPACE)
            .proof(stolen);

        assert!(!traces_to_root(&credential, OWNER, &blocks.resolver(), Default::default()).await?);
        Ok(())
    }

    #[tokio::test]
    async fn it_skips_unresolvable_proofs() -> TestResult {
        let blocks = MemoryBlocks::new();
        let missing = Delegation::new(OWNER, "did:key:zA")
            .grant(abilities::READ, SPACE)
            .to_cid()?;
        let present = blocks.insert(&Delegation::new(OWNER, "did:key:zA"))?;
        let resolver = blocks.resolver();

        let only_missing = Delegation::new("did:key:zA", "did:key:zB").proof(missing);
        assert!(!traces_to_root(&only_missing, OWNER, &resolver, Default::default()).await?);

        let with_fallback = only_missing.proof(present);
        assert!(traces_to_root(&with_fallback, OWNER, &resolver, Default::default()).await?);
        Ok(())
    }

    #[tokio::test]
    async fn it_traces_through_shared_proof_under_second_parent() -> TestResult {
        let blocks = MemoryBlocks::new();
        let root = blocks.insert(&Delegation::new(OWNER, "did:key:zC"))?;
        // Both proofs cite `root`, but only the second is issued by its audience.
        let unlinked = blocks.insert(&Delegation::new("did:key:zQ", "did:key:zA").proof(root))?;
        let linked = blocks.insert(&Delegation::new("did:key:zC", "did:key:zA").proof(root))?;
        let resolver = blocks.resolver();

        let both = Delegation::new("did:key:zA", "did:key:zService")
            .proof(unlinked)
            .proof(linked);
        assert!(traces_to_root(&both, OWNER, &resolver, Default::default()).await?);

        let reversed = Delegation::new("did:key:zA", "did:key:zService")
            .proof(linked)
            .proof(unlinked);
        assert!(traces_to_root(&reversed, OWNER, &resolver, Default::default()).await?);
        Ok(())
    }

    #[tokio::test]
    async fn it_traces_through_shared_proof_first_reached_too_deep() -> TestResult {
        let blocks = MemoryBlocks::new();
        let root = blocks.insert(&Delegation::new(OWNER, "did:key:zK"))?;
        let shared = blocks.insert(&Delegation::new("did:key:zK", "did:key:zN").proof(root))?;
        // Long branch: P ← Q ← N ← shared, explored first.
        let far = blocks.insert(&Delegation::new("did:key:zN", "did:key:zQ").proof(shared))?;
        let long = blocks.insert(&Delegation::new("did:key:zQ", "did:key:zP").proof(far))?;
        // Short branch: P ← N ← shared.
        let short = blocks.insert(&Delegation::new("did:key:zN", "did:key:zP").proof(shared))?;
        let leaf = Delegation::new("did:key:zP", "did:key:zService")
            .proof(long)
            .proof(short);
        let limits = TraversalLimits {
            max_depth: 3,
            ..Default::default()
        };

        let outcome = trace_to_root(&leaf, OWNER, &blocks.resolver(), limits).await;
        assert_eq!(outcome, Traversal::Reached { depth: 3 });
        assert!(traces_to_root(&leaf, OWNER, &blocks.resolver(), limits).await?);
        Ok(())
    }

    #[tokio::test]
    async fn it_terminates_on_cycles() -> TestResult {
        let blocks = MemoryBlocks::new();
        let to_a = Delegation::new("did:key:zB", "did:key:zA");
        let to_b = Delegation::new("did:key:zA", "did:key:zB");
        let to_a_cid = to_a.to_cid()?;
        let to_b_cid = to_b.to_cid()?;
        // Each is proven by the other.
        blocks.put_at(to_a_cid, to_a.proof(to_b_cid).to_bytes()?)?;
        blocks.put_at(to_b_cid, to_b.proof(to_a_cid).to_bytes()?)?;

        let leaf = Delegation::new("did:key:zA", "did:key:zService").proof(to_a_cid);
        let traced = traces_to_root(&leaf, OWNER, &blocks.resolver(), Default::default()).await?;

        assert!(!traced);
        Ok(())
    }

    #[tokio::test]
    async fn it_fails_closed_when_depth_is_exceeded() -> TestResult {
        let blocks = MemoryBlocks::new();
        let mut principal = OWNER.to_string();
        let mut proof = None;
        for n in 0..6 {
            let next = format!("did:key:zHop{n}");
            let mut delegation = Delegation::new(principal.clone(), next.clone());
            if let Some(cid) = proof {
                delegation = delegation.proof(cid);
            }
            proof = Some(blocks.insert(&delegation)?);
            principal = next;
        }
        let mut leaf = Delegation::new(principal, "did:key:zService");
        if let Some(cid) = proof {
            leaf = leaf.proof(cid);
        }

        let limits = TraversalLimits {
            max_depth: 3,
            ..Default::default()
        };
        let error = require_root_authority(&leaf, OWNER, &blocks.resolver(), limits)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::DepthExceeded);

        require_root_authority(&leaf, OWNER, &blocks.resolver(), Default::default()).await?;
        Ok(())
    }

    #[tokio::test]
    async fn it_reports_no_authority() {
        let blocks = MemoryBlocks::new();
        let credential = Delegation::new("did:key:zEve", "did:key:zService").grant(abilities::APPEND, SPACE);

        let error = require_root_authority(&credential, OWNER, &blocks.resolver(), Default::default())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NoAuthority);
    }
}
