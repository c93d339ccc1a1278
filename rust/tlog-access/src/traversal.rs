//! Bounded traversal of a credential's proof graph.
//!
//! Both authority questions the engine answers ("does this credential trace
//! to the owner?" and "is this principal upstream of that credential?") are
//! searches over the same graph: credentials are nodes and proof references
//! are edges. Proof graphs arrive from untrusted clients, so the search is an
//! iterative depth-first worklist that
//!
//! - descends into a proof CID again only when it is reached at a shallower
//!   depth than before, which defuses cycles,
//! - never descends more than [`TraversalLimits::max_depth`] hops below the
//!   presented credential,
//! - stops after [`TraversalLimits::max_visits`] proof resolutions.
//!
//! A proof is only recorded once it has been accepted as an edge. The same
//! proof may link to one parent and not another (its audience must match
//! the parent's issuer), so rejecting it under one parent says nothing about
//! the next.
//!
//! Resolution of the proofs of a single credential happens concurrently.
//! Traversal state is owned by one walk; nothing is shared between walks.

use futures::future::join_all;
use ipld_core::cid::Cid;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{trace, warn};

use crate::{Credential, ProofResolver, sync::ConditionalSend};

/// Hard bounds on a single proof-graph traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalLimits {
    /// Maximum number of delegation hops below the presented credential.
    pub max_depth: usize,
    /// Maximum number of proof resolutions in one traversal.
    pub max_visits: usize,
}

impl TraversalLimits {
    /// Default maximum delegation hops.
    pub const DEFAULT_MAX_DEPTH: usize = 16;
    /// Default maximum resolved proofs.
    pub const DEFAULT_MAX_VISITS: usize = 256;
}

impl Default for TraversalLimits {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_visits: Self::DEFAULT_MAX_VISITS,
        }
    }
}

/// How a traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// A credential satisfying the goal was found `depth` hops below the
    /// presented one (`0` for the presented credential itself).
    Reached {
        /// Hops from the presented credential.
        depth: usize,
    },
    /// Every reachable branch was explored without reaching the goal.
    Exhausted,
    /// The goal was not reached and at least one branch was cut short by
    /// [`TraversalLimits`].
    Truncated,
}

impl Traversal {
    /// Returns `true` if the goal was reached.
    pub fn is_reached(&self) -> bool {
        matches!(self, Traversal::Reached { .. })
    }
}

/// Search the proof graph below `start` for a credential satisfying `goal`.
///
/// `follow(parent, proof)` decides whether a resolved proof is a valid edge
/// out of `parent`; rejected proofs are neither tested nor descended into.
/// Unresolvable proofs end their branch silently.
pub async fn walk<C, R, F, G>(
    start: &C,
    resolver: &R,
    limits: TraversalLimits,
    follow: F,
    goal: G,
) -> Traversal
where
    C: Credential + ConditionalSend,
    R: ProofResolver<C> + ?Sized,
    F: Fn(&C, &C) -> bool,
    G: Fn(&C) -> bool,
{
    if goal(start) {
        return Traversal::Reached { depth: 0 };
    }

    let mut walker = Walker {
        resolver,
        limits,
        followed: HashMap::new(),
        resolved: 0,
        truncated: false,
    };

    let mut stack: Vec<(Cid, C, usize)> = Vec::new();
    let proofs = walker.expand(start, 1).await;
    if let Some(depth) = walker.push(&mut stack, start, proofs, 1, &follow, &goal) {
        return Traversal::Reached { depth };
    }

    while let Some((cid, credential, depth)) = stack.pop() {
        if walker.followed_above(&cid, depth) {
            trace!(%cid, depth, "Proof since followed at a shallower depth");
            continue;
        }
        let proofs = walker.expand(&credential, depth + 1).await;
        if let Some(reached) =
            walker.push(&mut stack, &credential, proofs, depth + 1, &follow, &goal)
        {
            return Traversal::Reached { depth: reached };
        }
    }

    if walker.truncated {
        Traversal::Truncated
    } else {
        Traversal::Exhausted
    }
}

struct Walker<'a, R: ?Sized> {
    resolver: &'a R,
    limits: TraversalLimits,
    /// Shallowest depth at which each proof was accepted as an edge.
    followed: HashMap<Cid, usize>,
    /// Proof resolutions performed so far, bounded by `max_visits`.
    resolved: usize,
    truncated: bool,
}

impl<R: ?Sized> Walker<'_, R> {
    /// Returns `true` if `proof` was already followed at `depth` or above.
    fn followed_at_or_above(&self, proof: &Cid, depth: usize) -> bool {
        self.followed
            .get(proof)
            .is_some_and(|followed| *followed <= depth)
    }

    /// Returns `true` if `proof` was followed strictly above `depth`.
    fn followed_above(&self, proof: &Cid, depth: usize) -> bool {
        self.followed
            .get(proof)
            .is_some_and(|followed| *followed < depth)
    }

    /// Resolve the proofs of `parent`, which sit at `depth`.
    ///
    /// A proof already followed at `depth` or above has nothing new to
    /// offer and is skipped. One only resolved under a parent it did not
    /// link to is resolved again, since this parent may accept it.
    async fn expand<C>(&mut self, parent: &C, depth: usize) -> Vec<(Cid, C)>
    where
        C: Credential + ConditionalSend,
        R: ProofResolver<C>,
    {
        if parent.proofs().is_empty() {
            return Vec::new();
        }

        if depth > self.limits.max_depth {
            warn!(
                depth,
                max_depth = self.limits.max_depth,
                issuer = parent.issuer(),
                "Proof chain exceeds maximum depth"
            );
            self.truncated = true;
            return Vec::new();
        }

        let mut pending: Vec<&Cid> = Vec::with_capacity(parent.proofs().len());
        for proof in parent.proofs() {
            if self.followed_at_or_above(proof, depth) {
                trace!(%proof, depth, "Proof already followed");
                continue;
            }
            if self.resolved >= self.limits.max_visits {
                warn!(
                    max_visits = self.limits.max_visits,
                    "Proof traversal exceeds maximum visits"
                );
                self.truncated = true;
                break;
            }
            self.resolved += 1;
            pending.push(proof);
        }

        trace!(depth, count = pending.len(), "Resolving proofs");
        let resolver = self.resolver;
        join_all(pending.into_iter().map(|proof| async move {
            resolver
                .resolve(proof)
                .await
                .map(|credential| (*proof, credential))
        }))
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    /// Test the resolved proofs of `parent` against the goal and queue the
    /// ones worth descending into. Returns the depth at which the goal was
    /// reached, if it was.
    fn push<C, F, G>(
        &mut self,
        stack: &mut Vec<(Cid, C, usize)>,
        parent: &C,
        proofs: Vec<(Cid, C)>,
        depth: usize,
        follow: &F,
        goal: &G,
    ) -> Option<usize>
    where
        C: Credential,
        F: Fn(&C, &C) -> bool,
        G: Fn(&C) -> bool,
    {
        let mut next = Vec::with_capacity(proofs.len());
        for (cid, proof) in proofs {
            if !follow(parent, &proof) {
                trace!(
                    issuer = proof.issuer(),
                    audience = proof.audience(),
                    "Ignoring proof that does not link to its parent"
                );
                continue;
            }
            if goal(&proof) {
                return Some(depth);
            }
            if self.followed_at_or_above(&cid, depth) {
                continue;
            }
            self.followed.insert(cid, depth);
            next.push((cid, proof, depth));
        }

        // Reversed so the first listed proof is explored first.
        stack.extend(next.into_iter().rev());
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Delegation, MemoryBlocks};
    use testresult::TestResult;

    #[tokio::test]
    async fn it_reaches_the_start_without_resolving() {
        let blocks = MemoryBlocks::new();
        let start = Delegation::new("did:key:zOwner", "did:key:zAgent");

        let outcome = walk(
            &start,
            &blocks.resolver(),
            TraversalLimits::default(),
            |_, _| true,
            |c: &Delegation| c.issuer == "did:key:zOwner",
        )
        .await;

        assert_eq!(outcome, Traversal::Reached { depth: 0 });
    }

    #[tokio::test]
    async fn it_reports_depth_of_reached_proof() -> TestResult {
        let blocks = MemoryBlocks::new();
        let root = blocks.insert(&Delegation::new("did:key:zOwner", "did:key:zA"))?;
        let middle = blocks.insert(&Delegation::new("did:key:zA", "did:key:zB").proof(root))?;
        let leaf = Delegation::new("did:key:zB", "did:key:zC").proof(middle);

        let outcome = walk(
            &leaf,
            &blocks.resolver(),
            TraversalLimits::default(),
            |_, _| true,
            |c: &Delegation| c.issuer == "did:key:zOwner",
        )
        .await;

        assert_eq!(outcome, Traversal::Reached { depth: 2 });
        Ok(())
    }

    #[tokio::test]
    async fn it_distinguishes_truncated_from_exhausted() -> TestResult {
        let blocks = MemoryBlocks::new();
        let root = blocks.insert(&Delegation::new("did:key:zOwner", "did:key:zA"))?;
        let middle = blocks.insert(&Delegation::new("did:key:zA", "did:key:zB").proof(root))?;
        let leaf = Delegation::new("did:key:zB", "did:key:zC").proof(middle);
        let resolver = blocks.resolver();

        let shallow = TraversalLimits {
            max_depth: 1,
            ..Default::default()
        };
        let unreachable = |c: &Delegation| c.issuer == "did:key:zNobody";

        assert_eq!(
            walk(&leaf, &resolver, shallow, |_, _| true, unreachable).await,
            Traversal::Truncated
        );
        assert_eq!(
            walk(&leaf, &resolver, TraversalLimits::default(), |_, _| true, unreachable).await,
            Traversal::Exhausted
        );
        Ok(())
    }

    #[tokio::test]
    async fn it_stops_after_max_visits() -> TestResult {
        let blocks = MemoryBlocks::new();
        let mut leaf = Delegation::new("did:key:zA", "did:key:zB");
        for n in 0..8 {
            let sibling = Delegation::new(format!("did:key:zSibling{n}"), "did:key:zA");
            leaf = leaf.proof(blocks.insert(&sibling)?);
        }

        let limits = TraversalLimits {
            max_visits: 3,
            ..Default::default()
        };
        let outcome = walk(
            &leaf,
            &blocks.resolver(),
            limits,
            |_, _| true,
            |c: &Delegation| c.issuer == "did:key:zSibling7",
        )
        .await;

        assert_eq!(outcome, Traversal::Truncated);
        Ok(())
    }
}
