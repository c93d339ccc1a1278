//! The credential model consumed by the engine.
//!
//! Parsing, signing and signature verification live outside this crate. The
//! engine only reads what the [`Credential`] trait exposes and never mutates
//! it.

use ipld_core::cid::Cid;
use std::sync::Arc;
use tlog_capability::Capability;

use crate::time::Timestamp;

/// A principal identifier (e.g. a `did:key`), compared as an opaque string.
pub type Did = String;

/// Read-only view of a delegated capability token.
pub trait Credential {
    /// Principal that issued (signed) the credential.
    fn issuer(&self) -> &str;

    /// Principal the credential is addressed to.
    fn audience(&self) -> &str;

    /// Unix time after which the credential is no longer valid. `None`
    /// means the credential does not expire.
    fn expiration(&self) -> Option<Timestamp>;

    /// Granted `(ability, resource)` pairs, in the order they were listed.
    fn capabilities(&self) -> &[Capability];

    /// Content addresses of the credentials proving the issuer's own
    /// authority. Empty for a credential issued by the root principal.
    fn proofs(&self) -> &[Cid];
}

impl<T: Credential + ?Sized> Credential for &T {
    fn issuer(&self) -> &str {
        (**self).issuer()
    }

    fn audience(&self) -> &str {
        (**self).audience()
    }

    fn expiration(&self) -> Option<Timestamp> {
        (**self).expiration()
    }

    fn capabilities(&self) -> &[Capability] {
        (**self).capabilities()
    }

    fn proofs(&self) -> &[Cid] {
        (**self).proofs()
    }
}

impl<T: Credential + ?Sized> Credential for Arc<T> {
    fn issuer(&self) -> &str {
        (**self).issuer()
    }

    fn audience(&self) -> &str {
        (**self).audience()
    }

    fn expiration(&self) -> Option<Timestamp> {
        (**self).expiration()
    }

    fn capabilities(&self) -> &[Capability] {
        (**self).capabilities()
    }

    fn proofs(&self) -> &[Cid] {
        (**self).proofs()
    }
}
