//! Error types for authorization decisions.
//!
//! Every rejection produced by the engine is an [`AuthorizationError`]: an
//! [`ErrorKind`] suitable for programmatic handling plus a free-text message
//! for audit logs. Kinds that originate in external collaborators (signature
//! verification, parsing, block fetches) are carried through unchanged.

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Machine-checkable classification of an authorization failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // Credential envelope
    /// The credential's expiration is in the past.
    Expired,
    /// The credential is not addressed to the expected audience.
    WrongAudience,

    // Capability checks
    /// A required ability is not granted by the credential.
    MissingCapability,
    /// A required ability is granted, but for another resource.
    WrongResource,
    /// The credential's capabilities name more than one resource.
    MismatchedResources,

    // External collaborators
    /// Signature verification of the credential envelope failed.
    InvalidSignature,
    /// Credential bytes could not be decoded.
    ParseError,
    /// A referenced block does not exist.
    NotFound,
    /// A referenced block could not be fetched. Possibly transient.
    FetchError,

    // Authority
    /// The proof chain does not trace back to the root principal.
    NoAuthority,
    /// The traversal bound was hit before authority could be established.
    DepthExceeded,
    /// A delegated (or non-owner issued) credential was used for erase.
    NotDirect,
    /// The principal has no standing to revoke the credential.
    RevocationNotAuthorized,
    /// The invoker is not the issuer of the credential.
    InvocationNotAuthorized,

    /// A collaborator violated an internal invariant (e.g. poisoned lock).
    Internal,
}

impl ErrorKind {
    /// Returns `true` if retrying the same request might succeed.
    ///
    /// The engine itself never retries.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::FetchError)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Expired => "Expired",
            ErrorKind::WrongAudience => "WrongAudience",
            ErrorKind::MissingCapability => "MissingCapability",
            ErrorKind::WrongResource => "WrongResource",
            ErrorKind::MismatchedResources => "MismatchedResources",
            ErrorKind::InvalidSignature => "InvalidSignature",
            ErrorKind::ParseError => "ParseError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::FetchError => "FetchError",
            ErrorKind::NoAuthority => "NoAuthority",
            ErrorKind::DepthExceeded => "DepthExceeded",
            ErrorKind::NotDirect => "NotDirect",
            ErrorKind::RevocationNotAuthorized => "RevocationNotAuthorized",
            ErrorKind::InvocationNotAuthorized => "InvocationNotAuthorized",
            ErrorKind::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// A terminal authorization rejection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct AuthorizationError {
    /// The error classification
    pub kind: ErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl AuthorizationError {
    /// Create a new authorization error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The error classification.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    // Convenience constructors for the engine's own rejections

    /// Credential expired at `expiration`, evaluated at `now`.
    pub fn expired(expiration: u64, now: u64) -> Self {
        Self::new(
            ErrorKind::Expired,
            format!("Credential expired at {} (now {})", expiration, now),
        )
    }

    /// Credential addressed to `got` instead of `expected`.
    pub fn wrong_audience(expected: &str, got: &str) -> Self {
        Self::new(
            ErrorKind::WrongAudience,
            format!("Audience mismatch: expected {}, got {}", expected, got),
        )
    }

    /// Credential does not grant `ability`.
    pub fn missing_capability(ability: &str) -> Self {
        Self::new(
            ErrorKind::MissingCapability,
            format!("Missing capability: {}", ability),
        )
    }

    /// Credential grants `ability` over `got` instead of `expected`.
    pub fn wrong_resource(ability: &str, expected: &str, got: &str) -> Self {
        Self::new(
            ErrorKind::WrongResource,
            format!(
                "Capability {} is scoped to {}, expected {}",
                ability, got, expected
            ),
        )
    }

    /// Credential capabilities disagree on their resource.
    pub fn mismatched_resources(first: &str, other: &str) -> Self {
        Self::new(
            ErrorKind::MismatchedResources,
            format!("Capabilities name different resources: {} and {}", first, other),
        )
    }

    /// Proof chain of a credential issued by `issuer` does not reach `root`.
    pub fn no_authority(issuer: &str, root: &str) -> Self {
        Self::new(
            ErrorKind::NoAuthority,
            format!(
                "No proof chain from {} traces back to root principal {}",
                issuer, root
            ),
        )
    }

    /// Traversal gave up after hitting `limit`.
    pub fn depth_exceeded(limit: &str) -> Self {
        Self::new(
            ErrorKind::DepthExceeded,
            format!("Proof traversal exceeded {}", limit),
        )
    }

    /// Erase credential is not issued first-hand by the owner.
    pub fn not_direct(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotDirect, message)
    }

    /// `revoker` is neither the issuer nor upstream of the target.
    pub fn revocation_not_authorized(revoker: &str) -> Self {
        Self::new(
            ErrorKind::RevocationNotAuthorized,
            format!("{} is not upstream of the credential", revoker),
        )
    }

    /// `invoker` tried to use a credential issued by `issuer`.
    pub fn invocation_not_authorized(invoker: &str, issuer: &str) -> Self {
        Self::new(
            ErrorKind::InvocationNotAuthorized,
            format!(
                "Invoker {} is not the credential issuer {}",
                invoker, issuer
            ),
        )
    }

    // Constructors for collaborator failures

    /// Signature verification failed.
    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSignature, message)
    }

    /// Decoding failed.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    /// Block `id` does not exist.
    pub fn not_found(id: impl Display) -> Self {
        Self::new(ErrorKind::NotFound, format!("Block not found: {}", id))
    }

    /// Block fetch failed.
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FetchError, message)
    }

    /// Internal invariant violated.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}
