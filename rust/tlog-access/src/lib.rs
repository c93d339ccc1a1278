#![warn(missing_docs)]

//! Authorization decisions for a tamper-evident log.
//!
//! Clients present delegated capability credentials with every request. This
//! crate evaluates them; it never issues or signs anything, and it treats
//! parsing, signature verification and block storage as injected
//! collaborators (see [`resolver`]).
//!
//! # Overview
//!
//! The [`Authorizer`] decides a request in this order:
//!
//! 1. Look up the ability the operation requires in the [`AbilityTable`]
//!    (unknown operations require `*`)
//! 2. Check the credential is addressed to the service and not expired
//! 3. Check some capability allows the ability over the target resource
//! 4. Check the invoker is the credential's issuer
//! 5. Walk the proof graph until a credential issued by the resource owner
//!    is found
//!
//! Steps 1–4 are local. Step 5 resolves proofs through a [`ProofResolver`]
//! and is bounded by [`TraversalLimits`]; hitting a bound is a rejection.
//!
//! Abilities configured as direct-only (by default `blob/remove`) skip step 5
//! altogether: the credential must come straight from the owner with no
//! proofs, see [`erase`].
//!
//! Revocation uses a different question: did the revoker issue the target
//! credential or one of its ancestors? See [`revocation`].
//!
//! # Example
//!
//! ```rust
//! use tlog_access::{Authorizer, AuthorizerConfig, Request, memory::{Delegation, MemoryBlocks}};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), tlog_access::AuthorizationError> {
//! let blocks = MemoryBlocks::new();
//! let proof = blocks.insert(
//!     &Delegation::new("did:key:zOwner", "did:key:zAlice").grant("tlog/append", "did:key:zSpace"),
//! )?;
//! let credential = Delegation::new("did:key:zAlice", "did:key:zService")
//!     .grant("tlog/append", "did:key:zSpace")
//!     .proof(proof);
//!
//! let authorizer = Authorizer::new(AuthorizerConfig::new("did:key:zService"), blocks.resolver());
//! let grant = authorizer
//!     .authorize(&Request {
//!         operation: "append",
//!         resource: "did:key:zSpace",
//!         owner: "did:key:zOwner",
//!         invoker: "did:key:zAlice",
//!         credential: &credential,
//!     })
//!     .await?;
//!
//! assert_eq!(grant.ability, "tlog/append");
//! # Ok(())
//! # }
//! ```

pub mod authorizer;
pub mod chain;
pub mod config;
pub mod credential;
pub mod direct;
pub mod erase;
pub mod error;
pub mod invocation;
pub mod memory;
pub mod resolver;
pub mod revocation;
pub mod sync;
pub mod time;
pub mod traversal;

pub use authorizer::{Authorizer, Grant, Request};
pub use config::{AuthorizerConfig, ConfigError};
pub use credential::{Credential, Did};
pub use error::{AuthorizationError, ErrorKind};
pub use resolver::{
    BlockResolver, BlockSource, CredentialDecoder, ProofResolver, SignatureVerifier, Unverified,
};
pub use traversal::{Traversal, TraversalLimits};

pub use tlog_capability::{AbilityTable, Capability, Requirement, abilities, operations};
