//! Collaborators that turn content addresses into credentials.
//!
//! Loading a credential takes three steps, each owned by a different
//! external component:
//!
//! 1. [`BlockSource`] fetches the raw block behind a CID
//! 2. [`CredentialDecoder`] parses the block into a credential
//! 3. [`SignatureVerifier`] checks the credential's signed envelope
//!
//! [`BlockResolver`] chains the three into a [`ProofResolver`], which is the
//! only thing the authority resolvers depend on.

use async_trait::async_trait;
use ipld_core::cid::Cid;
use tracing::warn;

use crate::{
    AuthorizationError,
    sync::{ConditionalSend, ConditionalSync},
};

/// Storage collaborator holding content-addressed blocks.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait BlockSource: ConditionalSync {
    /// Fetch the bytes of `cid`.
    ///
    /// Fails with [`NotFound`](crate::ErrorKind::NotFound) when the block is
    /// absent and [`FetchError`](crate::ErrorKind::FetchError) when it could
    /// not be read.
    async fn get(&self, cid: &Cid) -> Result<Vec<u8>, AuthorizationError>;
}

/// Parses credential bytes.
pub trait CredentialDecoder<C>: ConditionalSync {
    /// Decode `bytes`, failing with [`ParseError`](crate::ErrorKind::ParseError).
    fn decode(&self, bytes: &[u8]) -> Result<C, AuthorizationError>;
}

/// Verifies a credential's signature.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait SignatureVerifier<C: ConditionalSync>: ConditionalSync {
    /// Fails with [`InvalidSignature`](crate::ErrorKind::InvalidSignature)
    /// when the issuer did not sign `credential`.
    async fn verify(&self, credential: &C) -> Result<(), AuthorizationError>;
}

/// Accepts every credential without checking anything.
///
/// Only suitable when the credentials were verified before they were
/// stored, or for fabricated credential graphs in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unverified;

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<C: ConditionalSync> SignatureVerifier<C> for Unverified {
    async fn verify(&self, _credential: &C) -> Result<(), AuthorizationError> {
        Ok(())
    }
}

/// Resolves proof references to credentials.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait ProofResolver<C: ConditionalSend>: ConditionalSync {
    /// Load the credential behind `cid`, reporting why when it cannot.
    async fn load(&self, cid: &Cid) -> Result<C, AuthorizationError>;

    /// Resolve a proof reference, or `None` if it cannot be resolved.
    ///
    /// Failures are never substituted with a default credential; the
    /// reference simply contributes no authority.
    async fn resolve(&self, proof: &Cid) -> Option<C> {
        match self.load(proof).await {
            Ok(credential) => Some(credential),
            Err(error) => {
                warn!(%proof, %error, "Skipping unresolvable proof");
                None
            }
        }
    }
}

/// A [`ProofResolver`] built from a block source, a decoder and a verifier.
#[derive(Debug, Clone)]
pub struct BlockResolver<B, D, V = Unverified> {
    blocks: B,
    decoder: D,
    verifier: V,
}

impl<B, D, V> BlockResolver<B, D, V> {
    /// Compose a resolver.
    pub fn new(blocks: B, decoder: D, verifier: V) -> Self {
        Self {
            blocks,
            decoder,
            verifier,
        }
    }

    /// The underlying block source.
    pub fn blocks(&self) -> &B {
        &self.blocks
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<C, B, D, V> ProofResolver<C> for BlockResolver<B, D, V>
where
    C: ConditionalSync,
    B: BlockSource,
    D: CredentialDecoder<C>,
    V: SignatureVerifier<C>,
{
    async fn load(&self, cid: &Cid) -> Result<C, AuthorizationError> {
        let bytes = self.blocks.get(cid).await?;
        let credential = self.decoder.decode(&bytes)?;
        self.verifier.verify(&credential).await?;
        Ok(credential)
    }
}
