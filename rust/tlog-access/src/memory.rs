//! Reference credential model and in-memory block store.
//!
//! [`Delegation`] is a plain, unsigned credential with a DAG-CBOR encoding
//! and a content identifier. [`MemoryBlocks`] keeps encoded delegations by
//! CID. Together they let callers (and tests) assemble arbitrary credential
//! graphs, including forged and cyclic ones, without any signing keys.

use async_trait::async_trait;
use ipld_core::cid::{Cid, multihash::Multihash};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tlog_capability::Capability;

use crate::{
    AuthorizationError, BlockResolver, BlockSource, Credential, CredentialDecoder, Did,
    Unverified, time::Timestamp,
};

/// Multicodec code for DAG-CBOR.
pub const DAG_CBOR: u64 = 0x71;

/// Multihash code for SHA2-256.
pub const SHA2_256: u64 = 0x12;

/// Content identifier for a DAG-CBOR block.
pub fn dagcbor_cid(bytes: &[u8]) -> Result<Cid, AuthorizationError> {
    let digest = Sha256::digest(bytes);
    let hash = Multihash::<64>::wrap(SHA2_256, &digest)
        .map_err(|e| AuthorizationError::internal(format!("Failed to wrap digest: {}", e)))?;
    Ok(Cid::new_v1(DAG_CBOR, hash))
}

/// A delegated capability token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// Principal that issued the delegation.
    #[serde(rename = "iss")]
    pub issuer: Did,

    /// Principal the delegation is addressed to.
    #[serde(rename = "aud")]
    pub audience: Did,

    /// Unix time after which the delegation is invalid.
    #[serde(rename = "exp", default)]
    pub expiration: Option<Timestamp>,

    /// Granted capabilities.
    #[serde(rename = "att", default)]
    pub capabilities: Vec<Capability>,

    /// Proofs of the issuer's authority.
    #[serde(rename = "prf", default)]
    pub proofs: Vec<Cid>,
}

impl Delegation {
    /// A non-expiring delegation with no capabilities and no proofs.
    pub fn new(issuer: impl Into<Did>, audience: impl Into<Did>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            expiration: None,
            capabilities: Vec::new(),
            proofs: Vec::new(),
        }
    }

    /// Add a capability granting `can` over `with`.
    pub fn grant(mut self, can: impl Into<String>, with: impl Into<String>) -> Self {
        self.capabilities.push(Capability::new(can, with));
        self
    }

    /// Expire the delegation at `expiration`.
    pub fn expires(mut self, expiration: Timestamp) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Append a proof reference.
    pub fn proof(mut self, proof: Cid) -> Self {
        self.proofs.push(proof);
        self
    }

    /// Encode as DAG-CBOR.
    pub fn to_bytes(&self) -> Result<Vec<u8>, AuthorizationError> {
        serde_ipld_dagcbor::to_vec(self).map_err(|e| {
            AuthorizationError::internal(format!("Failed to encode delegation: {}", e))
        })
    }

    /// Compute the CID of the DAG-CBOR encoding.
    pub fn to_cid(&self) -> Result<Cid, AuthorizationError> {
        dagcbor_cid(&self.to_bytes()?)
    }
}

impl Credential for Delegation {
    fn issuer(&self) -> &str {
        &self.issuer
    }

    fn audience(&self) -> &str {
        &self.audience
    }

    fn expiration(&self) -> Option<Timestamp> {
        self.expiration
    }

    fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    fn proofs(&self) -> &[Cid] {
        &self.proofs
    }
}

/// Decodes DAG-CBOR encoded [`Delegation`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DagCborDecoder;

impl CredentialDecoder<Delegation> for DagCborDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<Delegation, AuthorizationError> {
        serde_ipld_dagcbor::from_slice(bytes)
            .map_err(|e| AuthorizationError::parse(format!("Failed to decode delegation: {}", e)))
    }
}

/// Thread-safe in-memory block store.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlocks {
    blocks: Arc<Mutex<HashMap<Cid, Vec<u8>>>>,
}

impl MemoryBlocks {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes under their DAG-CBOR CID.
    pub fn put(&self, bytes: Vec<u8>) -> Result<Cid, AuthorizationError> {
        let cid = dagcbor_cid(&bytes)?;
        self.put_at(cid, bytes)?;
        Ok(cid)
    }

    /// Store raw bytes under an arbitrary CID.
    ///
    /// Nothing checks that `cid` addresses `bytes`; useful for fabricating
    /// graphs whose links do not match their content.
    pub fn put_at(&self, cid: Cid, bytes: Vec<u8>) -> Result<(), AuthorizationError> {
        let mut locked = self
            .blocks
            .lock()
            .map_err(|_| AuthorizationError::internal("Block store poisoned"))?;
        locked.insert(cid, bytes);
        Ok(())
    }

    /// Encode and store a delegation, returning its CID.
    pub fn insert(&self, delegation: &Delegation) -> Result<Cid, AuthorizationError> {
        self.put(delegation.to_bytes()?)
    }

    /// Number of stored blocks.
    pub fn len(&self) -> Result<usize, AuthorizationError> {
        let locked = self
            .blocks
            .lock()
            .map_err(|_| AuthorizationError::internal("Block store poisoned"))?;
        Ok(locked.len())
    }

    /// Returns `true` if no block is stored.
    pub fn is_empty(&self) -> Result<bool, AuthorizationError> {
        Ok(self.len()? == 0)
    }

    /// A proof resolver reading [`Delegation`]s from this store without
    /// signature checks.
    pub fn resolver(&self) -> BlockResolver<Self, DagCborDecoder, Unverified> {
        BlockResolver::new(self.clone(), DagCborDecoder, Unverified)
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl BlockSource for MemoryBlocks {
    async fn get(&self, cid: &Cid) -> Result<Vec<u8>, AuthorizationError> {
        let locked = self
            .blocks
            .lock()
            .map_err(|_| AuthorizationError::internal("Block store poisoned"))?;
        locked
            .get(cid)
            .cloned()
            .ok_or_else(|| AuthorizationError::not_found(cid))
    }
}
