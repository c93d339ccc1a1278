//! The request-level entry point.
//!
//! [`Authorizer`] pairs an [`AuthorizerConfig`] with a [`ProofResolver`] and
//! answers one question per call. Checks run cheapest first, and proof
//! resolution is only attempted once everything local has passed.

use ipld_core::cid::Cid;
use serde::Serialize;
use tlog_capability::Requirement;
use tracing::debug;

use crate::{
    AuthorizationError, AuthorizerConfig, Credential, Did, ProofResolver,
    chain::require_root_authority,
    direct::{check_audience, check_expiration, check_grant},
    erase::validate_for_erase,
    invocation::validate_invoker,
    revocation,
    sync::ConditionalSend,
    time::{Timestamp, now},
};

/// An operation someone wants to perform, with the credential they present.
#[derive(Debug)]
pub struct Request<'a, C> {
    /// Operation name, looked up in the ability table.
    pub operation: &'a str,
    /// Resource the operation targets.
    pub resource: &'a str,
    /// Owner of `resource`; the root every proof chain must lead to.
    pub owner: &'a str,
    /// Principal that signed the request.
    pub invoker: &'a str,
    /// The credential presented with the request.
    pub credential: &'a C,
}

/// A successful authorization decision, suitable for audit logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    /// Operation that was authorized.
    pub operation: String,
    /// Ability the operation required.
    pub ability: String,
    /// Resource the operation targets.
    pub resource: String,
    /// Issuer of the presented credential, who is also the invoker.
    pub issuer: Did,
    /// `true` when the grant was decided by the direct-only policy.
    pub direct: bool,
}

impl Grant {
    fn new<C: Credential>(requirement: Requirement, credential: &C, direct: bool) -> Self {
        Self {
            operation: requirement.operation,
            ability: requirement.ability,
            resource: requirement.resource,
            issuer: credential.issuer().to_string(),
            direct,
        }
    }
}

/// Authorization decisions for one service principal.
#[derive(Debug, Clone)]
pub struct Authorizer<R> {
    config: AuthorizerConfig,
    resolver: R,
}

impl<R> Authorizer<R> {
    /// An authorizer resolving proofs through `resolver`.
    pub fn new(config: AuthorizerConfig, resolver: R) -> Self {
        Self { config, resolver }
    }

    /// The active configuration.
    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    /// The proof resolver.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Authorize `request` against the current clock.
    ///
    /// Fails with `Internal` when the clock cannot be read; use
    /// [`Authorizer::authorize_at`] to supply a trusted time instead.
    pub async fn authorize<C>(&self, request: &Request<'_, C>) -> Result<Grant, AuthorizationError>
    where
        C: Credential + ConditionalSend,
        R: ProofResolver<C>,
    {
        self.authorize_at(request, now()?).await
    }

    /// Authorize `request` as of `now`.
    ///
    /// Checks, in order:
    /// 1. the operation's required ability (direct-only abilities go
    ///    through [`Authorizer::authorize_erase_at`] instead)
    /// 2. the credential is addressed to this service and not expired
    /// 3. some capability allows the ability over the resource
    /// 4. the invoker issued the credential
    /// 5. the credential's proofs trace to the resource owner
    pub async fn authorize_at<C>(
        &self,
        request: &Request<'_, C>,
        now: Timestamp,
    ) -> Result<Grant, AuthorizationError>
    where
        C: Credential + ConditionalSend,
        R: ProofResolver<C>,
    {
        let requirement = self
            .config
            .abilities
            .requirement(request.operation, request.resource);

        if self.config.is_direct_only(&requirement.ability) {
            return self.decide_direct(request, requirement, now);
        }

        let result = self.decide_delegated(request, &requirement, now).await;
        match result {
            Ok(()) => {
                debug!(
                    operation = request.operation,
                    resource = request.resource,
                    issuer = request.credential.issuer(),
                    "Authorized"
                );
                Ok(Grant::new(requirement, request.credential, false))
            }
            Err(error) => {
                debug!(
                    operation = request.operation,
                    resource = request.resource,
                    %error,
                    "Rejected"
                );
                Err(error)
            }
        }
    }

    async fn decide_delegated<C>(
        &self,
        request: &Request<'_, C>,
        requirement: &Requirement,
        now: Timestamp,
    ) -> Result<(), AuthorizationError>
    where
        C: Credential + ConditionalSend,
        R: ProofResolver<C>,
    {
        let credential = request.credential;
        check_audience(credential, &self.config.audience)?;
        check_expiration(credential, now)?;
        check_grant(credential, &requirement.ability, &requirement.resource)?;
        validate_invoker(request.invoker, credential)?;
        require_root_authority(credential, request.owner, &self.resolver, self.config.limits)
            .await
    }

    /// Authorize `request` under the erase policy against the current clock,
    /// whatever its operation maps to. Fails with `Internal` when the clock
    /// cannot be read.
    pub fn authorize_erase<C: Credential>(
        &self,
        request: &Request<'_, C>,
    ) -> Result<Grant, AuthorizationError> {
        self.authorize_erase_at(request, now()?)
    }

    /// Authorize `request` under the erase policy as of `now`.
    ///
    /// The credential must be issued by the owner with no proofs, list the
    /// required ability exactly, and be invoked by the owner.
    pub fn authorize_erase_at<C: Credential>(
        &self,
        request: &Request<'_, C>,
        now: Timestamp,
    ) -> Result<Grant, AuthorizationError> {
        let requirement = self
            .config
            .abilities
            .requirement(request.operation, request.resource);
        self.decide_direct(request, requirement, now)
    }

    fn decide_direct<C: Credential>(
        &self,
        request: &Request<'_, C>,
        requirement: Requirement,
        now: Timestamp,
    ) -> Result<Grant, AuthorizationError> {
        let result = validate_for_erase(
            request.credential,
            &self.config.audience,
            request.owner,
            &requirement,
            now,
        )
        .and_then(|_| validate_invoker(request.invoker, request.credential));

        match result {
            Ok(()) => {
                debug!(
                    operation = request.operation,
                    resource = request.resource,
                    "Authorized direct"
                );
                Ok(Grant::new(requirement, request.credential, true))
            }
            Err(error) => {
                debug!(
                    operation = request.operation,
                    resource = request.resource,
                    %error,
                    "Rejected direct"
                );
                Err(error)
            }
        }
    }

    /// Require `revoker` to have issued `target` or one of its ancestors.
    pub async fn authorize_revocation<C>(
        &self,
        revoker: &str,
        target: &C,
    ) -> Result<(), AuthorizationError>
    where
        C: Credential + ConditionalSend,
        R: ProofResolver<C>,
    {
        let result =
            revocation::authorize_revocation(revoker, target, &self.resolver, self.config.limits)
                .await;
        match &result {
            Ok(()) => debug!(revoker, issuer = target.issuer(), "Revocation authorized"),
            Err(error) => debug!(revoker, %error, "Revocation rejected"),
        }
        result
    }

    /// [`Authorizer::authorize_revocation`] for a credential known only by
    /// its CID. A target that cannot be loaded is a rejection.
    pub async fn authorize_revocation_of<C>(
        &self,
        revoker: &str,
        target: &Cid,
    ) -> Result<(), AuthorizationError>
    where
        C: Credential + ConditionalSend,
        R: ProofResolver<C>,
    {
        let credential: C = self.load_credential(target).await?;
        self.authorize_revocation(revoker, &credential).await
    }

    /// Fetch, decode and verify the credential behind `cid`.
    pub async fn load_credential<C>(&self, cid: &Cid) -> Result<C, AuthorizationError>
    where
        C: ConditionalSend,
        R: ProofResolver<C>,
    {
        self.resolver.load(cid).await
    }
}
