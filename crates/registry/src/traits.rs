//! Trait surface for the registries TimelockWatch consumes but does not own
//! (`spec.md` §6). Every method is a pure read; the Scanner refreshes its
//! local map once per tick rather than relying on push invalidation.

use async_trait::async_trait;
use thiserror::Error;
use timelockwatch_common::{ChainId, Classify, ErrorClass};
use timelockwatch_primitives::{Chain, EmailBinding, TimelockContract, VerificationCode};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("chain {0} not found")]
    ChainNotFound(ChainId),
    #[error("registry source unavailable: {0}")]
    Unavailable(String),
}

impl Classify for RegistryError {
    fn class(&self) -> ErrorClass {
        ErrorClass::RpcUnavailable
    }
}

#[async_trait]
pub trait ChainRegistry: Send + Sync {
    async fn list_rpc_enabled(&self, include_testnets: bool) -> Result<Vec<Chain>, RegistryError>;
    async fn by_chain_id(&self, id: ChainId) -> Result<Chain, RegistryError>;
}

#[async_trait]
pub trait TimelockRegistry: Send + Sync {
    async fn active_compound_by_chain(
        &self,
        chain_id: ChainId,
    ) -> Result<Vec<TimelockContract>, RegistryError>;
    async fn active_oz_by_chain(
        &self,
        chain_id: ChainId,
    ) -> Result<Vec<TimelockContract>, RegistryError>;
}

/// Consumed by the Dispatcher for recipient resolution (`spec.md` §4.4);
/// writes to `emails`/`user_emails` belong to the external auth surface
/// (`spec.md` §5), so only reads are exposed here.
#[async_trait]
pub trait UserEmailRegistry: Send + Sync {
    async fn bindings_subscribed_to(
        &self,
        chain_id: ChainId,
        contract_address: timelockwatch_common::Address,
    ) -> Result<Vec<EmailBinding>, RegistryError>;

    async fn verification_code(
        &self,
        user_email_id: uuid::Uuid,
    ) -> Result<Option<VerificationCode>, RegistryError>;
}
