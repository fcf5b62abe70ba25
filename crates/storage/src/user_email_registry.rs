//! The storage-backed `UserEmailRegistry` (`spec.md` §6.1): the production
//! substitute for `timelockwatch_registry::InMemoryUserEmailRegistry`,
//! reading the tables the external auth surface writes.

use async_trait::async_trait;
use timelockwatch_common::{Address, ChainId};
use timelockwatch_primitives::{EmailBinding, VerificationCode};
use timelockwatch_registry::{RegistryError, UserEmailRegistry};

use crate::{EmailBindingStore, VerificationCodeStore};

pub struct StorageUserEmailRegistry<E, V> {
    bindings: E,
    codes: V,
}

impl<E, V> StorageUserEmailRegistry<E, V> {
    pub fn new(bindings: E, codes: V) -> Self {
        Self { bindings, codes }
    }
}

#[async_trait]
impl<E, V> UserEmailRegistry for StorageUserEmailRegistry<E, V>
where
    E: EmailBindingStore,
    V: VerificationCodeStore,
{
    async fn bindings_subscribed_to(
        &self,
        chain_id: ChainId,
        contract_address: Address,
    ) -> Result<Vec<EmailBinding>, RegistryError> {
        self.bindings
            .subscribed_to(chain_id, contract_address)
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))
    }

    async fn verification_code(
        &self,
        user_email_id: uuid::Uuid,
    ) -> Result<Option<VerificationCode>, RegistryError> {
        self.codes
            .find(user_email_id)
            .await
            .map_err(|e| RegistryError::Unavailable(e.to_string()))
    }
}
