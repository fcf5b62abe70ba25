//! File-backed registry implementations for standalone operation
//! (`spec.md` §4.8): loads the chain/timelock lists from a static TOML file
//! instead of a database- or service-backed registry. The trait boundary is
//! where a real deployment swaps this out without touching the core.

use std::{collections::HashMap, path::Path};

use serde::Deserialize;
use timelockwatch_common::{ChainId, Standard};
use timelockwatch_primitives::{Chain, EmailBinding, TimelockContract, VerificationCode};

use crate::traits::{ChainRegistry, RegistryError, TimelockRegistry, UserEmailRegistry};
use async_trait::async_trait;

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    chains: Vec<Chain>,
    #[serde(default)]
    timelocks: Vec<TimelockContract>,
}

/// A `ChainRegistry` + `TimelockRegistry` loaded once from a TOML file at
/// startup and held immutably for the process lifetime.
#[derive(Debug)]
pub struct TomlRegistry {
    chains: Vec<Chain>,
    timelocks: Vec<TimelockContract>,
}

impl TomlRegistry {
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Unavailable(e.to_string()))?;
        let file: RegistryFile =
            toml::from_str(&raw).map_err(|e| RegistryError::Unavailable(e.to_string()))?;
        Ok(Self { chains: file.chains, timelocks: file.timelocks })
    }
}

#[async_trait]
impl ChainRegistry for TomlRegistry {
    async fn list_rpc_enabled(&self, include_testnets: bool) -> Result<Vec<Chain>, RegistryError> {
        Ok(self
            .chains
            .iter()
            .filter(|c| c.rpc_enabled && c.is_active && (include_testnets || !c.is_testnet))
            .cloned()
            .collect())
    }

    async fn by_chain_id(&self, id: ChainId) -> Result<Chain, RegistryError> {
        self.chains
            .iter()
            .find(|c| c.chain_id == id)
            .cloned()
            .ok_or(RegistryError::ChainNotFound(id))
    }
}

#[async_trait]
impl TimelockRegistry for TomlRegistry {
    async fn active_compound_by_chain(
        &self,
        chain_id: ChainId,
    ) -> Result<Vec<TimelockContract>, RegistryError> {
        Ok(self
            .timelocks
            .iter()
            .filter(|t| {
                t.chain_id == chain_id && t.standard() == Standard::Compound && t.lifecycle.is_active()
            })
            .cloned()
            .collect())
    }

    async fn active_oz_by_chain(
        &self,
        chain_id: ChainId,
    ) -> Result<Vec<TimelockContract>, RegistryError> {
        Ok(self
            .timelocks
            .iter()
            .filter(|t| {
                t.chain_id == chain_id
                    && t.standard() == Standard::OpenZeppelin
                    && t.lifecycle.is_active()
            })
            .cloned()
            .collect())
    }
}

/// An in-memory `UserEmailRegistry` for local/dev runs where no external
/// auth service is wired in. Not suitable for production: writes made
/// through the real auth surface never reach this map.
#[derive(Debug, Default)]
pub struct InMemoryUserEmailRegistry {
    bindings: Vec<EmailBinding>,
    codes: HashMap<uuid::Uuid, VerificationCode>,
}

impl InMemoryUserEmailRegistry {
    pub fn new(bindings: Vec<EmailBinding>, codes: Vec<VerificationCode>) -> Self {
        let codes = codes.into_iter().map(|c| (c.user_email_id, c)).collect();
        Self { bindings, codes }
    }
}

#[async_trait]
impl UserEmailRegistry for InMemoryUserEmailRegistry {
    async fn bindings_subscribed_to(
        &self,
        _chain_id: ChainId,
        contract_address: timelockwatch_common::Address,
    ) -> Result<Vec<EmailBinding>, RegistryError> {
        Ok(self
            .bindings
            .iter()
            .filter(|b| b.is_subscribed_to(&contract_address))
            .cloned()
            .collect())
    }

    async fn verification_code(
        &self,
        user_email_id: uuid::Uuid,
    ) -> Result<Option<VerificationCode>, RegistryError> {
        Ok(self.codes.get(&user_email_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn loads_chains_and_filters_testnets() {
        let mut file = tempfile_with_toml(
            r#"
            [[chains]]
            chain_id = 1
            chain_name = "ethereum"
            display_name = "Ethereum"
            native_currency = "ETH"
            is_testnet = false
            [chains.rpc]
            template = "https://eth.example/{API_KEY}"

            [[chains]]
            chain_id = 11155111
            chain_name = "sepolia"
            display_name = "Sepolia"
            native_currency = "ETH"
            is_testnet = true
            [chains.rpc]
            template = "https://sepolia.example/{API_KEY}"
            "#,
        );
        let registry = TomlRegistry::load(file.path()).unwrap();
        let mainnet_only = registry.list_rpc_enabled(false).await.unwrap();
        assert_eq!(mainnet_only.len(), 1);
        let all = registry.list_rpc_enabled(true).await.unwrap();
        assert_eq!(all.len(), 2);
        file.close_and_keep();
    }

    struct TempToml {
        path: std::path::PathBuf,
    }

    impl TempToml {
        fn path(&self) -> &Path {
            &self.path
        }
        fn close_and_keep(self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    fn tempfile_with_toml(contents: &str) -> TempToml {
        let path = std::env::temp_dir().join(format!(
            "timelockwatch-registry-test-{}.toml",
            std::process::id()
        ));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        TempToml { path }
    }
}
