//! The `Chain` entity (`spec.md` §3.1) — immutable at runtime, reloaded on
//! startup from the external chain registry.

use serde::{Deserialize, Serialize};
use timelockwatch_common::ChainId;

/// An RPC URL template carrying an `{API_KEY}` placeholder, plus a list of
/// official fallback URLs that need no key substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcEndpoints {
    /// Provider-specific template, e.g. `https://eth-mainnet.g.alchemy.com/v2/{API_KEY}`.
    pub template: String,
    /// The placeholder token to substitute, e.g. `{API_KEY}`.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// Official fallback URLs used if the templated dial fails.
    #[serde(default)]
    pub fallbacks: Vec<String>,
}

fn default_placeholder() -> String {
    "{API_KEY}".to_string()
}

impl RpcEndpoints {
    /// Renders the template with the given API key. Returns `None` if the
    /// placeholder survives substitution (empty key), per `spec.md` §4.5
    /// step 1.
    pub fn render(&self, api_key: &str) -> Option<String> {
        if api_key.is_empty() {
            return None;
        }
        let rendered = self.template.replace(&self.placeholder, api_key);
        if rendered.contains(&self.placeholder) {
            None
        } else {
            Some(rendered)
        }
    }
}

/// Chain metadata as served by the external chain registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub display_name: String,
    pub native_currency: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub is_testnet: bool,
    pub rpc: RpcEndpoints,
    #[serde(default = "default_true")]
    pub rpc_enabled: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_template_with_key() {
        let endpoints = RpcEndpoints {
            template: "https://eth.example/v2/{API_KEY}".into(),
            placeholder: "{API_KEY}".into(),
            fallbacks: vec![],
        };
        assert_eq!(
            endpoints.render("abc123").unwrap(),
            "https://eth.example/v2/abc123"
        );
        assert!(endpoints.render("").is_none());
    }
}
