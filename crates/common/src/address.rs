//! Canonical address value type.
//!
//! The source system normalizes addresses to lowercase hex by hand at every
//! comparison site. Here that normalization is a property of the type: an
//! [`Address`] can only ever be constructed in its canonical form, so map
//! keys and equality checks never need to re-normalize.

use alloy_primitives::Address as AlloyAddress;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 20-byte EVM address, always compared and displayed in lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(AlloyAddress);

impl Address {
    /// Wraps a raw alloy address, discarding any checksum casing.
    pub fn new(inner: AlloyAddress) -> Self {
        Self(inner)
    }

    /// Returns the inner alloy address.
    pub fn as_alloy(&self) -> AlloyAddress {
        self.0
    }

    /// Returns the lowercase `0x`-prefixed hex representation.
    pub fn to_lowercase_hex(&self) -> String {
        format!("{:#x}", self.0)
    }
}

impl From<AlloyAddress> for Address {
    fn from(inner: AlloyAddress) -> Self {
        Self::new(inner)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s.parse::<AlloyAddress>().map_err(|_| AddressParseError {
            input: s.to_string(),
        })?;
        Ok(Self(inner))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_lowercase_hex()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_lowercase_hex())
    }
}

/// Failure parsing a string into a canonical [`Address`].
#[derive(Debug, thiserror::Error)]
#[error("invalid address: {input}")]
pub struct AddressParseError {
    input: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_checksum_casing() {
        let mixed: Address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
            .parse()
            .unwrap();
        let lower: Address = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"
            .parse()
            .unwrap();
        assert_eq!(mixed, lower);
        assert_eq!(mixed.to_lowercase_hex(), "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("not-an-address".parse::<Address>().is_err());
    }

    #[test]
    fn roundtrips_through_json() {
        let addr: Address = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
            .parse()
            .unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
