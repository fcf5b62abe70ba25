//! `ChainRegistry`/`TimelockRegistry`/`UserEmailRegistry` traits (`spec.md`
//! §6) plus a TOML-file-backed implementation for standalone operation.

pub mod toml_config;
pub mod traits;

pub use toml_config::{InMemoryUserEmailRegistry, TomlRegistry};
pub use traits::{ChainRegistry, RegistryError, TimelockRegistry, UserEmailRegistry};
