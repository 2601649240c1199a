//! Invoicer Wallets
//!
//! Every invoice gets its own freshly generated payment address. Key material
//! comes from a pluggable `KeyGenerator`: the built-in ed25519 generator, or an
//! operator-supplied external program.
//!
//! Secret keys leave this crate only inside a `ProvisionedWallet`, and only so
//! the store can persist them. No read path ever returns one.

pub mod command;
pub mod keys;
pub mod provision;

pub use command::CommandKeyGenerator;
pub use keys::{Ed25519KeyGenerator, KeyGenerator, KeyPair, KeygenError, SecretKey};
pub use provision::{ProvisionedWallet, WalletProvisioner};
