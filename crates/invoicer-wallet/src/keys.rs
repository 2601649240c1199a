use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use ed25519_dalek::SigningKey;
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Length in bytes of the address derived from a public key.
const ADDRESS_LEN: usize = 20;

#[derive(Debug, Error)]
pub enum KeygenError {
    #[error("key generator command is empty")]
    EmptyCommand,

    #[error("failed to run key generator: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("key generator exited with {status}: {stderr}")]
    CommandFailed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("key generator timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed key generator output: {0}")]
    Malformed(String),
}

/// Private key material. Never serialized, never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Raw secret, for persisting into the wallet record only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub address: String,
    pub secret: SecretKey,
}

/// Produces a fresh (public address, private secret) pair with
/// cryptographic unpredictability.
#[async_trait]
pub trait KeyGenerator: Send + Sync {
    async fn generate_key_pair(&self) -> Result<KeyPair, KeygenError>;
}

/// In-process generator backed by ed25519 keys from the OS CSPRNG.
///
/// Address: `0x` + hex of the first 20 bytes of SHA-256(public key).
/// Secret: base64 of the 32-byte signing key.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519KeyGenerator;

#[async_trait]
impl KeyGenerator for Ed25519KeyGenerator {
    async fn generate_key_pair(&self) -> Result<KeyPair, KeygenError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        let digest = Sha256::digest(signing_key.verifying_key().as_bytes());

        Ok(KeyPair {
            address: format!("0x{}", hex::encode(&digest[..ADDRESS_LEN])),
            secret: SecretKey::new(BASE64.encode(signing_key.to_bytes())),
        })
    }
}
