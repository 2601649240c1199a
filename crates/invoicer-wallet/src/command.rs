use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::warn;

use crate::keys::{KeyGenerator, KeyPair, KeygenError, SecretKey};

/// Delegates key generation to an external program.
///
/// The program is run with no stdin and must print a single JSON object
/// `{"address": "...", "secret": "..."}` on stdout and exit 0.
#[derive(Debug, Clone)]
pub struct CommandKeyGenerator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

#[derive(Deserialize)]
struct CommandOutput {
    address: String,
    secret: String,
}

impl CommandKeyGenerator {
    /// Build from a whitespace-separated command line (no shell quoting).
    pub fn from_command_line(line: &str, timeout: Duration) -> Result<Self, KeygenError> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(KeygenError::EmptyCommand)?;

        Ok(Self {
            program,
            args: parts.collect(),
            timeout,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl KeyGenerator for CommandKeyGenerator {
    async fn generate_key_pair(&self) -> Result<KeyPair, KeygenError> {
        let run = Command::new(&self.program)
            .args(&self.args)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| KeygenError::Timeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!("Key generator {} failed: {}", self.program, output.status);
            return Err(KeygenError::CommandFailed {
                status: output.status,
                stderr,
            });
        }

        parse_key_pair(&output.stdout)
    }
}

fn parse_key_pair(stdout: &[u8]) -> Result<KeyPair, KeygenError> {
    let parsed: CommandOutput =
        serde_json::from_slice(stdout).map_err(|e| KeygenError::Malformed(e.to_string()))?;

    let address = parsed.address.trim();
    if address.is_empty() {
        return Err(KeygenError::Malformed("empty address".into()));
    }
    if parsed.secret.is_empty() {
        return Err(KeygenError::Malformed("empty secret".into()));
    }

    Ok(KeyPair {
        address: address.to_string(),
        secret: SecretKey::new(parsed.secret),
    })
}
