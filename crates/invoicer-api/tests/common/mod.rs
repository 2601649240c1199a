//! Shared fixtures: deterministic key generation, a scriptable balance oracle
//! and a ledger with cheap password hashing.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;
use rust_decimal::Decimal;

use invoicer_api::Ledger;
use invoicer_db::Database;
use invoicer_oracle::{BalanceOracle, OracleError, Reconciler};
use invoicer_wallet::{KeyGenerator, KeyPair, KeygenError, SecretKey, WalletProvisioner};

/// Hands out `0xaddr{n}` / `secret-{n}` pairs.
#[derive(Default)]
pub struct SequenceKeygen(AtomicUsize);

#[async_trait]
impl KeyGenerator for SequenceKeygen {
    async fn generate_key_pair(&self) -> Result<KeyPair, KeygenError> {
        let n = self.0.fetch_add(1, Ordering::SeqCst);
        Ok(KeyPair {
            address: format!("0xaddr{n}"),
            secret: SecretKey::new(format!("secret-{n}")),
        })
    }
}

pub struct FailingKeygen;

#[async_trait]
impl KeyGenerator for FailingKeygen {
    async fn generate_key_pair(&self) -> Result<KeyPair, KeygenError> {
        Err(KeygenError::Malformed("generator offline".into()))
    }
}

/// Balances set per address by the test; unknown addresses hold zero.
#[derive(Default)]
pub struct ScriptedOracle {
    balances: Mutex<HashMap<String, Decimal>>,
    failing: Mutex<HashSet<String>>,
    queried: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn set_balance(&self, address: &str, balance: Decimal) {
        self.balances.lock().unwrap().insert(address.to_string(), balance);
    }

    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl BalanceOracle for ScriptedOracle {
    async fn get_balance(&self, address: &str) -> Result<Decimal, OracleError> {
        self.queried.lock().unwrap().push(address.to_string());
        if self.failing.lock().unwrap().contains(address) {
            return Err(OracleError::Status(503));
        }
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }
}

/// Minimum-cost Argon2id so tests do not spend seconds hashing.
pub fn fast_hasher() -> Argon2<'static> {
    let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap();
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

pub fn ledger_with(keygen: Arc<dyn KeyGenerator>, oracle: Arc<dyn BalanceOracle>) -> Ledger {
    Ledger::new(
        Database::open_in_memory().unwrap(),
        WalletProvisioner::new(keygen),
        Reconciler::new(oracle, Duration::from_secs(2)),
    )
    .with_password_hasher(fast_hasher())
}

pub fn ledger() -> (Ledger, Arc<ScriptedOracle>) {
    let oracle = Arc::new(ScriptedOracle::default());
    let ledger = ledger_with(Arc::new(SequenceKeygen::default()), oracle.clone());
    (ledger, oracle)
}
