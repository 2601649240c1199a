use async_trait::async_trait;
use reqwest::Url;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("invalid oracle url: {0}")]
    InvalidUrl(String),

    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oracle returned status {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

/// Reports the balance currently observed at a payment address.
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    async fn get_balance(&self, address: &str) -> Result<Decimal, OracleError>;
}

/// Oracle reached over HTTP: `GET {base_url}/{address}` answering
/// `{"balance": <number or decimal string>}`.
#[derive(Debug, Clone)]
pub struct HttpBalanceOracle {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: Decimal,
}

impl HttpBalanceOracle {
    pub fn new(base_url: &str) -> Result<Self, OracleError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, OracleError> {
        let base_url =
            Url::parse(base_url).map_err(|e| OracleError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(OracleError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    fn balance_url(&self, address: &str) -> Result<Url, OracleError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| OracleError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(address);
        Ok(url)
    }
}

#[async_trait]
impl BalanceOracle for HttpBalanceOracle {
    async fn get_balance(&self, address: &str) -> Result<Decimal, OracleError> {
        let url = self.balance_url(address)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        let body: BalanceResponse = response.json().await?;
        Ok(body.balance)
    }
}
