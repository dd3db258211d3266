// src/services/rail.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Human-readable context stored with an on-chain payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardMemo {
    pub contest: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
}

/// Token payout rail on a public network.
///
/// Calls are fire-and-forget from the ledger's point of view: a failure is
/// reported but never rolls back an off-chain record.
#[async_trait]
pub trait RewardRail: Send + Sync {
    async fn award(&self, address: &str, amount: i64, memo: &RewardMemo) -> Result<TxReceipt, AppError>;
}

/// Sends payouts to a relay service that holds the contract signer.
pub struct HttpRewardRail {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpRewardRail {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build reward rail client: {}", e)))?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }
}

#[derive(Serialize)]
struct AwardPayload<'a> {
    address: &'a str,
    amount: i64,
    memo: &'a RewardMemo,
}

#[async_trait]
impl RewardRail for HttpRewardRail {
    async fn award(&self, address: &str, amount: i64, memo: &RewardMemo) -> Result<TxReceipt, AppError> {
        let mut req = self.http.post(&self.endpoint).json(&AwardPayload {
            address,
            amount,
            memo,
        });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| AppError::ExternalRail(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AppError::ExternalRail(format!(
                "relay answered {}",
                resp.status()
            )));
        }
        resp.json::<TxReceipt>()
            .await
            .map_err(|e| AppError::ExternalRail(e.to_string()))
    }
}

/// Used when no relay is configured.
pub struct DisabledRail;

#[async_trait]
impl RewardRail for DisabledRail {
    async fn award(&self, _address: &str, _amount: i64, _memo: &RewardMemo) -> Result<TxReceipt, AppError> {
        Err(AppError::ExternalRail("Reward rail is not configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hung_relay_times_out() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let rail = HttpRewardRail::new(
            &format!("http://{}/award", addr),
            None,
            Duration::from_millis(300),
        )
        .unwrap();
        let memo = RewardMemo {
            contest: "Web3 Weekend".to_string(),
            reason: "first place".to_string(),
        };

        let started = std::time::Instant::now();
        let err = rail
            .award("0x52908400098527886E0F7030069857D2E4169EE7", 1000, &memo)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExternalRail(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
