//! Fullnode REST client.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use gpack_core::{AccountAddress, ContractConfig, SignedTransaction};

use crate::backend::TxnResult;
use crate::error::NodeError;

/// Content type the fullnode expects for BCS-encoded submissions.
const BCS_SIGNED_TXN: &str = "application/x.aptos.signed_transaction+bcs";

/// How often settlement polling re-queries the node.
const SETTLEMENT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Fullnode REST client.
///
/// Cheap to clone; the underlying HTTP client pools connections.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    base_url: Url,
}

/// Chain metadata from the node's root endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct LedgerInfo {
    pub chain_id: u8,
    #[serde(with = "string_u64")]
    pub ledger_version: u64,
    #[serde(with = "string_u64")]
    pub ledger_timestamp: u64,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    #[serde(with = "string_u64")]
    sequence_number: u64,
}

#[derive(Debug, Deserialize)]
struct GasEstimate {
    gas_estimate: u64,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct TransactionStatus {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    vm_status: Option<String>,
}

impl NodeClient {
    /// Create a client for a fullnode base URL (without the `/v1` suffix),
    /// e.g. `https://fullnode.testnet.aptoslabs.com`.
    pub fn new(base_url: &str) -> Result<Self, NodeError> {
        // Url::join drops the last segment of a path without a trailing slash
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url: Url = normalized
            .parse()
            .map_err(|e: url::ParseError| NodeError::Unavailable(format!("invalid node URL: {e}")))?;
        Ok(NodeClient {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    fn v1(&self, path: &str) -> Result<Url, NodeError> {
        let joined = format!("v1/{}", path.trim_start_matches('/'));
        self.base_url
            .join(&joined)
            .map_err(|e| NodeError::Unavailable(format!("invalid node URL path {path}: {e}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, NodeError> {
        let url = self.v1(path)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NodeError::Rejected(format!("{status}: {body}")));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| NodeError::UnexpectedResponse(e.to_string()))
    }

    /// Current chain metadata (chain id, ledger version and timestamp).
    pub async fn ledger_info(&self) -> Result<LedgerInfo, NodeError> {
        self.get_json("").await
    }

    /// Next sequence number for an account.
    pub async fn account_sequence_number(
        &self,
        address: AccountAddress,
    ) -> Result<u64, NodeError> {
        let info: AccountInfo = self
            .get_json(&format!("accounts/{}", address.to_hex_literal()))
            .await?;
        Ok(info.sequence_number)
    }

    /// Estimated gas unit price, in octas.
    pub async fn estimate_gas_unit_price(&self) -> Result<u64, NodeError> {
        let estimate: GasEstimate = self.get_json("estimate_gas_price").await?;
        Ok(estimate.gas_estimate)
    }

    /// Submit a fully-authenticated transaction as canonical BCS bytes.
    /// Returns the transaction hash the node assigned.
    pub async fn submit_signed(&self, txn: &SignedTransaction) -> Result<String, NodeError> {
        let url = self.v1("transactions")?;
        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, BCS_SIGNED_TXN)
            .body(txn.to_bytes())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NodeError::Rejected(format!("{status}: {body}")));
        }
        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| NodeError::UnexpectedResponse(e.to_string()))?;
        debug!(hash = %submitted.hash, "transaction submitted");
        Ok(submitted.hash)
    }

    /// Poll for a transaction's execution result until `timeout` elapses.
    ///
    /// Once a transaction is submitted its outcome is ambiguous until the
    /// node reports it, so transient poll failures (unreachable node, a
    /// non-success poll response, an unreadable body) never abort the wait;
    /// polling continues until the deadline. A timeout is reported as
    /// [`NodeError::SettlementTimeout`] carrying the hash; the transaction
    /// may still confirm later, so callers re-query rather than resubmit.
    pub async fn wait_for_settlement(
        &self,
        hash: &str,
        timeout: Duration,
    ) -> Result<TxnResult, NodeError> {
        let url = self.v1(&format!("transactions/by_hash/{hash}"))?;
        let started = Instant::now();
        loop {
            if started.elapsed() >= timeout {
                return Err(NodeError::SettlementTimeout {
                    hash: hash.to_string(),
                    waited_secs: started.elapsed().as_secs(),
                });
            }

            let response = match self.http.get(url.clone()).send().await {
                Ok(response) => response,
                Err(err) => {
                    warn!(%hash, "settlement poll failed: {err}");
                    tokio::time::sleep(SETTLEMENT_POLL_INTERVAL).await;
                    continue;
                }
            };
            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                // Not yet indexed; keep polling.
                tokio::time::sleep(SETTLEMENT_POLL_INTERVAL).await;
                continue;
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                warn!(%hash, "settlement poll rejected: {status}: {body}");
                tokio::time::sleep(SETTLEMENT_POLL_INTERVAL).await;
                continue;
            }
            let txn: TransactionStatus = match response.json().await {
                Ok(txn) => txn,
                Err(err) => {
                    warn!(%hash, "settlement poll returned an unreadable body: {err}");
                    tokio::time::sleep(SETTLEMENT_POLL_INTERVAL).await;
                    continue;
                }
            };
            if txn.kind == "pending_transaction" {
                tokio::time::sleep(SETTLEMENT_POLL_INTERVAL).await;
                continue;
            }
            return Ok(TxnResult {
                success: txn.success.unwrap_or(false),
                vm_status: txn.vm_status.unwrap_or_else(|| "unknown".to_string()),
            });
        }
    }

    /// Call a view function with JSON-encoded arguments.
    pub async fn view(
        &self,
        function: &str,
        arguments: Vec<serde_json::Value>,
    ) -> Result<Vec<serde_json::Value>, NodeError> {
        let url = self.v1("view")?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({
                "function": function,
                "type_arguments": [],
                "arguments": arguments,
            }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NodeError::Rejected(format!("{status}: {body}")));
        }
        response
            .json()
            .await
            .map_err(|e| NodeError::UnexpectedResponse(e.to_string()))
    }

    /// Total packs sold, via the contract's `get_total_sold` view.
    pub async fn total_sold(&self, config: &ContractConfig) -> Result<u64, NodeError> {
        let function = config.qualified(gpack_core::operation::FN_GET_TOTAL_SOLD);
        let result = self
            .view(
                &function,
                vec![serde_json::Value::String(
                    config.module_address.to_hex_literal(),
                )],
            )
            .await?;
        let first = result
            .first()
            .ok_or_else(|| NodeError::UnexpectedResponse("empty view result".to_string()))?;
        // u64 view results come back as decimal strings
        match first {
            serde_json::Value::String(s) => s
                .parse()
                .map_err(|e| NodeError::UnexpectedResponse(format!("total sold: {e}"))),
            serde_json::Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| NodeError::UnexpectedResponse("total sold out of range".to_string())),
            other => Err(NodeError::UnexpectedResponse(format!(
                "total sold has unexpected type: {other}"
            ))),
        }
    }
}

/// Fullnode JSON encodes u64 fields as decimal strings.
mod string_u64 {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
