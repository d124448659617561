//! HTTP client for the co-signer service.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use gpack_core::{AccountAddress, TransactionEnvelope};

/// Failures talking to the co-signer service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport-level failure; the service could not be reached.
    #[error("co-signer service unreachable: {0}")]
    Unreachable(String),

    /// The service answered with a structured error.
    #[error("co-signer service error [{code}]: {message}")]
    Service { code: String, message: String },

    /// The service answered but the body did not have the expected shape.
    #[error("unexpected co-signer response: {0}")]
    UnexpectedResponse(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Unreachable(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    error_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseBody {
    user_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RedeemBody {
    user_address: String,
    pack_token_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TotalSoldBody {
    total_sold: u64,
}

/// Typed client for the co-signer service endpoints.
#[derive(Clone)]
pub struct CosignerApi {
    http: reqwest::Client,
    base_url: Url,
}

impl CosignerApi {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        // Url::join drops the last segment of a path without a trailing slash
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url: Url = normalized
            .parse()
            .map_err(|e: url::ParseError| ServiceError::Unreachable(format!("invalid URL: {e}")))?;
        Ok(CosignerApi {
            http: reqwest::Client::new(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ServiceError::Unreachable(format!("invalid URL path {path}: {e}")))
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => Err(ServiceError::Service {
                    code: err.error_code,
                    message: err.error,
                }),
                Err(_) => Err(ServiceError::UnexpectedResponse(format!("{status}: {body}"))),
            };
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ServiceError::UnexpectedResponse(e.to_string()))
    }

    /// Request a co-signed purchase envelope for `user`.
    pub async fn purchase(&self, user: AccountAddress) -> Result<TransactionEnvelope, ServiceError> {
        let response = self
            .http
            .post(self.endpoint("txn/purchase")?)
            .json(&PurchaseBody {
                user_address: user.to_hex_literal(),
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Request a co-signed redeem envelope for `user` opening `pack_token`.
    pub async fn redeem(
        &self,
        user: AccountAddress,
        pack_token: AccountAddress,
    ) -> Result<TransactionEnvelope, ServiceError> {
        let response = self
            .http
            .post(self.endpoint("txn/redeem")?)
            .json(&RedeemBody {
                user_address: user.to_hex_literal(),
                pack_token_id: pack_token.to_hex_literal(),
            })
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Total packs sold so far.
    pub async fn total_sold(&self) -> Result<u64, ServiceError> {
        let response = self.http.get(self.endpoint("view/total-sold")?).send().await?;
        let body: TotalSoldBody = Self::decode(response).await?;
        Ok(body.total_sold)
    }

    /// Categorized holdings for an account, as the service renders them.
    pub async fn assets(&self, owner: AccountAddress) -> Result<serde_json::Value, ServiceError> {
        let response = self
            .http
            .get(self.endpoint(&format!("assets/{}", owner.to_hex_literal()))?)
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_errors_decode() {
        let body = r#"{"error":"co-signer unavailable: creator key not loaded","error_code":"COSIGNER_UNAVAILABLE"}"#;
        let err: ErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(err.error_code, "COSIGNER_UNAVAILABLE");
    }

    #[test]
    fn endpoints_join_against_the_base_url() {
        let api = CosignerApi::new("http://localhost:8080/").unwrap();
        assert_eq!(
            api.endpoint("txn/purchase").unwrap().as_str(),
            "http://localhost:8080/txn/purchase"
        );
        assert!(CosignerApi::new("not a url").is_err());
    }

    #[test]
    fn preserves_a_base_path_without_a_trailing_slash() {
        let api = CosignerApi::new("http://gateway.example.com/cosigner").unwrap();
        assert_eq!(
            api.endpoint("txn/purchase").unwrap().as_str(),
            "http://gateway.example.com/cosigner/txn/purchase"
        );
    }
}
