//! The wallet seam.
//!
//! The finalizer never touches key material directly; it asks a
//! [`WalletSigner`] for the user's partial authentication and treats a
//! decline as a terminal outcome, not a retryable fault.

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use thiserror::Error;

use gpack_core::{
    AccountAddress, AccountAuthenticator, Ed25519PublicKey, Ed25519Signature,
    UnsignedMultiAgentTransaction,
};

/// Wallet-side failures.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The user explicitly declined to sign. Terminal; nothing was submitted.
    #[error("user rejected the signing request")]
    Rejected,

    /// The wallet backend failed before producing a signature.
    #[error("wallet error: {0}")]
    Backend(String),
}

/// Holder of the user's signing capability.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// The account this wallet signs for.
    fn address(&self) -> AccountAddress;

    /// Produce the user's partial authentication over the transaction's
    /// signing message.
    async fn sign_multi_agent(
        &self,
        txn: &UnsignedMultiAgentTransaction,
    ) -> Result<AccountAuthenticator, WalletError>;
}

/// An in-process Ed25519 wallet over a raw private key. Used by the CLI and
/// by tests; a browser-extension wallet would sit behind the same trait.
pub struct LocalWallet {
    signing_key: SigningKey,
    public_key: Ed25519PublicKey,
    address: AccountAddress,
}

impl LocalWallet {
    /// Parse key material from hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, WalletError> {
        let digits = s.trim().trim_start_matches("0x");
        let raw = hex::decode(digits).map_err(|e| WalletError::Backend(format!("invalid hex: {e}")))?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| WalletError::Backend(format!("expected 32 key bytes, got {}", raw.len())))?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&bytes);
        let public_key = Ed25519PublicKey(signing_key.verifying_key().to_bytes());
        let address = AccountAddress::from_ed25519_public_key(&public_key.0);
        LocalWallet {
            signing_key,
            public_key,
            address,
        }
    }
}

#[async_trait]
impl WalletSigner for LocalWallet {
    fn address(&self) -> AccountAddress {
        self.address
    }

    async fn sign_multi_agent(
        &self,
        txn: &UnsignedMultiAgentTransaction,
    ) -> Result<AccountAuthenticator, WalletError> {
        let signature = self.signing_key.sign(&txn.signing_message());
        Ok(AccountAuthenticator::Ed25519 {
            public_key: self.public_key,
            signature: Ed25519Signature(signature.to_bytes()),
        })
    }
}
