//! Server-side co-signer.
//!
//! The creator keypair is loaded once at process start and held in memory,
//! read-only, for the process lifetime. Co-signing is a pure, local,
//! deterministic operation; there are no retries and no lazy reloads. If the
//! key material is absent or malformed at start, every co-signing call for
//! the rest of the process fails with [`CoSignError::Unavailable`].

use ed25519_dalek::{Signer, SigningKey};

use crate::address::AccountAddress;
use crate::auth::{AccountAuthenticator, Ed25519PublicKey, Ed25519Signature};
use crate::error::{CoSignError, KeyError};
use crate::txn::{TransactionPayload, UnsignedMultiAgentTransaction};

/// The creator account's long-lived Ed25519 keypair.
pub struct CreatorKey {
    signing_key: SigningKey,
    public_key: Ed25519PublicKey,
    address: AccountAddress,
}

impl CreatorKey {
    /// Parse key material from hex (with or without `0x`), as supplied via
    /// the environment or a secret store.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let digits = s.trim().trim_start_matches("0x");
        let raw = hex::decode(digits).map_err(|e| KeyError(format!("invalid hex: {e}")))?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| KeyError(format!("expected 32 bytes, got {}", raw.len())))?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(&bytes);
        let public_key = Ed25519PublicKey(signing_key.verifying_key().to_bytes());
        let address = AccountAddress::from_ed25519_public_key(&public_key.0);
        CreatorKey {
            signing_key,
            public_key,
            address,
        }
    }

    pub fn address(&self) -> AccountAddress {
        self.address
    }

    pub fn public_key(&self) -> Ed25519PublicKey {
        self.public_key
    }

    fn sign_message(&self, message: &[u8]) -> AccountAuthenticator {
        let signature = self.signing_key.sign(message);
        AccountAuthenticator::Ed25519 {
            public_key: self.public_key,
            signature: Ed25519Signature(signature.to_bytes()),
        }
    }
}

/// Read-only co-signing capability over the creator key.
///
/// Cheap to share: the key is immutable after load, so unlimited concurrent
/// co-signing calls are safe.
pub struct CoSigner {
    key: Option<CreatorKey>,
}

impl CoSigner {
    /// A co-signer holding a loaded key.
    pub fn new(key: CreatorKey) -> Self {
        CoSigner { key: Some(key) }
    }

    /// A permanently unavailable co-signer, for processes started without key
    /// material. Calls fail fast and never touch the network.
    pub fn unavailable() -> Self {
        CoSigner { key: None }
    }

    pub fn is_available(&self) -> bool {
        self.key.is_some()
    }

    /// The creator account address, if the key loaded.
    pub fn address(&self) -> Option<AccountAddress> {
        self.key.as_ref().map(|k| k.address())
    }

    /// Produce the creator's partial authentication for `txn`.
    ///
    /// Refuses to sign any transaction that does not delegate authority to
    /// exactly this account: the secondary-signer list must be `[creator]`
    /// and the fee-payer slot must be empty. The returned authenticator is
    /// bound to `txn`'s exact signing message and is invalid for any other
    /// transaction.
    pub fn co_sign(
        &self,
        txn: &UnsignedMultiAgentTransaction,
    ) -> Result<AccountAuthenticator, CoSignError> {
        let key = self.key.as_ref().ok_or(CoSignError::Unavailable)?;

        if txn.secondary_signer_addresses != [key.address()] {
            return Err(CoSignError::SignerMismatch(format!(
                "expected secondary signers [{}], got [{}]",
                key.address(),
                txn.secondary_signer_addresses
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        if txn.fee_payer_address.is_some() {
            return Err(CoSignError::SignerMismatch(
                "fee-payer transactions are not co-signed; fee-payer mode is disabled".to_string(),
            ));
        }
        if !matches!(txn.raw_txn.payload, TransactionPayload::EntryFunction(_)) {
            return Err(CoSignError::SignerMismatch(
                "only entry-function payloads are co-signed".to_string(),
            ));
        }

        Ok(key.sign_message(&txn.signing_message()))
    }
}
