//! The transport envelope.
//!
//! The envelope carries the unsigned multi-agent transaction and the
//! creator's partial authentication from server to client as two independent
//! canonical byte strings. In JSON each byte string renders as an ordered
//! array of integers 0-255; byte order and length are preserved exactly, with
//! no compression or re-indexing.

use serde::{Deserialize, Serialize};

use crate::auth::AccountAuthenticator;
use crate::error::EnvelopeError;
use crate::txn::UnsignedMultiAgentTransaction;

/// The wire artifact shared between server and client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope {
    /// Canonical BCS form of the unsigned multi-agent transaction.
    pub transaction_bytes: Vec<u8>,
    /// Canonical BCS form of the creator's account authenticator.
    pub creator_auth_bytes: Vec<u8>,
}

impl TransactionEnvelope {
    /// Seal a transaction and its creator authenticator for transit.
    ///
    /// Encoding is deterministic: sealing the same inputs twice yields
    /// byte-identical envelopes.
    pub fn seal(
        txn: &UnsignedMultiAgentTransaction,
        creator_auth: &AccountAuthenticator,
    ) -> TransactionEnvelope {
        TransactionEnvelope {
            // Fixed shapes; BCS serialization cannot fail.
            transaction_bytes: bcs::to_bytes(txn).unwrap(),
            creator_auth_bytes: bcs::to_bytes(creator_auth).unwrap(),
        }
    }

    /// Deserialize both fields back into the objects that produced them.
    ///
    /// Each field is decoded independently and both must parse completely;
    /// malformed or truncated bytes fail the whole open. The decoded
    /// transaction must be the restricted shape this protocol produces: an
    /// entry-function payload, exactly one secondary signer, no fee payer,
    /// and an Ed25519 creator authenticator.
    pub fn open(
        &self,
    ) -> Result<(UnsignedMultiAgentTransaction, AccountAuthenticator), EnvelopeError> {
        let txn: UnsignedMultiAgentTransaction = bcs::from_bytes(&self.transaction_bytes)
            .map_err(|e| EnvelopeError::Malformed(format!("transaction bytes: {e}")))?;
        let auth: AccountAuthenticator = bcs::from_bytes(&self.creator_auth_bytes)
            .map_err(|e| EnvelopeError::Malformed(format!("creator authenticator bytes: {e}")))?;

        if txn.entry_function().is_none() {
            return Err(EnvelopeError::Malformed(
                "transaction payload is not an entry function".to_string(),
            ));
        }
        if txn.secondary_signer_addresses.len() != 1 {
            return Err(EnvelopeError::Malformed(format!(
                "expected exactly one secondary signer, got {}",
                txn.secondary_signer_addresses.len()
            )));
        }
        if txn.fee_payer_address.is_some() {
            return Err(EnvelopeError::Malformed(
                "fee-payer transactions are not transported by this protocol".to_string(),
            ));
        }
        if !matches!(auth, AccountAuthenticator::Ed25519 { .. }) {
            return Err(EnvelopeError::Malformed(
                "creator authenticator is not an Ed25519 authenticator".to_string(),
            ));
        }

        Ok((txn, auth))
    }
}
