//! The client finalizer.
//!
//! Takes a sealed envelope from the co-signer service through the fixed
//! progression: open the envelope, collect the user's signature, assemble the
//! multi-agent authenticator, submit, and await settlement. Each stage either
//! advances or fails terminally; there are no retries inside the flow. A new
//! attempt starts over with a fresh envelope, because the old one's sequence
//! number and expiration have moved on.

use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use gpack_core::{
    AccountAuthenticator, SignedTransaction, TransactionAuthenticator, TransactionEnvelope,
};
use gpack_node::{ChainBackend, NodeError, TxnResult};

use crate::wallet::{WalletError, WalletSigner};

/// Settlement wait bound used when the caller does not override it.
pub const DEFAULT_SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Stages of one finalization attempt, in order. The flow only ever moves
/// forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlowStage {
    Received,
    Deserialized,
    UserSigned,
    Submitted,
    Settled,
}

impl std::fmt::Display for FlowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FlowStage::Received => "received",
            FlowStage::Deserialized => "deserialized",
            FlowStage::UserSigned => "user_signed",
            FlowStage::Submitted => "submitted",
            FlowStage::Settled => "settled",
        };
        f.write_str(name)
    }
}

/// Terminal failures of a finalization attempt.
#[derive(Debug, Error)]
pub enum FinalizeError {
    /// The envelope bytes did not decode into the restricted transaction
    /// shape. Nothing was signed or submitted.
    #[error(transparent)]
    MalformedEnvelope(#[from] gpack_core::EnvelopeError),

    /// The envelope decoded but does not fit this wallet: wrong sender, or a
    /// creator authenticator that does not check out against the signing
    /// message.
    #[error("signer mismatch: {0}")]
    SignerMismatch(String),

    /// The user declined to sign. Nothing was submitted.
    #[error("user rejected the signing request")]
    UserRejected,

    /// The wallet failed before producing a signature.
    #[error(transparent)]
    Wallet(WalletError),

    /// The node refused the submission or could not be reached. Raised only
    /// before anything was accepted; resubmitting a fresh flow is safe.
    #[error("submission failed: {0}")]
    SubmitFailed(String),

    /// Submission succeeded but settlement was not observed within the wait
    /// bound. The transaction may still confirm; re-query by this hash, do
    /// not resubmit.
    #[error("settlement timed out for transaction {hash}")]
    SettlementTimeout { hash: String },

    /// Submission succeeded but the settlement query itself failed, so the
    /// outcome is unknown. Ambiguous like a timeout: re-query by this hash,
    /// never resubmit.
    #[error("settlement unknown for transaction {hash}: {reason}")]
    SettlementUnknown { hash: String, reason: String },
}

impl From<WalletError> for FinalizeError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Rejected => FinalizeError::UserRejected,
            other => FinalizeError::Wallet(other),
        }
    }
}

/// Outcome of a settled transaction: the hash plus what the VM did with it.
/// An on-chain abort still settles; check `result.success`.
#[derive(Clone, Debug)]
pub struct Finalized {
    pub hash: String,
    pub result: TxnResult,
}

/// Drives envelopes to settlement through a wallet and a chain backend.
pub struct Finalizer<B, W> {
    backend: B,
    wallet: W,
    settlement_timeout: Duration,
}

impl<B: ChainBackend, W: WalletSigner> Finalizer<B, W> {
    pub fn new(backend: B, wallet: W) -> Self {
        Finalizer {
            backend,
            wallet,
            settlement_timeout: DEFAULT_SETTLEMENT_TIMEOUT,
        }
    }

    pub fn with_settlement_timeout(mut self, timeout: Duration) -> Self {
        self.settlement_timeout = timeout;
        self
    }

    /// Run one envelope through the full flow.
    pub async fn finalize(&self, envelope: &TransactionEnvelope) -> Result<Finalized, FinalizeError> {
        debug!(stage = %FlowStage::Received, "finalizing envelope");

        let (txn, creator_auth) = envelope.open()?;
        debug!(stage = %FlowStage::Deserialized, sender = %txn.raw_txn.sender, "envelope opened");

        if txn.raw_txn.sender != self.wallet.address() {
            return Err(FinalizeError::SignerMismatch(format!(
                "transaction sender {} is not this wallet's account {}",
                txn.raw_txn.sender,
                self.wallet.address()
            )));
        }
        let signing_message = txn.signing_message();
        if !creator_auth.verify(&signing_message) {
            return Err(FinalizeError::SignerMismatch(
                "creator authenticator does not verify against this transaction".to_string(),
            ));
        }

        let user_auth = self.wallet.sign_multi_agent(&txn).await?;
        debug!(stage = %FlowStage::UserSigned, "user signature collected");

        let signed = assemble(&txn, user_auth, creator_auth);
        let hash = self
            .backend
            .submit(&signed)
            .await
            .map_err(|e| FinalizeError::SubmitFailed(e.to_string()))?;
        info!(stage = %FlowStage::Submitted, %hash, "transaction submitted");

        // Past this point the transaction may already be accepted, so every
        // failure keeps the hash and reads as "re-query, never resubmit".
        let result = self
            .backend
            .wait_for_settlement(&hash, self.settlement_timeout)
            .await
            .map_err(|e| match e {
                NodeError::SettlementTimeout { hash, .. } => {
                    FinalizeError::SettlementTimeout { hash }
                }
                other => FinalizeError::SettlementUnknown {
                    hash: hash.clone(),
                    reason: other.to_string(),
                },
            })?;
        info!(stage = %FlowStage::Settled, %hash, success = result.success, "transaction settled");

        Ok(Finalized { hash, result })
    }
}

/// Assemble the fully-authenticated transaction. The user's authenticator
/// takes the primary slot and the creator's the secondary slot, in the same
/// order as the declared secondary addresses; the chain rejects any other
/// arrangement.
fn assemble(
    txn: &gpack_core::UnsignedMultiAgentTransaction,
    user_auth: AccountAuthenticator,
    creator_auth: AccountAuthenticator,
) -> SignedTransaction {
    SignedTransaction {
        raw_txn: txn.raw_txn.clone(),
        authenticator: TransactionAuthenticator::MultiAgent {
            sender: user_auth,
            secondary_signer_addresses: txn.secondary_signer_addresses.clone(),
            secondary_signers: vec![creator_auth],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::LocalWallet;
    use gpack_core::{
        build_multi_agent, AccountAddress, BuildParams, ChainId, ContractConfig, CoSigner,
        CreatorKey, PackOperation,
    };

    fn sealed_for(wallet: &LocalWallet) -> TransactionEnvelope {
        let key = CreatorKey::from_bytes([5u8; 32]);
        let creator = key.address();
        let co_signer = CoSigner::new(key);
        let txn = build_multi_agent(
            wallet.address(),
            creator,
            &PackOperation::Purchase,
            &ContractConfig::new(AccountAddress::from_hex("0x553f").unwrap(), "galactic_packs"),
            BuildParams {
                sequence_number: 4,
                max_gas_amount: 200_000,
                gas_unit_price: 100,
                expiration_timestamp_secs: 1_700_000_020,
                chain_id: ChainId(2),
            },
        );
        let auth = co_signer.co_sign(&txn).unwrap();
        TransactionEnvelope::seal(&txn, &auth)
    }

    struct NoSubmit;

    #[async_trait::async_trait]
    impl ChainBackend for NoSubmit {
        async fn submit(&self, _txn: &SignedTransaction) -> Result<String, NodeError> {
            panic!("flow must fail before submission");
        }

        async fn wait_for_settlement(
            &self,
            _hash: &str,
            _timeout: Duration,
        ) -> Result<TxnResult, NodeError> {
            panic!("flow must fail before settlement");
        }
    }

    #[tokio::test]
    async fn rejects_envelopes_for_a_different_sender() {
        let envelope = sealed_for(&LocalWallet::from_bytes([1u8; 32]));
        let finalizer = Finalizer::new(NoSubmit, LocalWallet::from_bytes([2u8; 32]));
        assert!(matches!(
            finalizer.finalize(&envelope).await,
            Err(FinalizeError::SignerMismatch(_))
        ));
    }

    #[tokio::test]
    async fn rejects_tampered_transaction_bytes() {
        let wallet = LocalWallet::from_bytes([1u8; 32]);
        let mut envelope = sealed_for(&wallet);
        // flip one byte inside the raw transaction
        let last = envelope.transaction_bytes.len() - 1;
        envelope.transaction_bytes[last] ^= 0x01;
        let finalizer = Finalizer::new(NoSubmit, wallet);
        let err = finalizer.finalize(&envelope).await.unwrap_err();
        assert!(matches!(
            err,
            FinalizeError::MalformedEnvelope(_) | FinalizeError::SignerMismatch(_)
        ));
    }

    #[tokio::test]
    async fn declined_signing_is_terminal_and_submits_nothing() {
        struct Decliner(AccountAddress);

        #[async_trait::async_trait]
        impl WalletSigner for Decliner {
            fn address(&self) -> AccountAddress {
                self.0
            }

            async fn sign_multi_agent(
                &self,
                _txn: &gpack_core::UnsignedMultiAgentTransaction,
            ) -> Result<AccountAuthenticator, WalletError> {
                Err(WalletError::Rejected)
            }
        }

        let wallet = LocalWallet::from_bytes([1u8; 32]);
        let envelope = sealed_for(&wallet);
        let finalizer = Finalizer::new(NoSubmit, Decliner(wallet.address()));
        assert!(matches!(
            finalizer.finalize(&envelope).await,
            Err(FinalizeError::UserRejected)
        ));
    }
}
