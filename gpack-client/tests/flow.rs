//! End-to-end flow over an in-memory chain backend.
//!
//! Exercises the full path a real purchase takes: the server builds and
//! co-signs, the envelope crosses a JSON boundary, the client wallet signs,
//! and the assembled transaction reaches settlement. The fake backend
//! verifies what a real node would: both signatures against the signing
//! message, and the authenticator slots in declared order.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use gpack_client::{FinalizeError, Finalizer, LocalWallet, WalletSigner};
use gpack_core::{
    build_multi_agent, AccountAddress, BuildParams, ChainId, ContractConfig, CoSigner, CreatorKey,
    PackOperation, SignedTransaction, TransactionAuthenticator, TransactionEnvelope,
    UnsignedMultiAgentTransaction,
};
use gpack_node::{ChainBackend, NodeError, TxnResult};

fn contract() -> ContractConfig {
    ContractConfig::new(
        AccountAddress::from_hex("0x553faabe7ca12e3664f05c9a3d2f378e5779bc5b45ea90b05804a655e64b282a")
            .unwrap(),
        "galactic_packs",
    )
}

fn build(sender: AccountAddress, creator: AccountAddress, op: &PackOperation) -> UnsignedMultiAgentTransaction {
    build_multi_agent(
        sender,
        creator,
        op,
        &contract(),
        BuildParams {
            sequence_number: 12,
            max_gas_amount: 200_000,
            gas_unit_price: 100,
            expiration_timestamp_secs: 1_700_000_020,
            chain_id: ChainId(2),
        },
    )
}

/// Fake node that validates submissions the way the chain would and settles
/// them immediately.
struct VerifyingBackend {
    expected_sender: AccountAddress,
    expected_creator: AccountAddress,
    submitted: Mutex<Vec<SignedTransaction>>,
}

impl VerifyingBackend {
    fn new(sender: AccountAddress, creator: AccountAddress) -> Self {
        VerifyingBackend {
            expected_sender: sender,
            expected_creator: creator,
            submitted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChainBackend for VerifyingBackend {
    async fn submit(&self, txn: &SignedTransaction) -> Result<String, NodeError> {
        let TransactionAuthenticator::MultiAgent {
            sender,
            secondary_signer_addresses,
            secondary_signers,
        } = &txn.authenticator
        else {
            return Err(NodeError::Rejected("not a multi-agent submission".into()));
        };

        let message = UnsignedMultiAgentTransaction {
            raw_txn: txn.raw_txn.clone(),
            secondary_signer_addresses: secondary_signer_addresses.clone(),
            fee_payer_address: None,
        }
        .signing_message();

        if sender.account_address() != Some(self.expected_sender) || !sender.verify(&message) {
            return Err(NodeError::Rejected("bad primary authenticator".into()));
        }
        if secondary_signer_addresses != &[self.expected_creator] {
            return Err(NodeError::Rejected("bad secondary address list".into()));
        }
        let [creator_auth] = secondary_signers.as_slice() else {
            return Err(NodeError::Rejected("bad secondary authenticator count".into()));
        };
        if creator_auth.account_address() != Some(self.expected_creator)
            || !creator_auth.verify(&message)
        {
            return Err(NodeError::Rejected("bad secondary authenticator".into()));
        }

        self.submitted.lock().unwrap().push(txn.clone());
        Ok(format!("0xhash{}", self.submitted.lock().unwrap().len()))
    }

    async fn wait_for_settlement(
        &self,
        _hash: &str,
        _timeout: Duration,
    ) -> Result<TxnResult, NodeError> {
        Ok(TxnResult {
            success: true,
            vm_status: "Executed successfully".to_string(),
        })
    }
}

/// Server-side half of the flow, as the co-signer service runs it.
fn server_side(user: AccountAddress, op: &PackOperation) -> (AccountAddress, TransactionEnvelope) {
    let key = CreatorKey::from_bytes([9u8; 32]);
    let creator = key.address();
    let co_signer = CoSigner::new(key);
    let txn = build(user, creator, op);
    let auth = co_signer.co_sign(&txn).unwrap();
    (creator, TransactionEnvelope::seal(&txn, &auth))
}

#[tokio::test]
async fn purchase_settles_end_to_end_across_the_json_boundary() {
    let wallet = LocalWallet::from_bytes([1u8; 32]);
    let (creator, envelope) = server_side(wallet.address(), &PackOperation::Purchase);

    // the envelope travels as JSON integer arrays
    let wire = serde_json::to_string(&envelope).unwrap();
    let received: TransactionEnvelope = serde_json::from_str(&wire).unwrap();
    assert_eq!(received, envelope);

    let backend = VerifyingBackend::new(wallet.address(), creator);
    let finalizer = Finalizer::new(backend, wallet);
    let outcome = finalizer.finalize(&received).await.unwrap();
    assert!(outcome.result.success);
    assert!(outcome.hash.starts_with("0xhash"));
}

#[tokio::test]
async fn redeem_settles_end_to_end() {
    let wallet = LocalWallet::from_bytes([2u8; 32]);
    let pack_token = AccountAddress::from_hex("0xfeed").unwrap();
    let (creator, envelope) = server_side(
        wallet.address(),
        &PackOperation::Redeem { pack_token },
    );

    let backend = VerifyingBackend::new(wallet.address(), creator);
    let finalizer = Finalizer::new(backend, wallet);
    let outcome = finalizer.finalize(&envelope).await.unwrap();
    assert!(outcome.result.success);
}

#[tokio::test]
async fn swapped_authenticator_slots_are_rejected_by_the_chain() {
    // Submit with the creator's authenticator in the primary slot: the fake
    // backend, like a real node, refuses it.
    let wallet = LocalWallet::from_bytes([3u8; 32]);
    let key = CreatorKey::from_bytes([9u8; 32]);
    let creator = key.address();
    let co_signer = CoSigner::new(key);

    let txn = build(wallet.address(), creator, &PackOperation::Purchase);
    let creator_auth = co_signer.co_sign(&txn).unwrap();
    let user_auth = wallet.sign_multi_agent(&txn).await.unwrap();

    let swapped = SignedTransaction {
        raw_txn: txn.raw_txn.clone(),
        authenticator: TransactionAuthenticator::MultiAgent {
            sender: creator_auth,
            secondary_signer_addresses: txn.secondary_signer_addresses.clone(),
            secondary_signers: vec![user_auth],
        },
    };

    let backend = VerifyingBackend::new(wallet.address(), creator);
    assert!(matches!(
        backend.submit(&swapped).await,
        Err(NodeError::Rejected(_))
    ));
}

#[tokio::test]
async fn poll_failure_after_submission_stays_ambiguous_and_keeps_the_hash() {
    // The node accepted the submission, then became unreachable while the
    // result was being polled. The outcome is unknown, not a failed submit:
    // the caller must re-query by hash, never resubmit.
    struct AcceptsThenDrops;

    #[async_trait]
    impl ChainBackend for AcceptsThenDrops {
        async fn submit(&self, _txn: &SignedTransaction) -> Result<String, NodeError> {
            Ok("0xaccepted".to_string())
        }

        async fn wait_for_settlement(
            &self,
            _hash: &str,
            _timeout: Duration,
        ) -> Result<TxnResult, NodeError> {
            Err(NodeError::Unavailable("connection reset by peer".to_string()))
        }
    }

    let wallet = LocalWallet::from_bytes([5u8; 32]);
    let (_, envelope) = server_side(wallet.address(), &PackOperation::Purchase);
    let finalizer = Finalizer::new(AcceptsThenDrops, wallet);
    match finalizer.finalize(&envelope).await {
        Err(FinalizeError::SettlementUnknown { hash, .. }) => assert_eq!(hash, "0xaccepted"),
        other => panic!("expected an ambiguous settlement outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn settlement_timeout_carries_the_hash_for_requery() {
    struct TimesOut;

    #[async_trait]
    impl ChainBackend for TimesOut {
        async fn submit(&self, _txn: &SignedTransaction) -> Result<String, NodeError> {
            Ok("0xslow".to_string())
        }

        async fn wait_for_settlement(
            &self,
            hash: &str,
            timeout: Duration,
        ) -> Result<TxnResult, NodeError> {
            Err(NodeError::SettlementTimeout {
                hash: hash.to_string(),
                waited_secs: timeout.as_secs(),
            })
        }
    }

    let wallet = LocalWallet::from_bytes([4u8; 32]);
    let (_, envelope) = server_side(wallet.address(), &PackOperation::Purchase);
    let finalizer = Finalizer::new(TimesOut, wallet);
    match finalizer.finalize(&envelope).await {
        Err(FinalizeError::SettlementTimeout { hash }) => assert_eq!(hash, "0xslow"),
        other => panic!("expected settlement timeout, got {other:?}"),
    }
}
