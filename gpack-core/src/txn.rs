//! Canonical transaction types.
//!
//! These mirror the chain's own BCS layout so that bytes produced here are
//! byte-for-byte what the network hashes, signs over and verifies. Variant
//! order in every enum is load-bearing and must not change.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::address::AccountAddress;

/// Domain-separation prefix for multi-agent signing messages:
/// `sha3-256("APTOS::RawTransactionWithData")`.
static RAW_TXN_WITH_DATA_SALT: Lazy<[u8; 32]> = Lazy::new(|| {
    let digest = Sha3_256::digest(b"APTOS::RawTransactionWithData");
    let mut salt = [0u8; 32];
    salt.copy_from_slice(&digest);
    salt
});

/// A Move identifier (module or function name).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Identifier(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fully-qualified module: publishing address plus module name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId {
    pub address: AccountAddress,
    pub name: Identifier,
}

/// Move type tag. The co-signing flow never passes type arguments, but the
/// enum carries the chain's full variant table so indices line up on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
    U16,
    U32,
    U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructTag {
    pub address: AccountAddress,
    pub module: Identifier,
    pub name: Identifier,
    pub type_args: Vec<TypeTag>,
}

/// An entry-function call: target module, function name, type arguments and
/// positionally BCS-encoded arguments. Argument order must match the declared
/// parameter order of the target function; encoding is positional and a
/// mismatch is a logic error, not a format error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFunction {
    pub module: ModuleId,
    pub function: Identifier,
    pub ty_args: Vec<TypeTag>,
    pub args: Vec<Vec<u8>>,
}

/// Transaction payload. Only entry-function payloads are produced or accepted
/// by this toolkit; the other arms exist so the variant indices match the
/// chain and decode attempts on them fail closed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionPayload {
    /// Script payloads are out of scope here.
    Script,
    /// Deprecated on-chain; retained for index alignment.
    ModuleBundle,
    EntryFunction(EntryFunction),
    Multisig,
}

/// Chain identifier byte carried in every transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainId(pub u8);

/// The unsigned inner transaction, exactly as the chain encodes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub sender: AccountAddress,
    pub sequence_number: u64,
    pub payload: TransactionPayload,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub expiration_timestamp_secs: u64,
    pub chain_id: ChainId,
}

/// Serialization view of the message both agents sign. `MultiAgent` must stay
/// at variant index 0.
#[derive(Serialize)]
enum RawTransactionWithData<'a> {
    MultiAgent {
        raw_txn: &'a RawTransaction,
        secondary_signer_addresses: &'a Vec<AccountAddress>,
    },
}

/// An unsigned multi-agent transaction: the raw transaction, the ordered
/// secondary-signer list, and a fee-payer slot that this protocol keeps
/// permanently empty (the user's account funds the transaction).
///
/// The BCS layout matches the SDK transport wrapper: raw transaction, then
/// the secondary address vector, then the optional fee payer. Created fresh
/// per request, immutable once serialized, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedMultiAgentTransaction {
    pub raw_txn: RawTransaction,
    pub secondary_signer_addresses: Vec<AccountAddress>,
    pub fee_payer_address: Option<AccountAddress>,
}

impl UnsignedMultiAgentTransaction {
    /// The exact byte string every signer (primary and secondary) signs:
    /// domain-separation salt followed by the BCS form of the raw transaction
    /// together with the ordered secondary-signer addresses. Any field
    /// mutation after signing invalidates existing authenticators.
    pub fn signing_message(&self) -> Vec<u8> {
        let body = RawTransactionWithData::MultiAgent {
            raw_txn: &self.raw_txn,
            secondary_signer_addresses: &self.secondary_signer_addresses,
        };
        let mut message = RAW_TXN_WITH_DATA_SALT.to_vec();
        // BCS serialization of these fixed shapes cannot fail.
        message.extend(bcs::to_bytes(&body).unwrap());
        message
    }

    /// The entry function this transaction invokes, if any.
    pub fn entry_function(&self) -> Option<&EntryFunction> {
        match &self.raw_txn.payload {
            TransactionPayload::EntryFunction(entry) => Some(entry),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raw_txn() -> RawTransaction {
        RawTransaction {
            sender: AccountAddress::from_hex("0xa11ce").unwrap(),
            sequence_number: 7,
            payload: TransactionPayload::EntryFunction(EntryFunction {
                module: ModuleId {
                    address: AccountAddress::from_hex("0x553f").unwrap(),
                    name: Identifier::new("galactic_packs"),
                },
                function: Identifier::new("buy_pack"),
                ty_args: vec![],
                args: vec![],
            }),
            max_gas_amount: 200_000,
            gas_unit_price: 100,
            expiration_timestamp_secs: 1_700_000_020,
            chain_id: ChainId(2),
        }
    }

    #[test]
    fn signing_message_is_salted_and_deterministic() {
        let txn = UnsignedMultiAgentTransaction {
            raw_txn: sample_raw_txn(),
            secondary_signer_addresses: vec![AccountAddress::from_hex("0xc0de").unwrap()],
            fee_payer_address: None,
        };
        let m1 = txn.signing_message();
        let m2 = txn.signing_message();
        assert_eq!(m1, m2);
        assert_eq!(&m1[..32], &*RAW_TXN_WITH_DATA_SALT);
        // variant index 0 for MultiAgent follows the salt
        assert_eq!(m1[32], 0);
    }

    #[test]
    fn signing_message_covers_secondary_signer_order() {
        let a = AccountAddress::from_hex("0xa").unwrap();
        let b = AccountAddress::from_hex("0xb").unwrap();
        let txn = |signers: Vec<AccountAddress>| UnsignedMultiAgentTransaction {
            raw_txn: sample_raw_txn(),
            secondary_signer_addresses: signers,
            fee_payer_address: None,
        };
        assert_ne!(
            txn(vec![a, b]).signing_message(),
            txn(vec![b, a]).signing_message()
        );
    }

    #[test]
    fn entry_function_payload_round_trips() {
        let txn = UnsignedMultiAgentTransaction {
            raw_txn: sample_raw_txn(),
            secondary_signer_addresses: vec![AccountAddress::from_hex("0xc0de").unwrap()],
            fee_payer_address: None,
        };
        let bytes = bcs::to_bytes(&txn).unwrap();
        let back: UnsignedMultiAgentTransaction = bcs::from_bytes(&bytes).unwrap();
        assert_eq!(txn, back);
        assert_eq!(back.entry_function().unwrap().function.as_str(), "buy_pack");
    }
}
