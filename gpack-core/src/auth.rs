//! Account and transaction authenticators.
//!
//! An authenticator proves that a specific account approved a specific
//! transaction's exact signing message. On the wire, Ed25519 keys and
//! signatures are length-prefixed byte strings (unlike addresses, which are
//! fixed-width), so both wrappers implement serde by hand.

use std::fmt;

use ed25519_dalek::{Signature as DalekSignature, VerifyingKey};
use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::AccountAddress;
use crate::txn::RawTransaction;

/// A 32-byte Ed25519 public key, BCS-encoded as a length-prefixed byte string.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519PublicKey(pub [u8; 32]);

/// A 64-byte Ed25519 signature, BCS-encoded as a length-prefixed byte string.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature(pub [u8; 64]);

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519PublicKey(0x{})", hex::encode(self.0))
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Signature(0x{})", hex::encode(self.0))
    }
}

impl Serialize for Ed25519PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Ed25519PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;
        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = Ed25519PublicKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 32-byte Ed25519 public key")
            }

            fn visit_bytes<E: DeError>(self, v: &[u8]) -> Result<Self::Value, E> {
                let bytes: [u8; 32] = v
                    .try_into()
                    .map_err(|_| E::invalid_length(v.len(), &self))?;
                Ok(Ed25519PublicKey(bytes))
            }
        }
        deserializer.deserialize_bytes(KeyVisitor)
    }
}

impl Serialize for Ed25519Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Ed25519Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SigVisitor;
        impl<'de> Visitor<'de> for SigVisitor {
            type Value = Ed25519Signature;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 64-byte Ed25519 signature")
            }

            fn visit_bytes<E: DeError>(self, v: &[u8]) -> Result<Self::Value, E> {
                let bytes: [u8; 64] = v
                    .try_into()
                    .map_err(|_| E::invalid_length(v.len(), &self))?;
                Ok(Ed25519Signature(bytes))
            }
        }
        deserializer.deserialize_bytes(SigVisitor)
    }
}

/// Proof that one account approved a signing message. Only the Ed25519 arm is
/// produced or accepted here; the remaining arms keep the chain's variant
/// indices and fail validation if they ever appear in an envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountAuthenticator {
    Ed25519 {
        public_key: Ed25519PublicKey,
        signature: Ed25519Signature,
    },
    MultiEd25519,
    SingleKey,
    MultiKey,
    NoAccountAuthenticator,
}

impl AccountAuthenticator {
    /// The address this authenticator speaks for, derived from the public key.
    pub fn account_address(&self) -> Option<AccountAddress> {
        match self {
            AccountAuthenticator::Ed25519 { public_key, .. } => {
                Some(AccountAddress::from_ed25519_public_key(&public_key.0))
            }
            _ => None,
        }
    }

    /// Verify this authenticator against a signing message. Signature checks
    /// are pure and local; a failure is never transient.
    pub fn verify(&self, message: &[u8]) -> bool {
        match self {
            AccountAuthenticator::Ed25519 {
                public_key,
                signature,
            } => {
                let Ok(key) = VerifyingKey::from_bytes(&public_key.0) else {
                    return false;
                };
                let sig = DalekSignature::from_bytes(&signature.0);
                key.verify_strict(message, &sig).is_ok()
            }
            _ => false,
        }
    }
}

/// Transaction-level authenticator. Only the multi-agent arm is used; the
/// others hold the chain's variant positions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionAuthenticator {
    Ed25519,
    MultiEd25519,
    MultiAgent {
        sender: AccountAuthenticator,
        secondary_signer_addresses: Vec<AccountAddress>,
        secondary_signers: Vec<AccountAuthenticator>,
    },
    FeePayer,
    SingleSender,
}

/// A fully-authenticated transaction ready for submission. The chain rejects
/// any submission whose authenticator count or order does not match the
/// declared signers, so this is only ever constructed with the primary
/// authenticator first and the secondary authenticators in declared order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub raw_txn: RawTransaction,
    pub authenticator: TransactionAuthenticator,
}

impl SignedTransaction {
    /// Canonical submission bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Fixed shapes; serialization cannot fail.
        bcs::to_bytes(self).unwrap()
    }
}
