//! Chain account addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::error::AddressError;

/// Scheme byte appended to an Ed25519 public key when deriving the
/// authentication key of a single-signer account.
const ED25519_SCHEME: u8 = 0;

/// A 32-byte account address.
///
/// BCS encodes the address as 32 raw bytes with no length prefix, which is
/// what the chain hashes and verifies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountAddress(pub [u8; 32]);

impl AccountAddress {
    pub const LENGTH: usize = 32;

    pub const ZERO: AccountAddress = AccountAddress([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        AccountAddress(bytes)
    }

    /// Parse an address from hex, with or without a `0x` prefix. Short forms
    /// are left-padded to 32 bytes, matching the chain's textual convention.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() {
            return Err(AddressError("empty address".to_string()));
        }
        if digits.len() > Self::LENGTH * 2 {
            return Err(AddressError(format!(
                "address too long: {} hex digits (max {})",
                digits.len(),
                Self::LENGTH * 2
            )));
        }
        let padded = format!("{digits:0>64}");
        let raw = hex::decode(&padded)
            .map_err(|e| AddressError(format!("invalid hex in address: {e}")))?;
        let mut bytes = [0u8; Self::LENGTH];
        bytes.copy_from_slice(&raw);
        Ok(AccountAddress(bytes))
    }

    /// Derive the account address for a single Ed25519 public key:
    /// `sha3-256(pubkey || scheme_byte)`.
    pub fn from_ed25519_public_key(public_key: &[u8; 32]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(public_key);
        hasher.update([ED25519_SCHEME]);
        let digest = hasher.finalize();
        let mut bytes = [0u8; Self::LENGTH];
        bytes.copy_from_slice(&digest);
        AccountAddress(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full-width hex form with `0x` prefix.
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_literal())
    }
}

impl FromStr for AccountAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountAddress::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_forms() {
        let one = AccountAddress::from_hex("0x1").unwrap();
        let mut expected = [0u8; 32];
        expected[31] = 1;
        assert_eq!(one.0, expected);

        let full = AccountAddress::from_hex(
            "0x553faabe7ca12e3664f05c9a3d2f378e5779bc5b45ea90b05804a655e64b282a",
        )
        .unwrap();
        assert_eq!(
            full.to_hex_literal(),
            "0x553faabe7ca12e3664f05c9a3d2f378e5779bc5b45ea90b05804a655e64b282a"
        );
        assert_eq!(full, full.to_hex_literal().parse().unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(AccountAddress::from_hex("").is_err());
        assert!(AccountAddress::from_hex("0x").is_err());
        assert!(AccountAddress::from_hex("0xzz").is_err());
        let too_long = format!("0x{}", "a".repeat(65));
        assert!(AccountAddress::from_hex(&too_long).is_err());
    }

    #[test]
    fn bcs_form_is_32_raw_bytes() {
        let addr = AccountAddress::from_hex("0x2a").unwrap();
        let bytes = bcs::to_bytes(&addr).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes, addr.0.to_vec());
    }
}
