// crates/tally-core/src/types.rs
//
// Shared chain types: account names, block and chain identifiers, versions,
// and the witness-voted median chain properties.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::asset::Asset;
use crate::error::{Result, TallyError};
use crate::protocol::UNITS_PER_COIN;

/// Minimum account name length.
pub const MIN_ACCOUNT_NAME_LENGTH: usize = 3;

/// Maximum account name length.
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 16;

/// A validated account name: lowercase letters, digits, `-` and `.`,
/// starting with a letter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountName(String);

impl AccountName {
    /// Validate and wrap an account name.
    ///
    /// # Errors
    /// Returns `TallyError::InvalidState` if the name is malformed.
    pub fn new(name: &str) -> Result<Self> {
        let len_ok = (MIN_ACCOUNT_NAME_LENGTH..=MAX_ACCOUNT_NAME_LENGTH).contains(&name.len());
        let starts_ok = name.chars().next().is_some_and(|c| c.is_ascii_lowercase());
        let chars_ok = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');

        if !(len_ok && starts_ok && chars_ok) {
            return Err(TallyError::InvalidState(format!(
                "Account name '{}' is invalid",
                name
            )));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A 32-byte digest rendered as lowercase hex.
macro_rules! digest_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name(pub [u8; 32]);

        impl $name {
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Result<Self> {
                let bytes = hex::decode(s).map_err(|e| {
                    TallyError::Serialization(format!("Invalid hex '{}': {}", s, e))
                })?;
                let arr: [u8; 32] = bytes.try_into().map_err(|_| {
                    TallyError::Serialization(format!("Expected 32 bytes in '{}'", s))
                })?;
                Ok(Self(arr))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

digest_type!(BlockId, "Identifier of a block.");
digest_type!(ChainId, "Identifier of a chain, the SHA-256 of its genesis name.");

impl ChainId {
    /// Derive the chain id from the human-readable chain name.
    pub fn from_name(name: &str) -> Self {
        Self(Sha256::digest(name.as_bytes()).into())
    }
}

impl BlockId {
    /// Derive a block id from its predecessor, height, and producer.
    ///
    /// Block production is outside the ledger core; this is the id scheme
    /// used by the bundled block producer.
    pub fn derive(previous: &BlockId, number: u64, witness: &AccountName) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(previous.0);
        hasher.update(number.to_be_bytes());
        hasher.update(witness.as_str().as_bytes());
        Self(hasher.finalize().into())
    }
}

/// A `major.minor.patch` protocol or hardfork version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u16,
}

impl Version {
    pub const fn new(major: u8, minor: u8, patch: u16) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Chain parameters voted by witnesses; the median of the active set applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProperties {
    /// Fee charged for creating an account.
    pub account_creation_fee: Asset,
    /// Maximum serialized block size in bytes.
    pub maximum_block_size: u32,
}

impl Default for ChainProperties {
    fn default() -> Self {
        Self {
            account_creation_fee: Asset::scr(UNITS_PER_COIN / 10),
            maximum_block_size: 128 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_name_validation() {
        assert!(AccountName::new("alice").is_ok());
        assert!(AccountName::new("init-delegate").is_ok());
        assert!(AccountName::new("ab").is_err());
        assert!(AccountName::new("Alice").is_err());
        assert!(AccountName::new("1alice").is_err());
        assert!(AccountName::new("a-very-long-account-name").is_err());
    }

    #[test]
    fn test_chain_id_is_deterministic() {
        assert_eq!(ChainId::from_name("tally"), ChainId::from_name("tally"));
        assert_ne!(ChainId::from_name("tally"), ChainId::from_name("testnet"));
    }

    #[test]
    fn test_block_id_hex() {
        let witness = AccountName::new("alice").unwrap();
        let id = BlockId::derive(&BlockId::default(), 1, &witness);
        assert_eq!(BlockId::from_hex(&id.to_hex()).unwrap(), id);
        assert!(BlockId::from_hex("abcd").is_err());
    }

    #[test]
    fn test_version_display() {
        assert_eq!(Version::new(0, 1, 0).to_string(), "0.1.0");
    }
}
