use crate::error::SignatureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 20-byte on-chain address, always stored and compared lower-cased
/// (§3 Wallet invariant: "on-chain address (40 hex chars with 0x prefix,
/// stored lower-cased)").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Parses `0x` + 40 hex chars, case-insensitively, normalizing storage
    /// to lower-case per §3.
    pub fn parse(s: &str) -> Result<Self, SignatureError> {
        let hex_part = s.strip_prefix("0x").ok_or(SignatureError::InvalidAddress)?;
        if hex_part.len() != 40 {
            return Err(SignatureError::InvalidAddress);
        }
        let bytes = hex::decode(hex_part).map_err(|_| SignatureError::InvalidAddress)?;
        let bytes: [u8; 20] = bytes.try_into().map_err(|_| SignatureError::InvalidAddress)?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = SignatureError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = SignatureError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Address::parse(&s)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> String {
        a.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_case_and_normalizes_to_lowercase() {
        let addr = Address::parse("0xAbC0000000000000000000000000000000000D").unwrap();
        assert_eq!(
            addr.to_string(),
            "0xabc0000000000000000000000000000000000d"
        );
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Address::parse("0xabc").is_err());
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(Address::parse("abc0000000000000000000000000000000000d").is_err());
    }
}
