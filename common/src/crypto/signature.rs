use super::address::Address;
use crate::error::SignatureError;
use sha3::{Digest, Keccak256};

/// A 65-byte `r ∥ s ∥ v` ECDSA signature over a typed-data hash (§4.4).
#[derive(Debug, Clone, Copy)]
pub struct Signature([u8; 65]);

impl Signature {
    /// Parses a `0x` + 130 hex char signature (§6 wire format). Length is
    /// checked before anything else, matching §4.4's ordering.
    pub fn parse(s: &str) -> Result<Self, SignatureError> {
        let hex_part = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(hex_part).map_err(|_| SignatureError::InvalidSignatureLength)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.len() != 65 {
            return Err(SignatureError::InvalidSignatureLength);
        }
        let mut arr = [0u8; 65];
        arr.copy_from_slice(bytes);
        Ok(Signature(arr))
    }

    fn r_s(&self) -> &[u8; 64] {
        self.0[..64].try_into().expect("slice is exactly 64 bytes")
    }

    /// Recovery id normalized from the wire encoding: Ethereum wallets use
    /// 27/28, some clients send the raw 0/1 id directly (§4.4 step 5).
    fn recovery_id(&self) -> Result<libsecp256k1::RecoveryId, SignatureError> {
        let v = self.0[64];
        let normalized = match v {
            27 | 28 => v - 27,
            0 | 1 => v,
            _ => return Err(SignatureError::InvalidSignature),
        };
        libsecp256k1::RecoveryId::parse(normalized).map_err(|_| SignatureError::InvalidSignature)
    }
}

/// Recovers the signer's on-chain address from a signature over
/// `message_hash` (§4.4 step 5).
pub fn recover_address(
    message_hash: &[u8; 32],
    signature: &Signature,
) -> Result<Address, SignatureError> {
    let recovery_id = signature.recovery_id()?;
    let sig = libsecp256k1::Signature::parse_standard(signature.r_s())
        .map_err(|_| SignatureError::InvalidSignature)?;
    let message = libsecp256k1::Message::parse(message_hash);

    let public_key = libsecp256k1::recover(&message, &sig, &recovery_id)
        .map_err(|_| SignatureError::InvalidSignature)?;

    Ok(public_key_to_address(&public_key))
}

fn public_key_to_address(public_key: &libsecp256k1::PublicKey) -> Address {
    // Uncompressed SEC1 encoding is `0x04 ∥ x ∥ y`; the on-chain address is
    // the low 20 bytes of keccak256(x ∥ y), the standard Ethereum-style
    // address derivation.
    let uncompressed = public_key.serialize();
    let mut hasher = Keccak256::new();
    hasher.update(&uncompressed[1..]);
    let hash: [u8; 32] = hasher.finalize().into();
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    Address::from_bytes(addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert!(Signature::from_bytes(&[0u8; 64]).is_err());
        assert!(Signature::from_bytes(&[0u8; 66]).is_err());
    }

    #[test]
    fn round_trips_a_real_signature() {
        let secret = libsecp256k1::SecretKey::random(&mut rand::rngs::OsRng);
        let public = libsecp256k1::PublicKey::from_secret_key(&secret);
        let expected_address = public_key_to_address(&public);

        let message_hash = [7u8; 32];
        let message = libsecp256k1::Message::parse(&message_hash);
        let (sig, recovery_id) = libsecp256k1::sign(&message, &secret);

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&sig.serialize());
        bytes[64] = recovery_id.serialize() + 27;

        let signature = Signature::from_bytes(&bytes).unwrap();
        let recovered = recover_address(&message_hash, &signature).unwrap();
        assert_eq!(recovered, expected_address);
    }

    #[test]
    fn rejects_bad_recovery_byte() {
        let mut bytes = [1u8; 65];
        bytes[64] = 99;
        let signature = Signature::from_bytes(&bytes).unwrap();
        assert!(recover_address(&[0u8; 32], &signature).is_err());
    }
}
