use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};

use crate::error::LedgerError;

/// A secp256k1 keypair. The address is the hex of the compressed public key.
#[derive(Debug, Clone)]
pub struct Wallet {
    secret_key: SecretKey,
    public_key: PublicKey,
    address: String,
}

impl Wallet {
    /// Generate a fresh keypair from the OS RNG.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self::from_parts(secret_key, public_key)
    }

    /// Restore a wallet from a hex-encoded 32-byte secret key.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self, LedgerError> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|_| LedgerError::InvalidKey("invalid secret key hex"))?;
        let secret_key = SecretKey::from_slice(&bytes)
            .map_err(|_| LedgerError::InvalidKey("invalid secret key bytes"))?;
        let secp = Secp256k1::signing_only();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self::from_parts(secret_key, public_key))
    }

    fn from_parts(secret_key: SecretKey, public_key: PublicKey) -> Self {
        let address = hex::encode(public_key.serialize()); // compressed (33 bytes)
        Self {
            secret_key,
            public_key,
            address,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Sign a 32-byte digest and return the hex-encoded DER signature.
    pub fn sign_digest(&self, msg32: &[u8; 32]) -> Result<String, LedgerError> {
        let secp = Secp256k1::signing_only();
        let msg = Message::from_slice(msg32)
            .map_err(|_| LedgerError::InvalidKey("invalid message length"))?;
        let sig = secp.sign_ecdsa(&msg, &self.secret_key);
        let der = sig.serialize_der();
        Ok(hex::encode(&der[..]))
    }
}

/// Normalize a hex public key into its address form (lowercase compressed hex).
pub fn pubkey_to_address_hex(pubkey_hex: &str) -> Result<String, LedgerError> {
    let bytes =
        hex::decode(pubkey_hex).map_err(|_| LedgerError::InvalidKey("invalid pubkey hex"))?;
    let pk = PublicKey::from_slice(&bytes)
        .map_err(|_| LedgerError::InvalidKey("invalid pubkey bytes"))?;
    Ok(hex::encode(pk.serialize()))
}

/// Verify a signature (hex DER) against the given pubkey (hex) and message hash.
pub fn verify_signature_hex(
    pubkey_hex: &str,
    sig_hex: &str,
    msg32: &[u8; 32],
) -> Result<bool, LedgerError> {
    let secp = Secp256k1::verification_only();

    let sig_bytes =
        hex::decode(sig_hex).map_err(|_| LedgerError::InvalidKey("invalid signature hex"))?;
    let sig = Signature::from_der(&sig_bytes)
        .map_err(|_| LedgerError::InvalidKey("invalid DER signature"))?;

    let pk_bytes =
        hex::decode(pubkey_hex).map_err(|_| LedgerError::InvalidKey("invalid pubkey hex"))?;
    let pk = PublicKey::from_slice(&pk_bytes)
        .map_err(|_| LedgerError::InvalidKey("invalid pubkey bytes"))?;

    let msg = Message::from_slice(msg32)
        .map_err(|_| LedgerError::InvalidKey("invalid message length"))?;
    Ok(secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
}
