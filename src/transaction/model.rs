use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::LedgerError;
use crate::wallet::{Wallet, verify_signature_hex};

/// Who a transaction comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TxKind {
    /// Issued by the ledger itself when a block is mined. Carries no signature.
    Reward,
    /// Value moved out of `sender`, an address (hex compressed public key).
    Transfer { sender: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TxKind,
    pub recipient: String,
    pub amount: u64,
    pub timestamp: i64, // Unix milliseconds (UTC)
    /// Hex-encoded DER ECDSA signature
    pub signature: Option<String>,
}

impl Transaction {
    /// Build an unsigned transfer stamped with the current time.
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Self::with_timestamp(
            TxKind::Transfer {
                sender: sender.into(),
            },
            recipient,
            amount,
            Utc::now().timestamp_millis(),
        )
    }

    /// Build a mining reward paid to `recipient`.
    pub fn reward(recipient: impl Into<String>, amount: u64) -> Self {
        Self::with_timestamp(
            TxKind::Reward,
            recipient,
            amount,
            Utc::now().timestamp_millis(),
        )
    }

    pub fn with_timestamp(
        kind: TxKind,
        recipient: impl Into<String>,
        amount: u64,
        timestamp: i64,
    ) -> Self {
        Self {
            kind,
            recipient: recipient.into(),
            amount,
            timestamp,
            signature: None,
        }
    }

    /// The sending address, `None` for rewards.
    pub fn sender(&self) -> Option<&str> {
        match &self.kind {
            TxKind::Reward => None,
            TxKind::Transfer { sender } => Some(sender),
        }
    }

    pub fn is_reward(&self) -> bool {
        matches!(self.kind, TxKind::Reward)
    }

    /// SHA-256 over (sender, recipient, amount, timestamp). The signature is
    /// not part of the preimage, so this is stable across signing.
    pub fn digest(&self) -> [u8; 32] {
        let preimage = format!(
            "{}:{}:{}:{}",
            self.sender().unwrap_or_default(),
            self.recipient,
            self.amount,
            self.timestamp
        );
        Sha256::digest(preimage.as_bytes()).into()
    }

    pub fn compute_hash(&self) -> String {
        hex::encode(self.digest())
    }

    /// Sign with the sender's wallet. Only the owner of `sender` may sign,
    /// and rewards cannot be signed at all.
    pub fn sign(&mut self, wallet: &Wallet) -> Result<(), LedgerError> {
        let sender = match &self.kind {
            TxKind::Transfer { sender } if sender == wallet.address() => sender,
            TxKind::Transfer { sender } => {
                return Err(LedgerError::Authorization {
                    signer: wallet.address().to_string(),
                    sender: sender.clone(),
                });
            }
            TxKind::Reward => {
                return Err(LedgerError::Authorization {
                    signer: wallet.address().to_string(),
                    sender: String::from("<reward>"),
                });
            }
        };
        debug!("signing tx {} for {}", self.compute_hash(), sender);
        self.signature = Some(wallet.sign_digest(&self.digest())?);
        Ok(())
    }

    /// Rewards are trusted. Transfers need a signature that verifies against
    /// the sender's public key; anything missing or malformed is invalid.
    pub fn is_valid(&self) -> bool {
        let sender = match &self.kind {
            TxKind::Reward => return true,
            TxKind::Transfer { sender } => sender,
        };
        let Some(signature) = self.signature.as_deref() else {
            debug!("tx {} has no signature", self.compute_hash());
            return false;
        };
        match verify_signature_hex(sender, signature, &self.digest()) {
            Ok(ok) => ok,
            Err(e) => {
                debug!("tx {} failed verification: {}", self.compute_hash(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed(from: &Wallet, to: &str, amount: u64) -> Transaction {
        let mut tx = Transaction::new(from.address(), to, amount);
        tx.sign(from).unwrap();
        tx
    }

    #[test]
    fn sign_then_verify() {
        let alice = Wallet::generate();
        let bob = Wallet::generate();
        let tx = signed(&alice, bob.address(), 10);
        assert!(tx.signature.is_some());
        assert!(tx.is_valid());
    }

    #[test]
    fn hash_is_stable_across_signing() {
        let alice = Wallet::generate();
        let mut tx = Transaction::new(alice.address(), "bob", 5);
        let before = tx.compute_hash();
        tx.sign(&alice).unwrap();
        assert_eq!(before, tx.compute_hash());
    }

    #[test]
    fn foreign_key_cannot_sign() {
        let alice = Wallet::generate();
        let mallory = Wallet::generate();
        let mut tx = Transaction::new(alice.address(), "bob", 5);

        let err = tx.sign(&mallory).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Authorization {
                signer: mallory.address().to_string(),
                sender: alice.address().to_string(),
            }
        );
        assert!(tx.signature.is_none());
    }

    #[test]
    fn reward_cannot_be_signed() {
        let w = Wallet::generate();
        let mut tx = Transaction::reward(w.address(), 100);
        assert!(matches!(
            tx.sign(&w),
            Err(LedgerError::Authorization { .. })
        ));
    }

    #[test]
    fn reward_is_trusted_but_unsigned_transfer_is_not() {
        let reward = Transaction::reward("miner", 100);
        assert!(reward.sender().is_none());
        assert!(reward.signature.is_none());
        assert!(reward.is_valid());

        let alice = Wallet::generate();
        let transfer = Transaction::new(alice.address(), "bob", 1);
        assert!(transfer.signature.is_none());
        assert!(!transfer.is_valid());
    }

    #[test]
    fn mutation_after_signing_invalidates() {
        let alice = Wallet::generate();
        let mut tx = signed(&alice, "bob", 10);
        tx.amount = 1_000;
        assert!(!tx.is_valid());
    }

    #[test]
    fn garbage_signature_is_invalid() {
        let alice = Wallet::generate();
        let mut tx = Transaction::new(alice.address(), "bob", 10);
        tx.signature = Some("deadbeef".into());
        assert!(!tx.is_valid());
    }

    #[test]
    fn non_key_sender_is_invalid() {
        let mut tx = Transaction::new("not-a-key", "bob", 10);
        tx.signature = Some("3006020101020101".into());
        assert!(!tx.is_valid());
    }
}
