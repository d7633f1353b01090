use std::sync::atomic::AtomicBool;

use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::GENESIS_TIMESTAMP;
use super::pow;
use crate::error::LedgerError;
use crate::transaction::Transaction;

/// A single block in the ledger holding a list of transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: i64, // Unix milliseconds (UTC)
    pub previous_hash: String,
    pub nonce: u64,   // Proof-of-Work nonce
    pub hash: String, // Cached hash of the block
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The canonical first block. Fixed content, hashed but never mined.
    pub fn genesis() -> Self {
        Self::new_with_timestamp(0, String::from("0"), Vec::new(), GENESIS_TIMESTAMP)
    }

    /// Create a new block (not mined yet). Call `mine()` to perform PoW.
    pub fn new(index: u64, previous_hash: String, transactions: Vec<Transaction>) -> Self {
        Self::new_with_timestamp(
            index,
            previous_hash,
            transactions,
            Utc::now().timestamp_millis(),
        )
    }

    pub fn new_with_timestamp(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        timestamp: i64,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            previous_hash,
            nonce: 0,
            hash: String::new(),
            transactions,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Digest of the transaction list: every transaction's content hash and
    /// signature, in inclusion order.
    pub fn transactions_root(&self) -> String {
        let mut hasher = Sha256::new();
        for tx in &self.transactions {
            hasher.update(tx.digest());
            hasher.update(tx.signature.as_deref().unwrap_or_default().as_bytes());
            hasher.update(b"|");
        }
        hex::encode(hasher.finalize())
    }

    /// SHA-256 over index, timestamp, previous hash, nonce and the
    /// transactions root (the `hash` field itself is excluded).
    pub fn compute_hash(&self) -> String {
        hash_header(
            self.index,
            self.timestamp,
            &self.previous_hash,
            self.nonce,
            &self.transactions_root(),
        )
    }

    /// Perform Proof-of-Work by finding a nonce that yields a hash
    /// starting with `difficulty` leading zeros (in hex).
    pub fn mine(&mut self, difficulty: u32) -> Result<(), LedgerError> {
        pow::check_difficulty(difficulty)?;
        // Without a cancel flag the search only returns on success.
        if let Ok((nonce, hash)) = self.search(difficulty, None) {
            self.nonce = nonce;
            self.hash = hash;
        }
        Ok(())
    }

    /// Like `mine`, but gives up once `cancel` is raised. On cancellation the
    /// block keeps the nonce the search reached and is not sealed.
    pub fn mine_cancellable(
        &mut self,
        difficulty: u32,
        cancel: &AtomicBool,
    ) -> Result<(), LedgerError> {
        pow::check_difficulty(difficulty)?;
        match self.search(difficulty, Some(cancel)) {
            Ok((nonce, hash)) => {
                self.nonce = nonce;
                self.hash = hash;
                Ok(())
            }
            Err(nonce) => {
                self.nonce = nonce;
                self.hash = self.compute_hash();
                Err(LedgerError::MiningCancelled { nonce })
            }
        }
    }

    fn search(&self, difficulty: u32, cancel: Option<&AtomicBool>) -> Result<(u64, String), u64> {
        // The transactions root does not change while searching.
        let root = self.transactions_root();
        let found = pow::search(self.nonce, difficulty, cancel, |nonce| {
            hash_header(self.index, self.timestamp, &self.previous_hash, nonce, &root)
        });
        if let Ok((nonce, _)) = &found {
            debug!(
                "block #{} solved at nonce {} (difficulty {})",
                self.index, nonce, difficulty
            );
        }
        found
    }

    /// True iff every transaction verifies. Stops at the first bad one.
    pub fn has_valid_transactions(&self) -> bool {
        self.transactions.iter().all(Transaction::is_valid)
    }

    /// Validate that the block's cached `hash` matches its content and
    /// satisfies the PoW difficulty. (Does NOT validate chain linkage.)
    pub fn is_valid(&self, difficulty: u32) -> bool {
        self.hash == self.compute_hash() && pow::meets_difficulty(&self.hash, difficulty)
    }
}

fn hash_header(index: u64, timestamp: i64, previous_hash: &str, nonce: u64, root: &str) -> String {
    let preimage = format!("{index}:{timestamp}:{previous_hash}:{nonce}:{root}");
    hex::encode(Sha256::digest(preimage.as_bytes()))
}
