use std::sync::atomic::AtomicBool;

use log::{debug, info, warn};

use super::{Block, pow};
use crate::config::{LedgerConfig, PendingPolicy};
use crate::error::{AdmissionError, LedgerError};
use crate::transaction::Transaction;

/// Single-node in-memory ledger with Proof-of-Work.
///
/// The ledger is the only writer of its chain and pending pool. Both are
/// mutated through `&mut self`, so admission and mining cannot interleave;
/// callers sharing a ledger across threads wrap it in a `Mutex` and hold the
/// lock for the whole of `mine_pending_transactions`.
#[derive(Debug)]
pub struct Ledger {
    chain: Vec<Block>,
    difficulty: u32,
    pending_transactions: Vec<Transaction>,
    mining_reward: u64,
    pending_policy: PendingPolicy,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::from_config(LedgerConfig::default())
    }
}

impl Ledger {
    /// Initialize a new ledger with a genesis block. The difficulty must be
    /// reachable by a hex SHA-256 hash (1..=64).
    pub fn new(difficulty: u32, mining_reward: u64) -> Result<Self, LedgerError> {
        Self::with_config(LedgerConfig {
            difficulty,
            mining_reward,
            pending_policy: PendingPolicy::default(),
        })
    }

    pub fn with_config(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: LedgerConfig) -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            difficulty: config.difficulty,
            pending_transactions: Vec::new(),
            mining_reward: config.mining_reward,
            pending_policy: config.pending_policy,
        };
        ledger.chain.push(Self::create_genesis_block());
        ledger
    }

    pub fn create_genesis_block() -> Block {
        Block::genesis()
    }

    /// Return the last block in the chain.
    pub fn latest_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Ledger should always have at least the genesis block")
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn mining_reward(&self) -> u64 {
        self.mining_reward
    }

    pub fn pending_policy(&self) -> PendingPolicy {
        self.pending_policy
    }

    /// Admit a signed transfer into the pending pool. On rejection the pool
    /// is unchanged and the reason is logged and returned.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<(), AdmissionError> {
        if let Err(reason) = self.check_admission(&tx) {
            warn!(
                "rejected tx {} ({} -> {}, amount {}): {}",
                tx.compute_hash(),
                tx.sender().unwrap_or("<reward>"),
                tx.recipient,
                tx.amount,
                reason
            );
            return Err(reason);
        }

        debug!(
            "admitted tx {} (pool size {} -> {})",
            tx.compute_hash(),
            self.pending_transactions.len(),
            self.pending_transactions.len() + 1
        );
        self.pending_transactions.push(tx);
        Ok(())
    }

    fn check_admission(&self, tx: &Transaction) -> Result<(), AdmissionError> {
        let Some(sender) = tx.sender() else {
            return Err(AdmissionError::RewardNotAdmissible);
        };
        if !tx.is_valid() {
            return Err(AdmissionError::InvalidSignature);
        }
        if tx.amount == 0 {
            return Err(AdmissionError::NonPositiveAmount);
        }

        let mut available = self.balance_of(sender);
        if self.pending_policy == PendingPolicy::Reserve {
            available -= self.pending_debits(sender);
        }
        if available < i128::from(tx.amount) {
            return Err(AdmissionError::InsufficientBalance {
                required: tx.amount,
                available,
            });
        }
        Ok(())
    }

    fn pending_debits(&self, address: &str) -> i128 {
        self.pending_transactions
            .iter()
            .filter(|tx| tx.sender() == Some(address))
            .map(|tx| i128::from(tx.amount))
            .sum()
    }

    /// Seal the whole pending pool plus a reward for `reward_address` into a
    /// new block, mine it and append it. The pool is emptied.
    pub fn mine_pending_transactions(
        &mut self,
        reward_address: &str,
    ) -> Result<&Block, LedgerError> {
        let mut block = self.next_block(reward_address);
        block.mine(self.difficulty)?;
        Ok(self.append(block))
    }

    /// Same as `mine_pending_transactions`, but stops when `cancel` is raised.
    /// A cancelled run leaves both the chain and the pending pool untouched.
    pub fn mine_pending_transactions_cancellable(
        &mut self,
        reward_address: &str,
        cancel: &AtomicBool,
    ) -> Result<&Block, LedgerError> {
        let mut block = self.next_block(reward_address);
        if let Err(e) = block.mine_cancellable(self.difficulty, cancel) {
            warn!("mining of block #{} aborted: {}", block.index, e);
            return Err(e);
        }
        Ok(self.append(block))
    }

    fn next_block(&self, reward_address: &str) -> Block {
        let mut transactions = self.pending_transactions.clone();
        transactions.push(Transaction::reward(reward_address, self.mining_reward));

        let last = self.latest_block();
        Block::new(last.index + 1, last.hash.clone(), transactions)
    }

    fn append(&mut self, block: Block) -> &Block {
        info!(
            "sealed block #{} (hash={}, nonce={}, txs={})",
            block.index,
            block.hash,
            block.nonce,
            block.transactions.len()
        );
        self.chain.push(block);
        self.pending_transactions.clear();
        self.latest_block()
    }

    /// Net balance of `address` over the whole chain: credits minus debits.
    pub fn balance_of(&self, address: &str) -> i128 {
        let mut balance: i128 = 0;
        for tx in self.chain.iter().flat_map(|b| &b.transactions) {
            if tx.sender() == Some(address) {
                balance -= i128::from(tx.amount);
            }
            if tx.recipient == address {
                balance += i128::from(tx.amount);
            }
        }
        balance
    }

    /// Every transaction `address` sent or received, in chain order.
    pub fn transactions_for(&self, address: &str) -> Vec<&Transaction> {
        self.chain
            .iter()
            .flat_map(|b| &b.transactions)
            .filter(|tx| tx.sender() == Some(address) || tx.recipient == address)
            .collect()
    }

    /// Validate the entire chain: genesis, transactions, hashes, linkage and PoW.
    pub fn is_valid(&self) -> bool {
        match self.chain.first() {
            Some(genesis) if *genesis == Self::create_genesis_block() => {}
            _ => {
                warn!("chain invalid: genesis block does not match the canonical one");
                return false;
            }
        }

        for pair in self.chain.windows(2) {
            let (prev, current) = (&pair[0], &pair[1]);

            if !current.has_valid_transactions() {
                warn!(
                    "chain invalid: block #{} holds an invalid transaction",
                    current.index
                );
                return false;
            }
            if current.hash != current.compute_hash() {
                warn!(
                    "chain invalid: block #{} hash does not match its content",
                    current.index
                );
                return false;
            }
            if current.previous_hash != prev.hash {
                warn!(
                    "chain invalid: block #{} is not linked to its predecessor",
                    current.index
                );
                return false;
            }
            if current.index != prev.index + 1 {
                warn!(
                    "chain invalid: block #{} follows block #{}",
                    current.index, prev.index
                );
                return false;
            }
            if !pow::meets_difficulty(&current.hash, self.difficulty) {
                warn!(
                    "chain invalid: block #{} does not meet difficulty {}",
                    current.index, self.difficulty
                );
                return false;
            }
        }

        true
    }
}
