use thiserror::Error;

/// Hard failures raised by signing, key handling, mining and configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// A key tried to sign a transaction it does not send.
    #[error("key {signer} is not authorized to sign for sender {sender}")]
    Authorization { signer: String, sender: String },

    #[error("invalid key material: {0}")]
    InvalidKey(&'static str),

    #[error("difficulty {difficulty} can never be met by a {max}-digit hash")]
    UnreachableDifficulty { difficulty: u32, max: u32 },

    #[error("mining cancelled at nonce {nonce}")]
    MiningCancelled { nonce: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Reasons a transaction is turned away from the pending pool.
/// The pool is left untouched whenever one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("signature is missing or does not match the sender")]
    InvalidSignature,

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: i128 },

    #[error("reward transactions are only created by mining")]
    RewardNotAdmissible,
}
