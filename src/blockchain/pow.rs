use std::sync::atomic::{AtomicBool, Ordering};

use super::DIFF_MAX;
use crate::error::LedgerError;

/// Hex digit every leading position of a mined hash must equal.
pub const TARGET_DIGIT: char = '0';

/// How many nonces are tried between two looks at the cancel flag.
pub const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// True when the first `difficulty` characters of `hash` are all `TARGET_DIGIT`.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.chars().take(difficulty).all(|c| c == TARGET_DIGIT)
}

/// Refuse targets longer than the hash itself; searching for them never ends.
pub fn check_difficulty(difficulty: u32) -> Result<(), LedgerError> {
    if difficulty > DIFF_MAX {
        return Err(LedgerError::UnreachableDifficulty {
            difficulty,
            max: DIFF_MAX,
        });
    }
    Ok(())
}

/// Linear nonce search starting at `start`. `hash_at` maps a nonce to the
/// header hash. Returns the first (nonce, hash) meeting the target, or
/// `Err(nonce)` with the nonce reached when `cancel` was raised.
pub fn search<F>(
    start: u64,
    difficulty: u32,
    cancel: Option<&AtomicBool>,
    hash_at: F,
) -> Result<(u64, String), u64>
where
    F: Fn(u64) -> String,
{
    let mut nonce = start;
    let mut tried: u64 = 0;
    loop {
        if let Some(flag) = cancel {
            if tried % CANCEL_CHECK_INTERVAL == 0 && flag.load(Ordering::Relaxed) {
                return Err(nonce);
            }
        }
        let hash = hash_at(nonce);
        if meets_difficulty(&hash, difficulty) {
            return Ok((nonce, hash));
        }
        nonce = nonce.wrapping_add(1);
        tried = tried.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_prefix() {
        assert!(meets_difficulty("00ab", 2));
        assert!(!meets_difficulty("0a0b", 2));
        assert!(meets_difficulty("abcd", 0));
        assert!(!meets_difficulty("00", 3));
    }

    #[test]
    fn difficulty_bound() {
        assert!(check_difficulty(0).is_ok());
        assert!(check_difficulty(64).is_ok());
        assert_eq!(
            check_difficulty(65),
            Err(LedgerError::UnreachableDifficulty {
                difficulty: 65,
                max: 64
            })
        );
    }

    #[test]
    fn search_returns_first_match() {
        let hash_at = |n: u64| {
            if n == 7 {
                String::from("0x")
            } else {
                String::from("x")
            }
        };
        let (nonce, hash) = search(0, 1, None, hash_at).unwrap();
        assert_eq!(nonce, 7);
        assert_eq!(hash, "0x");
    }

    #[test]
    fn search_stops_when_cancelled() {
        let flag = AtomicBool::new(true);
        assert_eq!(search(42, 64, Some(&flag), |_| "f".repeat(64)), Err(42));
    }
}
