use std::env;

use crate::blockchain::{DEFAULT_DIFFICULTY, DEFAULT_MINING_REWARD, DIFF_MAX};
use crate::error::LedgerError;

pub const ENV_DIFFICULTY: &str = "LEDGER_DIFFICULTY";
pub const ENV_MINING_REWARD: &str = "LEDGER_MINING_REWARD";
pub const ENV_PENDING_POLICY: &str = "LEDGER_PENDING_POLICY";

/// How admission treats debits already waiting in the pending pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingPolicy {
    /// Pending debits of the sender count against its balance.
    #[default]
    Reserve,
    /// Each admission looks at the confirmed balance only, so several pending
    /// transfers from one sender can together overdraw it.
    Independent,
}

impl PendingPolicy {
    fn parse(raw: &str) -> Result<Self, LedgerError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reserve" => Ok(Self::Reserve),
            "independent" => Ok(Self::Independent),
            other => Err(LedgerError::InvalidConfig(format!(
                "{ENV_PENDING_POLICY} must be `reserve` or `independent`, got `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub difficulty: u32,
    pub mining_reward: u64,
    pub pending_policy: PendingPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            pending_policy: PendingPolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Read the config from process environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, LedgerError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, LedgerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_DIFFICULTY) {
            config.difficulty = raw.trim().parse().map_err(|_| {
                LedgerError::InvalidConfig(format!("{ENV_DIFFICULTY} is not a number: `{raw}`"))
            })?;
        }
        if let Some(raw) = lookup(ENV_MINING_REWARD) {
            config.mining_reward = raw.trim().parse().map_err(|_| {
                LedgerError::InvalidConfig(format!("{ENV_MINING_REWARD} is not a number: `{raw}`"))
            })?;
        }
        if let Some(raw) = lookup(ENV_PENDING_POLICY) {
            config.pending_policy = PendingPolicy::parse(&raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.difficulty == 0 || self.difficulty > DIFF_MAX {
            return Err(LedgerError::InvalidConfig(format!(
                "difficulty must be between 1 and {DIFF_MAX}, got {}",
                self.difficulty
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_unset() {
        let config = LedgerConfig::from_vars(|_| None).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.mining_reward, 100);
        assert_eq!(config.pending_policy, PendingPolicy::Reserve);
    }

    #[test]
    fn reads_overrides() {
        let env = vars(&[
            (ENV_DIFFICULTY, "2"),
            (ENV_MINING_REWARD, " 50 "),
            (ENV_PENDING_POLICY, "Independent"),
        ]);
        let config = LedgerConfig::from_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.mining_reward, 50);
        assert_eq!(config.pending_policy, PendingPolicy::Independent);
    }

    #[test]
    fn rejects_bad_values() {
        for (key, value) in [
            (ENV_DIFFICULTY, "four"),
            (ENV_DIFFICULTY, "0"),
            (ENV_DIFFICULTY, "65"),
            (ENV_MINING_REWARD, "-1"),
            (ENV_PENDING_POLICY, "greedy"),
        ] {
            let env = vars(&[(key, value)]);
            let res = LedgerConfig::from_vars(|k| env.get(k).cloned());
            assert!(
                matches!(res, Err(LedgerError::InvalidConfig(_))),
                "{key}={value} should be rejected"
            );
        }
    }
}
