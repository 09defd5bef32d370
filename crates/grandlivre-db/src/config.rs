//! Ledger configuration.
//!
//! Loaded from environment variables with fallback to defaults:
//!
//! | Variable                      | Default           |
//! |-------------------------------|-------------------|
//! | `GRANDLIVRE_DATABASE_PATH`    | `grandlivre.db`   |
//! | `GRANDLIVRE_MAX_CONNECTIONS`  | `5`               |
//! | `GRANDLIVRE_ACCOUNT_<ROLE>`   | SYSCOHADA code    |
//!
//! `<ROLE>` is an upper-cased [`AccountCodes::ROLES`] entry, e.g.
//! `GRANDLIVRE_ACCOUNT_CASH=5711`.

use std::env;
use std::path::PathBuf;

use crate::pool::DbConfig;
use grandlivre_core::validation::validate_account_code;
use grandlivre_core::AccountCodes;

const ENV_PREFIX: &str = "GRANDLIVRE_";

/// Database location plus the account numbering to post with.
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    pub database_path: PathBuf,
    pub max_connections: u32,
    pub codes: AccountCodes,
}

impl LedgerSettings {
    /// Load settings from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        let database_path = var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("grandlivre.db"));

        let max_connections = match var("MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue(format!("{ENV_PREFIX}MAX_CONNECTIONS")))?,
            None => 5,
        };

        let mut codes = AccountCodes::default();
        for role in AccountCodes::ROLES {
            let key = format!("ACCOUNT_{}", role.to_ascii_uppercase());
            if let Some(code) = var(&key) {
                let code = code.trim().to_string();
                if validate_account_code(&code).is_err() {
                    return Err(ConfigError::InvalidValue(format!("{ENV_PREFIX}{key}")));
                }
                if let Some(slot) = codes.role_mut(role) {
                    *slot = code;
                }
            }
        }

        Ok(LedgerSettings {
            database_path,
            max_connections,
            codes,
        })
    }

    /// Pool configuration for these settings.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<LedgerSettings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LedgerSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.database_path, PathBuf::from("grandlivre.db"));
        assert_eq!(s.max_connections, 5);
        assert_eq!(s.codes, AccountCodes::default());
    }

    #[test]
    fn test_account_override() {
        let s = settings(&[
            ("GRANDLIVRE_ACCOUNT_CASH", "5711"),
            ("GRANDLIVRE_ACCOUNT_COST_OF_GOODS_SOLD", "6031"),
            ("GRANDLIVRE_DATABASE_PATH", "/var/lib/ledger.db"),
        ])
        .unwrap();
        assert_eq!(s.codes.cash, "5711");
        assert_eq!(s.codes.cost_of_goods_sold, "6031");
        assert_eq!(s.codes.bank, "521");
        assert_eq!(s.db_config().database_path, PathBuf::from("/var/lib/ledger.db"));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            settings(&[("GRANDLIVRE_MAX_CONNECTIONS", "many")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            settings(&[("GRANDLIVRE_MAX_CONNECTIONS", "0")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            settings(&[("GRANDLIVRE_ACCOUNT_BANK", "52 1")]),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
