// ============================================================================
// CONFIGURATION - Betting limits, payment minimums, VIP plans, server settings
// ============================================================================
//
// The engine consumes these values, it does not own them. Everything can be
// overridden from the environment (a `.env` file is honoured via dotenv).
//
//   ARENA_MIN_BET                 minimum stake per bet            (10)
//   ARENA_MAX_BET                 maximum stake per bet            (500)
//   ARENA_DAILY_BET_LIMIT         global daily wager cap           (2000)
//   ARENA_MIN_DEPOSIT             smallest deposit request         (10)
//   ARENA_MIN_WITHDRAWAL          smallest withdrawal request      (30)
//   ARENA_BIND_ADDR               HTTP listen address              (0.0.0.0:8080)
//   ARENA_DATA_DIR                snapshot directory               (./arena_data)
//   ARENA_SNAPSHOT_INTERVAL_SECS  periodic snapshot interval       (30)
//   ARENA_ADMIN_USERNAME          bootstrap admin on an empty ledger (admin)
//   ARENA_ADMIN_EMAIL             bootstrap admin email            (admin@arena.local)
// ============================================================================

use std::net::SocketAddr;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;

pub const DEFAULT_MIN_BET: i64 = 10;
pub const DEFAULT_MAX_BET: i64 = 500;
pub const DEFAULT_DAILY_BET_LIMIT: i64 = 2000;
pub const DEFAULT_MIN_DEPOSIT: i64 = 10;
pub const DEFAULT_MIN_WITHDRAWAL: i64 = 30;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATA_DIR: &str = "./arena_data";
const DEFAULT_SNAPSHOT_INTERVAL_SECS: u64 = 30;
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_EMAIL: &str = "admin@arena.local";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} is not a valid value: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("min bet {min} exceeds max bet {max}")]
    BetRange { min: Money, max: Money },
}

/// A purchasable VIP membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VipPlan {
    pub id: String,
    pub price: Money,
    pub duration_days: i64,
}

/// Limits and price tables consumed by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub min_bet_amount: Money,
    pub max_bet_amount: Money,
    /// Global daily cap, overridable per user
    pub daily_bet_limit: Money,
    pub min_deposit: Money,
    pub min_withdrawal: Money,
    pub vip_plans: Vec<VipPlan>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_bet_amount: Decimal::from(DEFAULT_MIN_BET),
            max_bet_amount: Decimal::from(DEFAULT_MAX_BET),
            daily_bet_limit: Decimal::from(DEFAULT_DAILY_BET_LIMIT),
            min_deposit: Decimal::from(DEFAULT_MIN_DEPOSIT),
            min_withdrawal: Decimal::from(DEFAULT_MIN_WITHDRAWAL),
            vip_plans: vec![
                VipPlan { id: "month".to_string(), price: Decimal::from(200), duration_days: 30 },
                VipPlan { id: "year".to_string(), price: Decimal::from(1000), duration_days: 365 },
            ],
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with any `ARENA_*` environment values.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            min_bet_amount: env_or("ARENA_MIN_BET", defaults.min_bet_amount)?,
            max_bet_amount: env_or("ARENA_MAX_BET", defaults.max_bet_amount)?,
            daily_bet_limit: env_or("ARENA_DAILY_BET_LIMIT", defaults.daily_bet_limit)?,
            min_deposit: env_or("ARENA_MIN_DEPOSIT", defaults.min_deposit)?,
            min_withdrawal: env_or("ARENA_MIN_WITHDRAWAL", defaults.min_withdrawal)?,
            vip_plans: defaults.vip_plans,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_bet_amount > self.max_bet_amount {
            return Err(ConfigError::BetRange {
                min: self.min_bet_amount,
                max: self.max_bet_amount,
            });
        }
        Ok(())
    }

    pub fn vip_plan(&self, plan_id: &str) -> Option<&VipPlan> {
        self.vip_plans.iter().find(|p| p.id == plan_id)
    }
}

/// Settings for the HTTP binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: String,
    pub snapshot_interval_secs: u64,
    pub admin_username: String,
    pub admin_email: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let bind_addr = env_or(
            "ARENA_BIND_ADDR",
            SocketAddr::from_str(DEFAULT_BIND_ADDR).map_err(|_| ConfigError::Invalid {
                key: "ARENA_BIND_ADDR",
                value: DEFAULT_BIND_ADDR.to_string(),
            })?,
        )?;

        Ok(Self {
            bind_addr,
            data_dir: std::env::var("ARENA_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()),
            snapshot_interval_secs: env_or("ARENA_SNAPSHOT_INTERVAL_SECS", DEFAULT_SNAPSHOT_INTERVAL_SECS)?,
            admin_username: std::env::var("ARENA_ADMIN_USERNAME")
                .unwrap_or_else(|_| DEFAULT_ADMIN_USERNAME.to_string()),
            admin_email: std::env::var("ARENA_ADMIN_EMAIL").unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string()),
        })
    }
}

fn env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_platform_settings() {
        let config = EngineConfig::default();
        assert_eq!(config.min_bet_amount, Decimal::from(10));
        assert_eq!(config.max_bet_amount, Decimal::from(500));
        assert_eq!(config.daily_bet_limit, Decimal::from(2000));
        assert_eq!(config.min_deposit, Decimal::from(10));
        assert_eq!(config.min_withdrawal, Decimal::from(30));
        assert_eq!(config.vip_plan("year").map(|p| p.duration_days), Some(365));
        assert!(config.vip_plan("lifetime").is_none());
    }

    #[test]
    fn test_inverted_bet_range_rejected() {
        let config = EngineConfig {
            min_bet_amount: Decimal::from(600),
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::BetRange { .. })));
    }

    #[test]
    fn test_env_or_parses_and_rejects() {
        std::env::set_var("ARENA_TEST_ONLY_LIMIT", "1500");
        let v: Decimal = env_or("ARENA_TEST_ONLY_LIMIT", Decimal::ZERO).unwrap();
        assert_eq!(v, Decimal::from(1500));

        std::env::set_var("ARENA_TEST_ONLY_BAD", "lots");
        let r: Result<Decimal, _> = env_or("ARENA_TEST_ONLY_BAD", Decimal::ZERO);
        assert!(r.is_err());
    }
}
