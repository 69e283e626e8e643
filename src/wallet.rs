//! Three-tier wallet
//!
//! Every user holds three independent non-negative balances:
//!
//! - `deposited`: credited by approved deposits
//! - `winnable`:  credited by prizes and bet payouts, the only withdrawable tier
//! - `bonus`:     promotional credit granted by admins
//!
//! Spending (entry fees, bets, VIP) draws on the total and always consumes
//! bonus first, then deposited, then winnable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::money::{checked_add, Money};

/// One of the three balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceTier {
    Deposited,
    Winnable,
    Bonus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub deposited: Money,
    pub winnable: Money,
    pub bonus: Money,
}

/// How much each tier contributed to a debit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DebitBreakdown {
    pub from_bonus: Money,
    pub from_deposited: Money,
    pub from_winnable: Money,
}

impl DebitBreakdown {
    pub fn total(&self) -> Money {
        self.from_bonus + self.from_deposited + self.from_winnable
    }
}

impl Wallet {
    pub fn new(deposited: Money, winnable: Money, bonus: Money) -> Self {
        Self { deposited, winnable, bonus }
    }

    /// Spendable amount for entry fees, bets and VIP purchases. Saturates
    /// at `Decimal::MAX`.
    pub fn total(&self) -> Money {
        self.deposited.saturating_add(self.winnable).saturating_add(self.bonus)
    }

    pub fn tier(&self, tier: BalanceTier) -> Money {
        match tier {
            BalanceTier::Deposited => self.deposited,
            BalanceTier::Winnable => self.winnable,
            BalanceTier::Bonus => self.bonus,
        }
    }

    fn tier_mut(&mut self, tier: BalanceTier) -> &mut Money {
        match tier {
            BalanceTier::Deposited => &mut self.deposited,
            BalanceTier::Winnable => &mut self.winnable,
            BalanceTier::Bonus => &mut self.bonus,
        }
    }

    /// Add `amount` to one tier. A credit that would overflow the tier
    /// fails with `Overflow` and leaves the wallet untouched.
    pub fn credit(&mut self, tier: BalanceTier, amount: Money) -> LedgerResult<()> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let slot = self.tier_mut(tier);
        *slot = checked_add(*slot, amount)?;
        Ok(())
    }

    /// Fixed-priority deduction: bonus, then deposited, then winnable.
    ///
    /// All-or-nothing: when the total is short nothing is touched.
    pub fn debit(&mut self, amount: Money) -> LedgerResult<DebitBreakdown> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let available = self.total();
        if available < amount {
            return Err(LedgerError::InsufficientFunds { available, required: amount });
        }

        let mut remaining = amount;

        let from_bonus = self.bonus.min(remaining);
        self.bonus -= from_bonus;
        remaining -= from_bonus;

        let from_deposited = self.deposited.min(remaining);
        self.deposited -= from_deposited;
        remaining -= from_deposited;

        // total >= amount, so winnable covers the rest
        self.winnable -= remaining;

        Ok(DebitBreakdown {
            from_bonus,
            from_deposited,
            from_winnable: remaining,
        })
    }

    /// Remove `amount` from the winnable tier only (withdrawal payout).
    pub fn debit_winnable(&mut self, amount: Money) -> LedgerResult<()> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if self.winnable < amount {
            return Err(LedgerError::InsufficientFunds {
                available: self.winnable,
                required: amount,
            });
        }
        self.winnable -= amount;
        Ok(())
    }
}
