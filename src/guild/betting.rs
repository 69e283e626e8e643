//! Guild-war wagering.
//!
//! Bets are immutable once placed. Resolution only reads them:
//!
//! ```text
//! losing_pool   = Σ stakes on the losing guild
//! winning_total = Σ stakes on the winning guild
//!
//! both > 0:  payout = stake + stake × losing_pool × (1 − c/100) / winning_total
//! otherwise: payout = stake        (push, winners refunded, nothing earned)
//! ```
//!
//! Losing bets are never paid and never marked.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::war::{WarId, WarStatus};
use super::GuildId;
use crate::accounts::UserId;
use crate::clock::local_date;
use crate::engine::SettlementEngine;
use crate::error::{LedgerError, LedgerResult};
use crate::money::{checked_add, checked_mul, commission_factor, to_paise, Money, Percent};

pub type BetId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub user_id: UserId,
    pub war_id: WarId,
    /// Side the user backed
    pub guild_id: GuildId,
    pub amount: Money,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetPayout {
    pub bet_id: BetId,
    pub user_id: UserId,
    pub stake: Money,
    /// Stake plus net winnings
    pub payout: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolSettlement {
    pub winning_total: Money,
    pub losing_pool: Money,
    /// True when winners only got their stake back
    pub push: bool,
    pub payouts: Vec<BetPayout>,
    /// Losing stakes not redistributed: commission plus rounding dust, or
    /// the whole losing pool when nobody backed the winner.
    pub platform_retained: Money,
}

impl PoolSettlement {
    pub fn total_paid(&self) -> Money {
        self.payouts
            .iter()
            .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.payout))
    }
}

/// Compute the payout plan for one war. Pure: reads bets, mutates nothing.
///
/// Fails with `Overflow` only when the pools exceed the decimal range.
pub fn settle_pool<'a, I>(
    bets: I,
    winner: GuildId,
    loser: GuildId,
    commission_percent: Percent,
) -> LedgerResult<PoolSettlement>
where
    I: IntoIterator<Item = &'a Bet>,
{
    let mut winning: Vec<&Bet> = Vec::new();
    let mut winning_total = Decimal::ZERO;
    let mut losing_pool = Decimal::ZERO;
    for bet in bets {
        if bet.guild_id == winner {
            winning.push(bet);
            winning_total = checked_add(winning_total, bet.amount)?;
        } else if bet.guild_id == loser {
            losing_pool = checked_add(losing_pool, bet.amount)?;
        }
    }
    let push = losing_pool <= Decimal::ZERO || winning_total <= Decimal::ZERO;
    let factor = commission_factor(commission_percent);

    let payouts = winning
        .iter()
        .map(|bet| -> LedgerResult<BetPayout> {
            let net = if push {
                Decimal::ZERO
            } else {
                // multiply before dividing so evenly split pools stay exact
                let share = checked_mul(checked_mul(bet.amount, losing_pool)?, factor)?;
                to_paise(share / winning_total)
            };
            Ok(BetPayout {
                bet_id: bet.id,
                user_id: bet.user_id,
                stake: bet.amount,
                payout: checked_add(bet.amount, net)?,
            })
        })
        .collect::<LedgerResult<Vec<BetPayout>>>()?;

    // each net share is at most its slice of the losing pool
    let net_paid: Money = payouts.iter().map(|p| p.payout - p.stake).sum();
    Ok(PoolSettlement {
        winning_total,
        losing_pool,
        push,
        payouts,
        platform_retained: losing_pool - net_paid,
    })
}

/// Sum of a user's stakes placed on local calendar day `day`.
pub fn wagered_on<'a>(bets: impl IntoIterator<Item = &'a Bet>, user_id: UserId, day: NaiveDate) -> Money {
    bets.into_iter()
        .filter(|b| b.user_id == user_id && local_date(b.placed_at) == day)
        .map(|b| b.amount)
        .sum()
}

impl SettlementEngine {
    /// Back one side of a guild war.
    ///
    /// Checks, in order: user and war exist, amount > 0, user not banned,
    /// war still open, guild is one of the two sides, wallet total covers it,
    /// amount within the configured min/max, daily limit, one bet per war.
    pub fn place_bet(&self, user_id: UserId, war_id: WarId, guild_id: GuildId, amount: Money) -> LedgerResult<Bet> {
        let config = self.config();
        let (min_bet, max_bet, default_daily) =
            (config.min_bet_amount, config.max_bet_amount, config.daily_bet_limit);

        let bet = self.transact(|tx| {
            let user = tx.user(user_id)?;
            let war = tx.state.war(war_id)?;
            if amount <= Decimal::ZERO {
                return Err(LedgerError::InvalidAmount(amount));
            }
            user.ensure_not_banned()?;
            if war.status == WarStatus::Completed {
                return Err(LedgerError::AlreadyResolved("This war has already been resolved.".into()));
            }
            if !war.involves(guild_id) {
                return Err(LedgerError::precondition("That guild is not fighting in this war."));
            }

            let available = user.wallet.total();
            if available < amount {
                return Err(LedgerError::InsufficientFunds { available, required: amount });
            }
            if amount < min_bet {
                return Err(LedgerError::LimitExceeded(format!("Minimum bet amount is ₹{min_bet}.")));
            }
            if amount > max_bet {
                return Err(LedgerError::LimitExceeded(format!("Maximum bet amount is ₹{max_bet}.")));
            }

            let daily_limit = user.daily_bet_limit_override.unwrap_or(default_daily);
            let today = local_date(tx.now());
            let wagered = wagered_on(&tx.state.bets, user_id, today);
            if wagered.saturating_add(amount) > daily_limit {
                return Err(LedgerError::LimitExceeded(format!(
                    "Placing this bet would exceed your daily limit of ₹{daily_limit}. \
                     You have ₹{} remaining for today.",
                    (daily_limit - wagered).max(Decimal::ZERO)
                )));
            }

            if tx.state.bets.iter().any(|b| b.user_id == user_id && b.war_id == war_id) {
                return Err(LedgerError::DuplicateAction(
                    "You have already placed a bet on this war.".into(),
                ));
            }

            tx.debit(user_id, amount)?;
            let bet = Bet {
                id: tx.next_id(),
                user_id,
                war_id,
                guild_id,
                amount,
                placed_at: tx.now(),
            };
            tx.state.bets.push(bet.clone());
            Ok(bet)
        })?;

        info!(bet_id = bet.id, user_id, war_id, guild_id, amount = %amount, "🎲 Bet placed");
        Ok(bet)
    }

    pub fn bets_for_war(&self, war_id: WarId) -> Vec<Bet> {
        self.store()
            .read(|s| s.bets.iter().filter(|b| b.war_id == war_id).cloned().collect())
    }

    /// How much more `user_id` may wager today.
    pub fn remaining_daily_limit(&self, user_id: UserId) -> LedgerResult<Money> {
        let today = self.today();
        let default_daily = self.config().daily_bet_limit;
        self.store().read(|s| {
            let user = s.user(user_id)?;
            let limit = user.daily_bet_limit_override.unwrap_or(default_daily);
            Ok((limit - wagered_on(&s.bets, user_id, today)).max(Decimal::ZERO))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bet(id: u64, user_id: u64, guild_id: u64, amount: i64) -> Bet {
        Bet {
            id,
            user_id,
            war_id: 1,
            guild_id,
            amount: Decimal::from(amount),
            placed_at: Utc::now(),
        }
    }

    #[test]
    fn test_proportional_payout_with_commission() {
        // winners 100 + 300 on guild 1, losers 200 on guild 2, 10% commission
        let bets = vec![bet(1, 10, 1, 100), bet(2, 11, 1, 300), bet(3, 12, 2, 200)];
        let s = settle_pool(&bets, 1, 2, Decimal::from(10)).unwrap();

        assert!(!s.push);
        assert_eq!(s.payouts.len(), 2);
        assert_eq!(s.payouts[0].payout, Decimal::from(145));
        assert_eq!(s.payouts[1].payout, Decimal::from(435));
        assert_eq!(s.platform_retained, Decimal::from(20));
        assert_eq!(s.total_paid() + s.platform_retained, Decimal::from(600));
    }

    #[test]
    fn test_push_when_no_opposing_bets() {
        let bets = vec![bet(1, 10, 1, 50), bet(2, 11, 1, 70)];
        let s = settle_pool(&bets, 1, 2, Decimal::from(25)).unwrap();

        assert!(s.push);
        assert_eq!(s.payouts[0].payout, Decimal::from(50));
        assert_eq!(s.payouts[1].payout, Decimal::from(70));
        assert_eq!(s.platform_retained, Decimal::ZERO);
    }

    #[test]
    fn test_nobody_backed_winner() {
        let bets = vec![bet(1, 10, 2, 80)];
        let s = settle_pool(&bets, 1, 2, Decimal::from(10)).unwrap();
        assert!(s.push);
        assert!(s.payouts.is_empty());
        assert_eq!(s.platform_retained, Decimal::from(80));
    }

    #[test]
    fn test_uneven_split_never_overpays() {
        let bets = vec![bet(1, 10, 1, 10), bet(2, 11, 1, 10), bet(3, 12, 1, 10), bet(4, 13, 2, 100)];
        let s = settle_pool(&bets, 1, 2, Decimal::ZERO).unwrap();
        for p in &s.payouts {
            assert_eq!(p.payout, Decimal::new(4333, 2));
        }
        assert!(s.platform_retained >= Decimal::ZERO);
        assert_eq!(s.total_paid() + s.platform_retained, Decimal::from(130));
    }

    #[test]
    fn test_wagered_on_filters_user_and_day() {
        let mut old = bet(9, 10, 1, 500);
        old.placed_at = Utc::now() - chrono::Duration::days(2);
        let bets = vec![bet(1, 10, 1, 100), bet(2, 11, 1, 300), old];
        assert_eq!(wagered_on(&bets, 10, local_date(Utc::now())), Decimal::from(100));
    }
}
