// ============================================================================
// GUILD WARS - Creation and one-shot resolution
// ============================================================================
//
// `resolve_guild_war` is the only path that pays anything for a war outcome.
// It runs as a single ledger transaction:
//
//   1. validate (war open, winner is one of the two sides)
//   2. plan     (prize split per winning member, pari-mutuel bet payouts)
//   3. credit   (every planned amount to `winnable`)
//   4. record   (war Completed + winner, guild wins/losses, audit entry)
//
// If any credit fails the transaction rolls back and the war stays open, so
// a retry cannot double-pay.
// ============================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::betting::{settle_pool, PoolSettlement};
use super::GuildId;
use crate::accounts::UserId;
use crate::audit::AuditAction;
use crate::engine::SettlementEngine;
use crate::error::{Entity, LedgerError, LedgerResult};
use crate::money::{commission_factor, is_valid_percent, to_paise, Money, Percent};
use crate::wallet::BalanceTier;

pub type WarId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarStatus {
    Upcoming,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildWar {
    pub id: WarId,
    pub guild_a: GuildId,
    pub guild_b: GuildId,
    pub start_time: DateTime<Utc>,
    /// Platform-funded prize split among the winning guild's members
    pub prize_pool: Money,
    pub commission_percent: Percent,
    pub status: WarStatus,
    pub winner_guild_id: Option<GuildId>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl GuildWar {
    pub fn involves(&self, guild_id: GuildId) -> bool {
        self.guild_a == guild_id || self.guild_b == guild_id
    }

    /// The other side, if `guild_id` is fighting in this war.
    pub fn opponent_of(&self, guild_id: GuildId) -> Option<GuildId> {
        if guild_id == self.guild_a {
            Some(self.guild_b)
        } else if guild_id == self.guild_b {
            Some(self.guild_a)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGuildWar {
    pub guild_a: GuildId,
    pub guild_b: GuildId,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub prize_pool: Money,
    #[serde(default)]
    pub commission_percent: Percent,
}

/// Everything a resolution paid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarSettlement {
    pub war_id: WarId,
    pub winner_guild_id: GuildId,
    pub loser_guild_id: GuildId,
    pub prize_per_member: Money,
    pub prize_recipients: Vec<UserId>,
    pub bets: PoolSettlement,
}

impl WarSettlement {
    pub fn total_credited(&self) -> Money {
        self.prize_per_member
            .saturating_mul(Decimal::from(self.prize_recipients.len()))
            .saturating_add(self.bets.total_paid())
    }
}

impl SettlementEngine {
    pub fn create_guild_war(&self, admin_id: UserId, new: NewGuildWar) -> LedgerResult<GuildWar> {
        if new.guild_a == new.guild_b {
            return Err(LedgerError::precondition("A guild cannot fight itself"));
        }
        if new.prize_pool < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(new.prize_pool));
        }
        if !is_valid_percent(new.commission_percent) {
            return Err(LedgerError::precondition(format!(
                "Commission {}% is outside 0-100",
                new.commission_percent
            )));
        }

        let war = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let target = format!(
                "{} vs {}",
                tx.state.guild(new.guild_a)?.name,
                tx.state.guild(new.guild_b)?.name
            );

            let war = GuildWar {
                id: tx.next_id(),
                guild_a: new.guild_a,
                guild_b: new.guild_b,
                start_time: new.start_time,
                prize_pool: new.prize_pool,
                commission_percent: new.commission_percent,
                status: WarStatus::Upcoming,
                winner_guild_id: None,
                created_at: tx.now(),
                resolved_at: None,
            };
            tx.state.wars.insert(war.id, war.clone());
            tx.audit(&actor, AuditAction::GuildWarCreated, target);
            Ok(war)
        })?;

        info!(war_id = war.id, guild_a = war.guild_a, guild_b = war.guild_b, prize_pool = %war.prize_pool, "⚔️ Guild war created");
        Ok(war)
    }

    /// Declare the winner, split the prize pool and settle every bet. Runs
    /// at most once per war.
    pub fn resolve_guild_war(&self, admin_id: UserId, war_id: WarId, winner_guild_id: GuildId) -> LedgerResult<WarSettlement> {
        let settlement = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let war = tx.state.war(war_id)?;
            if war.status == WarStatus::Completed {
                return Err(LedgerError::AlreadyResolved("War has already been resolved.".into()));
            }
            let Some(loser_guild_id) = war.opponent_of(winner_guild_id) else {
                return Err(LedgerError::precondition("Winner must be one of the competing guilds."));
            };

            // A disbanded guild has no members to pay and no record to update.
            let winner = tx.state.guilds.get(&winner_guild_id);
            let loser = tx.state.guilds.get(&loser_guild_id);
            let members: Vec<UserId> = winner.map(|g| g.member_ids.clone()).unwrap_or_default();
            let target = format!(
                "{} declared winner over {}",
                winner.map_or_else(|| format!("Guild #{winner_guild_id}"), |g| g.name.clone()),
                loser.map_or_else(|| format!("Guild #{loser_guild_id}"), |g| g.name.clone()),
            );

            let factor = commission_factor(war.commission_percent);
            let prize_per_member = if war.prize_pool > Decimal::ZERO && !members.is_empty() {
                to_paise(war.prize_pool / Decimal::from(members.len()) * factor)
            } else {
                Decimal::ZERO
            };
            let pool = settle_pool(
                tx.state.bets.iter().filter(|b| b.war_id == war_id),
                winner_guild_id,
                loser_guild_id,
                war.commission_percent,
            )?;

            if prize_per_member > Decimal::ZERO {
                for member in &members {
                    tx.credit(*member, BalanceTier::Winnable, prize_per_member)?;
                }
            }
            for payout in &pool.payouts {
                tx.credit(payout.user_id, BalanceTier::Winnable, payout.payout)?;
            }

            let now = tx.now();
            let Some(war) = tx.state.wars.get_mut(&war_id) else {
                return Err(LedgerError::NotFound(Entity::GuildWar, war_id));
            };
            war.status = WarStatus::Completed;
            war.winner_guild_id = Some(winner_guild_id);
            war.resolved_at = Some(now);
            if let Some(g) = tx.state.guilds.get_mut(&winner_guild_id) {
                g.wins += 1;
            }
            if let Some(g) = tx.state.guilds.get_mut(&loser_guild_id) {
                g.losses += 1;
            }

            tx.audit(&actor, AuditAction::GuildWarResolved, target);
            Ok(WarSettlement {
                war_id,
                winner_guild_id,
                loser_guild_id,
                prize_per_member,
                prize_recipients: if prize_per_member > Decimal::ZERO { members } else { Vec::new() },
                bets: pool,
            })
        })?;

        if settlement.bets.push && !settlement.bets.payouts.is_empty() {
            warn!(war_id, refunded = settlement.bets.payouts.len(), "No opposing pool; winning bets refunded");
        }
        info!(
            war_id,
            winner = winner_guild_id,
            prize_per_member = %settlement.prize_per_member,
            winning_bets = settlement.bets.payouts.len(),
            credited = %settlement.total_credited(),
            retained = %settlement.bets.platform_retained,
            "🏁 Guild war resolved"
        );
        Ok(settlement)
    }

    pub fn war(&self, war_id: WarId) -> LedgerResult<GuildWar> {
        self.store().read(|s| s.war(war_id).cloned())
    }

    pub fn wars(&self) -> Vec<GuildWar> {
        self.store().read(|s| s.wars.values().cloned().collect())
    }
}
