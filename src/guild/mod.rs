// ============================================================================
// GUILDS - Membership, leadership, war record
// ============================================================================
//
// A guild always has at least one member. When the last member leaves the
// guild is deleted; when the leader leaves, the earliest remaining member
// takes over. Wins and losses only change through war resolution.
//
// Submodules:
//   war     - guild-war creation and resolution (prize split + bet payout)
//   betting - bet placement, daily limit, pari-mutuel pool settlement
// ============================================================================

pub mod betting;
pub mod war;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::accounts::UserId;
use crate::engine::SettlementEngine;
use crate::error::{Entity, LedgerError, LedgerResult};

pub type GuildId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guild {
    pub id: GuildId,
    pub name: String,
    pub leader_id: UserId,
    /// Join order; never empty while the guild exists
    pub member_ids: Vec<UserId>,
    pub wins: u32,
    pub losses: u32,
    pub created_at: DateTime<Utc>,
}

impl Guild {
    pub fn is_member(&self, user_id: UserId) -> bool {
        self.member_ids.contains(&user_id)
    }

    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }
}

/// What happened to the guild when a member left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LeaveOutcome {
    Left { guild_id: GuildId },
    LeadershipPassed { guild_id: GuildId, new_leader_id: UserId },
    Disbanded { guild_id: GuildId },
}

impl SettlementEngine {
    /// Found a guild. Requires an active VIP membership and no current guild.
    pub fn create_guild(&self, user_id: UserId, name: &str) -> LedgerResult<Guild> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::precondition("Guild name is required"));
        }

        let guild = self.transact(|tx| {
            let user = tx.user(user_id)?;
            if !user.is_vip_active(tx.now()) {
                return Err(LedgerError::precondition("Only VIP members can create guilds."));
            }
            if user.guild_id.is_some() {
                return Err(LedgerError::precondition("You are already in a guild."));
            }
            if tx.state.guilds.values().any(|g| g.name.eq_ignore_ascii_case(name)) {
                return Err(LedgerError::DuplicateAction(
                    "A guild with this name already exists.".into(),
                ));
            }

            let guild = Guild {
                id: tx.next_id(),
                name: name.to_string(),
                leader_id: user_id,
                member_ids: vec![user_id],
                wins: 0,
                losses: 0,
                created_at: tx.now(),
            };
            tx.user_mut(user_id)?.guild_id = Some(guild.id);
            tx.state.guilds.insert(guild.id, guild.clone());
            Ok(guild)
        })?;

        info!(guild_id = guild.id, leader = user_id, name = %guild.name, "🛡️ Guild created");
        Ok(guild)
    }

    pub fn join_guild(&self, user_id: UserId, guild_id: GuildId) -> LedgerResult<Guild> {
        let guild = self.transact(|tx| {
            tx.state.guild(guild_id)?;
            if tx.user(user_id)?.guild_id.is_some() {
                return Err(LedgerError::precondition("You must leave your current guild first."));
            }

            tx.user_mut(user_id)?.guild_id = Some(guild_id);
            let Some(guild) = tx.state.guilds.get_mut(&guild_id) else {
                return Err(LedgerError::NotFound(Entity::Guild, guild_id));
            };
            guild.member_ids.push(user_id);
            Ok(guild.clone())
        })?;

        info!(guild_id, user_id, members = guild.member_count(), "Joined guild");
        Ok(guild)
    }

    pub fn leave_guild(&self, user_id: UserId) -> LedgerResult<LeaveOutcome> {
        let outcome = self.transact(|tx| {
            let Some(guild_id) = tx.user(user_id)?.guild_id else {
                return Err(LedgerError::precondition("You are not in a guild."));
            };

            tx.user_mut(user_id)?.guild_id = None;
            let Some(guild) = tx.state.guilds.get_mut(&guild_id) else {
                // Dangling membership: clearing it is all there is to do.
                return Ok(LeaveOutcome::Left { guild_id });
            };
            guild.member_ids.retain(|id| *id != user_id);

            let outcome = match guild.member_ids.first().copied() {
                None => {
                    tx.state.guilds.remove(&guild_id);
                    LeaveOutcome::Disbanded { guild_id }
                }
                Some(next) if guild.leader_id == user_id => {
                    guild.leader_id = next;
                    LeaveOutcome::LeadershipPassed { guild_id, new_leader_id: next }
                }
                Some(_) => LeaveOutcome::Left { guild_id },
            };
            Ok(outcome)
        })?;

        info!(user_id, ?outcome, "Left guild");
        Ok(outcome)
    }

    pub fn guild(&self, guild_id: GuildId) -> LedgerResult<Guild> {
        self.store().read(|s| s.guild(guild_id).cloned())
    }

    pub fn guilds(&self) -> Vec<Guild> {
        self.store().read(|s| s.guilds.values().cloned().collect())
    }
}
