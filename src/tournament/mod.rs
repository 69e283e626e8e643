// ============================================================================
// TOURNAMENTS - Entry fees, rosters and prize pools
// ============================================================================
//
// Lifecycle (monotonic, Completed is terminal):
//
//   Upcoming ──join()──► Upcoming ──admin──► Live ──admin / results──► Completed
//
// Prize pool for Normal and Kill modes is taken from the gross entry fees:
//
//   pool = entry_fee × participants × (1 − commission / 100)
//
// Result submission, verification and payout live in `results`.
// ============================================================================

pub mod results;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::accounts::UserId;
use crate::audit::AuditAction;
use crate::engine::SettlementEngine;
use crate::error::{Entity, LedgerError, LedgerResult};
use crate::money::{checked_mul, commission_factor, is_valid_percent, percent_of, to_paise, Money, Percent};

use results::KillResult;

pub type TournamentId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TournamentStatus {
    Upcoming,
    Live,
    Completed,
}

/// Share of the prize pool paid to one finishing rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeTier {
    pub rank: u32,
    pub percentage: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TournamentMode {
    /// Ranked placement; the prize table must total 100%.
    Normal { prize_table: Vec<PrizeTier> },
    /// Fixed reward per kill.
    Kill { per_kill_reward: Money },
    /// Round-based team mode. No payout rule is defined for it.
    ClashSquad { rounds_to_win: u32 },
}

impl TournamentMode {
    pub fn label(&self) -> &'static str {
        match self {
            TournamentMode::Normal { .. } => "Normal",
            TournamentMode::Kill { .. } => "Kill",
            TournamentMode::ClashSquad { .. } => "Clash Squad",
        }
    }
}

/// Roster entry, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    pub device_info: String,
    pub emulator_declaration: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub game: String,
    pub entry_fee: Money,
    pub capacity: u32,
    pub commission_percent: Percent,
    pub mode: TournamentMode,
    pub status: TournamentStatus,
    pub start_time: DateTime<Utc>,
    pub allow_emulators: bool,
    /// Kill counts above this are flagged for review (0 disables)
    pub max_kills_threshold: u32,
    pub participants: Vec<Participant>,
    pub kill_results: Vec<KillResult>,
    pub room_id: Option<String>,
    pub room_password: Option<String>,
    pub stream_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Gross entry fees less commission.
    pub fn prize_pool(&self) -> Money {
        self.entry_fee * Decimal::from(self.participants.len()) * commission_factor(self.commission_percent)
    }

    /// Share of the current pool for a finishing rank; 0 when the rank is
    /// not in the prize table or the mode is not ranked.
    pub fn prize_for_rank(&self, rank: u32) -> Money {
        match &self.mode {
            TournamentMode::Normal { prize_table } => prize_table
                .iter()
                .find(|tier| tier.rank == rank)
                .map(|tier| to_paise(percent_of(self.prize_pool(), tier.percentage)))
                .unwrap_or(Decimal::ZERO),
            _ => Decimal::ZERO,
        }
    }

    pub fn is_participant(&self, user_id: UserId) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() >= self.capacity as usize
    }

    pub(crate) fn target(&self) -> String {
        format!("Tournament: {} (ID: {})", self.name, self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTournament {
    pub name: String,
    pub game: String,
    pub entry_fee: Money,
    pub capacity: u32,
    pub commission_percent: Percent,
    pub mode: TournamentMode,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub allow_emulators: bool,
    #[serde(default)]
    pub max_kills_threshold: u32,
}

impl NewTournament {
    fn validate(&self) -> LedgerResult<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::precondition("Tournament name is required"));
        }
        if self.entry_fee < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(self.entry_fee));
        }
        if self.capacity == 0 {
            return Err(LedgerError::precondition("Capacity must be at least 1"));
        }
        // a full lobby's pool must stay representable
        checked_mul(self.entry_fee, Decimal::from(self.capacity))?;
        if !is_valid_percent(self.commission_percent) {
            return Err(LedgerError::precondition(format!(
                "Commission {}% is outside 0-100",
                self.commission_percent
            )));
        }

        match &self.mode {
            TournamentMode::Normal { prize_table } => {
                let mut ranks: Vec<u32> = prize_table.iter().map(|t| t.rank).collect();
                ranks.sort_unstable();
                ranks.dedup();
                if ranks.len() != prize_table.len() || ranks.first() == Some(&0) {
                    return Err(LedgerError::precondition("Prize table ranks must be unique and start at 1"));
                }
                if prize_table.iter().any(|t| !is_valid_percent(t.percentage)) {
                    return Err(LedgerError::precondition("Prize percentages must be within 0-100"));
                }
                let total: Percent = prize_table.iter().map(|t| t.percentage).sum();
                if total != Decimal::ONE_HUNDRED {
                    return Err(LedgerError::precondition(format!(
                        "Prize table totals {total}%, expected 100%"
                    )));
                }
            }
            TournamentMode::Kill { per_kill_reward } => {
                if *per_kill_reward < Decimal::ZERO {
                    return Err(LedgerError::InvalidAmount(*per_kill_reward));
                }
                checked_mul(*per_kill_reward, Decimal::from(u32::MAX))?;
            }
            TournamentMode::ClashSquad { rounds_to_win } => {
                if *rounds_to_win == 0 {
                    return Err(LedgerError::precondition("Rounds to win must be at least 1"));
                }
            }
        }
        Ok(())
    }
}

/// Metadata an admin may change at any status. Fees, capacity, mode and the
/// roster are fixed at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentPatch {
    pub name: Option<String>,
    pub game: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub allow_emulators: Option<bool>,
    pub max_kills_threshold: Option<u32>,
    pub room_id: Option<String>,
    pub room_password: Option<String>,
    pub stream_url: Option<String>,
}

// ============================================================================
// OPERATIONS
// ============================================================================

impl SettlementEngine {
    pub fn create_tournament(&self, admin_id: UserId, new: NewTournament) -> LedgerResult<Tournament> {
        new.validate()?;

        let tournament = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let tournament = Tournament {
                id: tx.next_id(),
                name: new.name.trim().to_string(),
                game: new.game,
                entry_fee: new.entry_fee,
                capacity: new.capacity,
                commission_percent: new.commission_percent,
                mode: new.mode,
                status: TournamentStatus::Upcoming,
                start_time: new.start_time,
                allow_emulators: new.allow_emulators,
                max_kills_threshold: new.max_kills_threshold,
                participants: Vec::new(),
                kill_results: Vec::new(),
                room_id: None,
                room_password: None,
                stream_url: None,
                created_at: tx.now(),
            };
            tx.state.tournaments.insert(tournament.id, tournament.clone());
            tx.audit(&actor, AuditAction::TournamentCreated, tournament.target());
            Ok(tournament)
        })?;

        info!(
            tournament_id = tournament.id,
            mode = tournament.mode.label(),
            entry_fee = %tournament.entry_fee,
            capacity = tournament.capacity,
            "🏆 Tournament created"
        );
        Ok(tournament)
    }

    /// Metadata edit, allowed in every status.
    pub fn update_tournament(
        &self,
        admin_id: UserId,
        tournament_id: TournamentId,
        patch: TournamentPatch,
    ) -> LedgerResult<Tournament> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(LedgerError::precondition("Tournament name is required"));
        }

        self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let Some(t) = tx.state.tournaments.get_mut(&tournament_id) else {
                return Err(LedgerError::NotFound(Entity::Tournament, tournament_id));
            };

            if let Some(name) = patch.name {
                t.name = name.trim().to_string();
            }
            if let Some(game) = patch.game {
                t.game = game;
            }
            if let Some(start) = patch.start_time {
                t.start_time = start;
            }
            if let Some(allow) = patch.allow_emulators {
                t.allow_emulators = allow;
            }
            if let Some(threshold) = patch.max_kills_threshold {
                t.max_kills_threshold = threshold;
            }
            if patch.room_id.is_some() {
                t.room_id = patch.room_id;
            }
            if patch.room_password.is_some() {
                t.room_password = patch.room_password;
            }
            if patch.stream_url.is_some() {
                t.stream_url = patch.stream_url;
            }
            let updated = t.clone();

            tx.audit(&actor, AuditAction::TournamentUpdated, updated.target());
            Ok(updated)
        })
    }

    /// Forward-only status change.
    pub fn set_tournament_status(
        &self,
        admin_id: UserId,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> LedgerResult<Tournament> {
        let tournament = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let current = tx.state.tournament(tournament_id)?.status;
            if current == TournamentStatus::Completed {
                return Err(LedgerError::AlreadyResolved("Tournament is already completed".into()));
            }
            if status <= current {
                return Err(LedgerError::precondition(format!(
                    "Cannot move tournament from {current:?} to {status:?}"
                )));
            }

            let Some(t) = tx.state.tournaments.get_mut(&tournament_id) else {
                return Err(LedgerError::NotFound(Entity::Tournament, tournament_id));
            };
            t.status = status;
            let updated = t.clone();

            tx.audit(
                &actor,
                AuditAction::TournamentStatusChanged,
                format!("{} → {status:?}", updated.target()),
            );
            Ok(updated)
        })?;

        info!(tournament_id, status = ?tournament.status, "Tournament status changed");
        Ok(tournament)
    }

    /// Remove a tournament at any status. Entry fees already collected are
    /// not refunded.
    pub fn delete_tournament(&self, admin_id: UserId, tournament_id: TournamentId) -> LedgerResult<Tournament> {
        let removed = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let Some(removed) = tx.state.tournaments.remove(&tournament_id) else {
                return Err(LedgerError::NotFound(Entity::Tournament, tournament_id));
            };
            tx.state.results.retain(|_, r| r.tournament_id != tournament_id);

            tx.audit(
                &actor,
                AuditAction::TournamentDeleted,
                format!(
                    "{}, entry fees retained from {} participants",
                    removed.target(),
                    removed.participants.len()
                ),
            );
            Ok(removed)
        })?;

        if !removed.participants.is_empty() {
            warn!(
                tournament_id,
                participants = removed.participants.len(),
                retained = %(removed.entry_fee * Decimal::from(removed.participants.len())),
                "Tournament deleted without refunding entry fees"
            );
        } else {
            info!(tournament_id, "Tournament deleted");
        }
        Ok(removed)
    }

    /// Pay the entry fee and take a roster slot.
    ///
    /// Checks, in order: tournament and user exist, user not banned,
    /// tournament still `Upcoming`, not already joined, capacity, balance.
    pub fn join_tournament(
        &self,
        tournament_id: TournamentId,
        user_id: UserId,
        emulator_declaration: bool,
    ) -> LedgerResult<Participant> {
        let participant = self.transact(|tx| {
            let t = tx.state.tournament(tournament_id)?;
            let user = tx.user(user_id)?;
            user.ensure_not_banned()?;

            if t.status != TournamentStatus::Upcoming {
                return Err(LedgerError::precondition("Tournament is no longer open for joining"));
            }
            if t.is_participant(user_id) {
                return Err(LedgerError::DuplicateAction(
                    "You have already joined this tournament.".into(),
                ));
            }
            if t.is_full() {
                return Err(LedgerError::Capacity { capacity: t.capacity });
            }

            let entry_fee = t.entry_fee;
            let device_info = user.last_device_info.clone().unwrap_or_else(|| "N/A".to_string());

            // Free tournaments skip the wallet entirely.
            if entry_fee > Decimal::ZERO {
                tx.debit(user_id, entry_fee)?;
            }

            let participant = Participant {
                user_id,
                device_info,
                emulator_declaration,
                joined_at: tx.now(),
            };
            let Some(t) = tx.state.tournaments.get_mut(&tournament_id) else {
                return Err(LedgerError::NotFound(Entity::Tournament, tournament_id));
            };
            t.participants.push(participant.clone());
            Ok(participant)
        })?;

        info!(tournament_id, user_id, emulator = emulator_declaration, "🎮 Joined tournament");
        Ok(participant)
    }

    pub fn tournament(&self, tournament_id: TournamentId) -> LedgerResult<Tournament> {
        self.store().read(|s| s.tournament(tournament_id).cloned())
    }

    pub fn tournaments(&self) -> Vec<Tournament> {
        self.store().read(|s| s.tournaments.values().cloned().collect())
    }

    pub fn prize_pool(&self, tournament_id: TournamentId) -> LedgerResult<Money> {
        self.store().read(|s| s.tournament(tournament_id).map(Tournament::prize_pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn normal(entry_fee: i64, participants: usize, commission: i64) -> Tournament {
        Tournament {
            id: 1,
            name: "Weekly Showdown".into(),
            game: "Free Fire".into(),
            entry_fee: Decimal::from(entry_fee),
            capacity: 50,
            commission_percent: Decimal::from(commission),
            mode: TournamentMode::Normal {
                prize_table: vec![
                    PrizeTier { rank: 1, percentage: Decimal::from(50) },
                    PrizeTier { rank: 2, percentage: Decimal::from(30) },
                    PrizeTier { rank: 3, percentage: Decimal::from(20) },
                ],
            },
            status: TournamentStatus::Upcoming,
            start_time: Utc::now(),
            allow_emulators: false,
            max_kills_threshold: 0,
            participants: (0..participants)
                .map(|i| Participant {
                    user_id: i as u64 + 100,
                    device_info: "N/A".into(),
                    emulator_declaration: false,
                    joined_at: Utc::now(),
                })
                .collect(),
            kill_results: Vec::new(),
            room_id: None,
            room_password: None,
            stream_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_prize_pool_takes_commission_from_gross() {
        let t = normal(50, 10, 10);
        assert_eq!(t.prize_pool(), Decimal::from(450));
        assert_eq!(t.prize_for_rank(1), Decimal::from(225));
        assert_eq!(t.prize_for_rank(2), Decimal::from(135));
        assert_eq!(t.prize_for_rank(9), Decimal::ZERO);
    }

    #[test]
    fn test_status_ordering_is_lifecycle() {
        assert!(TournamentStatus::Upcoming < TournamentStatus::Live);
        assert!(TournamentStatus::Live < TournamentStatus::Completed);
    }

    #[test]
    fn test_prize_table_must_total_100() {
        let mut new = NewTournament {
            name: "Cup".into(),
            game: "Free Fire".into(),
            entry_fee: Decimal::from(20),
            capacity: 10,
            commission_percent: Decimal::from(10),
            mode: TournamentMode::Normal {
                prize_table: vec![PrizeTier { rank: 1, percentage: Decimal::from(90) }],
            },
            start_time: Utc::now(),
            allow_emulators: false,
            max_kills_threshold: 0,
        };
        assert!(new.validate().is_err());

        new.mode = TournamentMode::Normal {
            prize_table: vec![
                PrizeTier { rank: 1, percentage: Decimal::from(70) },
                PrizeTier { rank: 2, percentage: Decimal::from(30) },
            ],
        };
        assert!(new.validate().is_ok());

        new.commission_percent = Decimal::from(120);
        assert!(new.validate().is_err());
    }
}
