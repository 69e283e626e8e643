//! Result submission, verification and prize payout.
//!
//! Normal mode: players submit a finishing rank; the prize is computed from
//! the pool when an admin verifies it.
//!
//! Kill mode: an admin posts every player's kill count at once; winnings are
//! fixed at posting (`kills × per_kill_reward`) and paid on verification.
//!
//! Clash Squad has no payout rule. Both submission paths refuse it.
//!
//! A result is settled at most once: `Verified` and `Rejected` are terminal.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{TournamentId, TournamentMode, TournamentStatus};
use crate::accounts::UserId;
use crate::audit::AuditAction;
use crate::engine::SettlementEngine;
use crate::error::{Entity, LedgerError, LedgerResult};
use crate::money::{checked_mul, Money};
use crate::verification::Evaluation;
use crate::wallet::BalanceTier;

pub type ResultId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    /// Normal-mode submission awaiting review
    Pending,
    /// Kill-mode result posted by an admin, awaiting review
    PendingVerification,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, VerificationStatus::Verified | VerificationStatus::Rejected)
    }
}

/// Admin decision on a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Verified,
    Rejected,
}

impl From<Verdict> for VerificationStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Verified => VerificationStatus::Verified,
            Verdict::Rejected => VerificationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalResult {
    pub id: ResultId,
    pub tournament_id: TournamentId,
    pub user_id: UserId,
    pub rank: u32,
    pub screenshot_path: Option<String>,
    pub evaluation: Option<Evaluation>,
    pub status: VerificationStatus,
    /// Set when verified
    pub winnings: Option<Money>,
    pub submitted_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillResult {
    pub user_id: UserId,
    pub kills: u32,
    pub winnings: Money,
    pub screenshot_path: Option<String>,
    pub evaluation: Option<Evaluation>,
    /// Kill count exceeded the tournament threshold
    pub flagged: bool,
    pub status: VerificationStatus,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl KillResult {
    pub fn exceeds_threshold(kills: u32, threshold: u32) -> bool {
        threshold > 0 && kills > threshold
    }
}

/// One player's line in a kill-mode result post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KillClaim {
    pub user_id: UserId,
    pub kills: u32,
    #[serde(default)]
    pub screenshot_path: Option<String>,
}

fn clash_squad_unsupported() -> LedgerError {
    LedgerError::precondition("Clash Squad tournaments have no result settlement")
}

fn already_settled(what: &str, status: VerificationStatus) -> LedgerError {
    LedgerError::AlreadyResolved(format!("{what} has already been {status:?}"))
}

impl SettlementEngine {
    // ========================================================================
    // NORMAL MODE
    // ========================================================================

    /// Player submits a finishing rank for review.
    pub fn submit_normal_result(
        &self,
        tournament_id: TournamentId,
        user_id: UserId,
        rank: u32,
        screenshot_path: Option<String>,
    ) -> LedgerResult<NormalResult> {
        let result = self.transact(|tx| {
            let t = tx.state.tournament(tournament_id)?;
            tx.user(user_id)?;
            match t.mode {
                TournamentMode::Normal { .. } => {}
                TournamentMode::Kill { .. } => {
                    return Err(LedgerError::precondition(
                        "Kill tournaments are settled from admin-posted kill counts",
                    ))
                }
                TournamentMode::ClashSquad { .. } => return Err(clash_squad_unsupported()),
            }
            if t.status == TournamentStatus::Upcoming {
                return Err(LedgerError::precondition("Tournament has not started yet"));
            }
            if !t.is_participant(user_id) {
                return Err(LedgerError::precondition("Only participants can submit results"));
            }
            if rank == 0 {
                return Err(LedgerError::precondition("Rank starts at 1"));
            }
            let duplicate = tx.state.results.values().any(|r| {
                r.tournament_id == tournament_id
                    && r.user_id == user_id
                    && r.status != VerificationStatus::Rejected
            });
            if duplicate {
                return Err(LedgerError::DuplicateAction(
                    "You have already submitted a result for this tournament.".into(),
                ));
            }

            let result = NormalResult {
                id: tx.next_id(),
                tournament_id,
                user_id,
                rank,
                screenshot_path,
                evaluation: None,
                status: VerificationStatus::Pending,
                winnings: None,
                submitted_at: tx.now(),
                resolved_at: None,
            };
            tx.state.results.insert(result.id, result.clone());
            Ok(result)
        })?;

        info!(result_id = result.id, tournament_id, user_id, rank, "📸 Normal result submitted");
        Ok(result)
    }

    /// Settle a normal-mode result. Winnings are `pool × rank% / 100` at the
    /// moment of verification and go to `winnable`.
    pub fn verify_normal_result(
        &self,
        admin_id: UserId,
        result_id: ResultId,
        verdict: Verdict,
    ) -> LedgerResult<NormalResult> {
        let settled = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let result = tx
                .state
                .results
                .get(&result_id)
                .cloned()
                .ok_or(LedgerError::NotFound(Entity::Result, result_id))?;
            if result.status.is_terminal() {
                return Err(already_settled("Result", result.status));
            }
            let t = tx.state.tournament(result.tournament_id)?;
            let target = format!(
                "User: {}, Tournament: {}",
                tx.user(result.user_id)?.username,
                t.name
            );

            let winnings = match verdict {
                Verdict::Verified => t.prize_for_rank(result.rank),
                Verdict::Rejected => Decimal::ZERO,
            };
            if winnings > Decimal::ZERO {
                tx.credit(result.user_id, BalanceTier::Winnable, winnings)?;
            }

            let now = tx.now();
            let Some(record) = tx.state.results.get_mut(&result_id) else {
                return Err(LedgerError::NotFound(Entity::Result, result_id));
            };
            record.status = verdict.into();
            record.resolved_at = Some(now);
            if verdict == Verdict::Verified {
                record.winnings = Some(winnings);
            }
            let settled = record.clone();

            let action = match verdict {
                Verdict::Verified => AuditAction::NormalResultApproved,
                Verdict::Rejected => AuditAction::NormalResultRejected,
            };
            tx.audit(&actor, action, target);
            Ok(settled)
        })?;

        info!(
            result_id,
            user_id = settled.user_id,
            status = ?settled.status,
            winnings = %settled.winnings.unwrap_or_default(),
            "✅ Normal result settled"
        );
        Ok(settled)
    }

    // ========================================================================
    // KILL MODE
    // ========================================================================

    /// Post the kill counts for a kill-mode tournament. Marks it `Completed`.
    ///
    /// Posting happens once and needs at least one claim.
    pub fn set_kill_results(
        &self,
        admin_id: UserId,
        tournament_id: TournamentId,
        claims: Vec<KillClaim>,
    ) -> LedgerResult<Vec<KillResult>> {
        let posted = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let t = tx.state.tournament(tournament_id)?;
            let per_kill_reward = match t.mode {
                TournamentMode::Kill { per_kill_reward } => per_kill_reward,
                TournamentMode::Normal { .. } => {
                    return Err(LedgerError::precondition(
                        "Normal tournaments are settled from submitted ranks",
                    ))
                }
                TournamentMode::ClashSquad { .. } => return Err(clash_squad_unsupported()),
            };
            if !t.kill_results.is_empty() {
                return Err(LedgerError::AlreadyResolved(
                    "Kill results were already posted for this tournament".into(),
                ));
            }
            if claims.is_empty() {
                return Err(LedgerError::precondition("No kill results to post"));
            }

            let mut seen = BTreeSet::new();
            for claim in &claims {
                if !t.is_participant(claim.user_id) {
                    return Err(LedgerError::precondition(format!(
                        "User {} did not take part in this tournament",
                        claim.user_id
                    )));
                }
                if !seen.insert(claim.user_id) {
                    return Err(LedgerError::DuplicateAction(format!(
                        "Duplicate kill result for user {}",
                        claim.user_id
                    )));
                }
            }

            let threshold = t.max_kills_threshold;
            let target = t.target();
            let results = claims
                .into_iter()
                .map(|claim| -> LedgerResult<KillResult> {
                    Ok(KillResult {
                        user_id: claim.user_id,
                        kills: claim.kills,
                        winnings: checked_mul(per_kill_reward, Decimal::from(claim.kills))?,
                        screenshot_path: claim.screenshot_path,
                        evaluation: None,
                        flagged: KillResult::exceeds_threshold(claim.kills, threshold),
                        status: VerificationStatus::PendingVerification,
                        resolved_at: None,
                    })
                })
                .collect::<LedgerResult<Vec<KillResult>>>()?;

            let Some(t) = tx.state.tournaments.get_mut(&tournament_id) else {
                return Err(LedgerError::NotFound(Entity::Tournament, tournament_id));
            };
            t.kill_results = results.clone();
            t.status = TournamentStatus::Completed;

            tx.audit(&actor, AuditAction::KillResultsPosted, target);
            Ok(results)
        })?;

        let flagged = posted.iter().filter(|r| r.flagged).count();
        if flagged > 0 {
            warn!(tournament_id, flagged, "⚠️ Kill counts above threshold flagged for review");
        }
        info!(tournament_id, results = posted.len(), "🎯 Kill results posted");
        Ok(posted)
    }

    /// Settle one player's kill result; pays the posted winnings when verified.
    pub fn verify_kill_result(
        &self,
        admin_id: UserId,
        tournament_id: TournamentId,
        user_id: UserId,
        verdict: Verdict,
    ) -> LedgerResult<KillResult> {
        let settled = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let t = tx.state.tournament(tournament_id)?;
            let username = tx.user(user_id)?.username.clone();
            let result = t
                .kill_results
                .iter()
                .find(|r| r.user_id == user_id)
                .cloned()
                .ok_or(LedgerError::NotFound(Entity::Result, user_id))?;
            if result.status.is_terminal() {
                return Err(already_settled("Kill result", result.status));
            }
            let target = format!("User: {username}, Tournament: {}", t.name);

            if verdict == Verdict::Verified && result.winnings > Decimal::ZERO {
                tx.credit(user_id, BalanceTier::Winnable, result.winnings)?;
            }

            let now = tx.now();
            let record = tx
                .state
                .tournaments
                .get_mut(&tournament_id)
                .and_then(|t| t.kill_results.iter_mut().find(|r| r.user_id == user_id));
            let Some(record) = record else {
                return Err(LedgerError::NotFound(Entity::Result, user_id));
            };
            record.status = verdict.into();
            record.resolved_at = Some(now);
            let settled = record.clone();

            let action = match verdict {
                Verdict::Verified => AuditAction::KillResultApproved,
                Verdict::Rejected => AuditAction::KillResultRejected,
            };
            tx.audit(&actor, action, target);
            Ok(settled)
        })?;

        info!(
            tournament_id,
            user_id,
            status = ?settled.status,
            winnings = %settled.winnings,
            "✅ Kill result settled"
        );
        Ok(settled)
    }

    // ========================================================================
    // READS
    // ========================================================================

    pub fn normal_result(&self, result_id: ResultId) -> LedgerResult<NormalResult> {
        self.store().read(|s| {
            s.results
                .get(&result_id)
                .cloned()
                .ok_or(LedgerError::NotFound(Entity::Result, result_id))
        })
    }

    pub fn results_for_tournament(&self, tournament_id: TournamentId) -> Vec<NormalResult> {
        self.store().read(|s| {
            s.results
                .values()
                .filter(|r| r.tournament_id == tournament_id)
                .cloned()
                .collect()
        })
    }

    /// Normal results awaiting an admin verdict, oldest first.
    pub fn pending_results(&self) -> Vec<NormalResult> {
        self.store().read(|s| {
            s.results
                .values()
                .filter(|r| !r.status.is_terminal())
                .cloned()
                .collect()
        })
    }
}
