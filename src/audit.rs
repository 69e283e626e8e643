//! Append-only audit log of administrative actions.
//!
//! Entries are only ever pushed. There is no update or delete path, and an
//! entry is recorded only after the mutation it describes has succeeded.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of administrative action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    DepositApproved,
    DepositRejected,
    WithdrawalApproved,
    WithdrawalRejected,
    WithdrawalAutoRejected,
    UserBanned,
    UserUnbanned,
    UserEdited,
    BonusGranted,
    TournamentCreated,
    TournamentUpdated,
    TournamentStatusChanged,
    TournamentDeleted,
    NormalResultApproved,
    NormalResultRejected,
    KillResultsPosted,
    KillResultApproved,
    KillResultRejected,
    GuildWarCreated,
    GuildWarResolved,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AuditAction::DepositApproved => "Approved Deposit",
            AuditAction::DepositRejected => "Rejected Deposit",
            AuditAction::WithdrawalApproved => "Approved Withdrawal",
            AuditAction::WithdrawalRejected => "Rejected Withdrawal",
            AuditAction::WithdrawalAutoRejected => "Auto-Rejected Withdrawal",
            AuditAction::UserBanned => "Banned User",
            AuditAction::UserUnbanned => "Unbanned User",
            AuditAction::UserEdited => "Edited User",
            AuditAction::BonusGranted => "Granted Bonus",
            AuditAction::TournamentCreated => "Created Tournament",
            AuditAction::TournamentUpdated => "Updated Tournament",
            AuditAction::TournamentStatusChanged => "Changed Tournament Status",
            AuditAction::TournamentDeleted => "Deleted Tournament",
            AuditAction::NormalResultApproved => "Approved Normal Result",
            AuditAction::NormalResultRejected => "Rejected Normal Result",
            AuditAction::KillResultsPosted => "Posted Kill Results",
            AuditAction::KillResultApproved => "Approved Kill Result",
            AuditAction::KillResultRejected => "Rejected Kill Result",
            AuditAction::GuildWarCreated => "Created Guild War",
            AuditAction::GuildWarResolved => "Resolved Guild War",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub actor: String,
    pub action: AuditAction,
    /// Free text, e.g. "User: player1" or "Tournament: Weekly Showdown"
    pub target: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn record(&mut self, actor: &str, action: AuditAction, target: String, now: DateTime<Utc>) {
        self.entries.push(AuditEntry {
            id: Uuid::new_v4(),
            actor: actor.to_string(),
            action,
            target,
            timestamp: now,
        });
    }

    /// Oldest first.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_actor<'a>(&'a self, actor: &'a str) -> impl Iterator<Item = &'a AuditEntry> + 'a {
        self.entries.iter().filter(move |e| e.actor == actor)
    }

    pub fn count_of(&self, action: AuditAction) -> usize {
        self.entries.iter().filter(|e| e.action == action).count()
    }
}
