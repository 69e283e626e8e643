// ============================================================================
// ARENA LEDGER - STORAGE LAYER
// ============================================================================
//
// One source of truth for every user, tournament, guild, war and bet:
//
// ┌──────────────────────────────────────────────────────────────┐
// │                        LedgerStore                            │
// │                             │                                 │
// │              ┌──────────────┴──────────────┐                  │
// │              ▼                             ▼                  │
// │   RwLock<LedgerState>               DashMap<UserId, UserView> │
// │   (serializable writes)             (session projection)      │
// └──────────────────────────────────────────────────────────────┘
//
// CONCURRENCY MODEL:
// - Writes: one write transaction at a time over the whole state. An
//   operation validates everything first, then applies its mutations, so
//   cross-aggregate work (join, bet, war resolution) commits as a unit.
// - User records touched by a failed transaction are restored from the
//   undo log before the lock is released.
// - Session reads: lock-free via DashMap, refreshed after every commit for
//   each touched user. The projection is never written to directly.
//
// ============================================================================

pub mod snapshot;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::accounts::{User, UserId, UserView};
use crate::audit::{AuditAction, AuditLog};
use crate::error::{Entity, LedgerError, LedgerResult};
use crate::guild::betting::Bet;
use crate::guild::war::{GuildWar, WarId};
use crate::guild::{Guild, GuildId};
use crate::money::Money;
use crate::payments::{Deposit, Withdrawal};
use crate::tournament::results::{NormalResult, ResultId};
use crate::tournament::{Tournament, TournamentId};
use crate::wallet::{BalanceTier, DebitBreakdown, Wallet};

pub use snapshot::{SnapshotError, SnapshotStore};

// ============================================================================
// LEDGER STATE
// ============================================================================

/// Every record the engine owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerState {
    next_id: u64,
    pub users: BTreeMap<UserId, User>,
    pub tournaments: BTreeMap<TournamentId, Tournament>,
    pub results: BTreeMap<ResultId, NormalResult>,
    pub guilds: BTreeMap<GuildId, Guild>,
    pub wars: BTreeMap<WarId, GuildWar>,
    pub bets: Vec<Bet>,
    pub deposits: BTreeMap<u64, Deposit>,
    pub withdrawals: BTreeMap<u64, Withdrawal>,
    pub audit: AuditLog,
}

impl LedgerState {
    pub fn user(&self, id: UserId) -> LedgerResult<&User> {
        self.users.get(&id).ok_or(LedgerError::NotFound(Entity::User, id))
    }

    pub fn tournament(&self, id: TournamentId) -> LedgerResult<&Tournament> {
        self.tournaments
            .get(&id)
            .ok_or(LedgerError::NotFound(Entity::Tournament, id))
    }

    pub fn guild(&self, id: GuildId) -> LedgerResult<&Guild> {
        self.guilds.get(&id).ok_or(LedgerError::NotFound(Entity::Guild, id))
    }

    pub fn war(&self, id: WarId) -> LedgerResult<&GuildWar> {
        self.wars.get(&id).ok_or(LedgerError::NotFound(Entity::GuildWar, id))
    }

    /// Sum of all three tiers over every user.
    pub fn total_user_funds(&self) -> Money {
        self.users
            .values()
            .fold(Money::ZERO, |acc, u| acc.saturating_add(u.wallet.total()))
    }
}

// ============================================================================
// WRITE TRANSACTION
// ============================================================================

/// Mutable view over the state for the duration of one operation.
pub struct LedgerTxn<'a> {
    pub(crate) state: &'a mut LedgerState,
    pub(crate) now: DateTime<Utc>,
    touched: BTreeSet<UserId>,
    /// Users created by this transaction; rollback removes them.
    inserted: BTreeSet<UserId>,
    user_undo: BTreeMap<UserId, User>,
}

impl<'a> LedgerTxn<'a> {
    fn new(state: &'a mut LedgerState, now: DateTime<Utc>) -> Self {
        Self {
            state,
            now,
            touched: BTreeSet::new(),
            inserted: BTreeSet::new(),
            user_undo: BTreeMap::new(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn next_id(&mut self) -> u64 {
        self.state.next_id += 1;
        self.state.next_id
    }

    pub fn user(&self, id: UserId) -> LedgerResult<&User> {
        self.state.user(id)
    }

    /// Mutable user access. The prior record goes to the undo log and the
    /// session projection is refreshed on commit.
    pub fn user_mut(&mut self, id: UserId) -> LedgerResult<&mut User> {
        let user = self
            .state
            .users
            .get_mut(&id)
            .ok_or(LedgerError::NotFound(Entity::User, id))?;
        if !self.inserted.contains(&id) && !self.user_undo.contains_key(&id) {
            self.user_undo.insert(id, user.clone());
        }
        self.touched.insert(id);
        Ok(user)
    }

    /// Insert a brand-new user record.
    pub fn insert_user(&mut self, user: User) {
        self.touched.insert(user.id);
        self.inserted.insert(user.id);
        self.state.users.insert(user.id, user);
    }

    pub fn credit(&mut self, id: UserId, tier: BalanceTier, amount: Money) -> LedgerResult<()> {
        self.user_mut(id)?.wallet.credit(tier, amount)
    }

    pub fn debit(&mut self, id: UserId, amount: Money) -> LedgerResult<DebitBreakdown> {
        self.user_mut(id)?.wallet.debit(amount)
    }

    /// Append an audit entry. Call only after the mutation it describes.
    pub fn audit(&mut self, actor: &str, action: AuditAction, target: impl Into<String>) {
        let now = self.now;
        self.state.audit.record(actor, action, target.into(), now);
    }

    fn rollback(mut self) {
        for id in &self.inserted {
            self.state.users.remove(id);
        }
        for (id, user) in self.user_undo {
            self.state.users.insert(id, user);
        }
    }
}

// ============================================================================
// LEDGER STORE
// ============================================================================

/// Shared handle to the engine state.
///
/// `Clone` is cheap (Arc handles).
#[derive(Clone, Default)]
pub struct LedgerStore {
    state: Arc<RwLock<LedgerState>>,
    sessions: Arc<DashMap<UserId, UserView>>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store (and its projection) from a restored state.
    pub fn from_state(state: LedgerState) -> Self {
        let sessions = DashMap::new();
        for user in state.users.values() {
            sessions.insert(user.id, UserView::from(user));
        }
        info!(users = state.users.len(), "Ledger state loaded");
        Self {
            state: Arc::new(RwLock::new(state)),
            sessions: Arc::new(sessions),
        }
    }

    /// Run a read-only closure against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&LedgerState) -> R) -> R {
        let state = self.state.read();
        f(&state)
    }

    /// Run one write transaction. On `Err` every touched user is restored.
    pub fn write<R>(
        &self,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut LedgerTxn<'_>) -> LedgerResult<R>,
    ) -> LedgerResult<R> {
        let mut state = self.state.write();
        let mut txn = LedgerTxn::new(&mut state, now);

        match f(&mut txn) {
            Ok(value) => {
                let touched = std::mem::take(&mut txn.touched);
                drop(txn);
                // Refresh projections while still holding the write lock so
                // concurrent commits cannot publish out of order.
                for id in touched {
                    if let Some(user) = state.users.get(&id) {
                        self.sessions.insert(id, UserView::from(user));
                    }
                }
                Ok(value)
            }
            Err(e) => {
                txn.rollback();
                debug!(error = %e, "Transaction rolled back");
                Err(e)
            }
        }
    }

    /// Lock-free read of a user's session projection.
    #[inline]
    pub fn session_view(&self, id: UserId) -> Option<UserView> {
        self.sessions.get(&id).map(|v| v.clone())
    }

    pub fn balance(&self, id: UserId) -> LedgerResult<Wallet> {
        self.read(|s| s.user(id).map(|u| u.wallet.clone()))
    }

    /// Credit one tier of a user's wallet.
    pub fn credit(
        &self,
        now: DateTime<Utc>,
        id: UserId,
        tier: BalanceTier,
        amount: Money,
    ) -> LedgerResult<Wallet> {
        let wallet = self.write(now, |tx| {
            tx.credit(id, tier, amount)?;
            Ok(tx.user(id)?.wallet.clone())
        })?;
        info!(user_id = id, tier = ?tier, amount = %amount, "✅ Wallet credited");
        Ok(wallet)
    }

    /// Fixed-priority debit (bonus → deposited → winnable).
    pub fn debit(&self, now: DateTime<Utc>, id: UserId, amount: Money) -> LedgerResult<DebitBreakdown> {
        let breakdown = self.write(now, |tx| tx.debit(id, amount))?;
        info!(
            user_id = id,
            amount = %amount,
            from_bonus = %breakdown.from_bonus,
            from_deposited = %breakdown.from_deposited,
            from_winnable = %breakdown.from_winnable,
            "✅ Wallet debited"
        );
        Ok(breakdown)
    }

    /// Deep copy of the whole state (for snapshots).
    pub fn snapshot(&self) -> LedgerState {
        self.state.read().clone()
    }

    pub fn user_count(&self) -> usize {
        self.state.read().users.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::{Role, User};
    use crate::error::ErrorKind;
    use rust_decimal::Decimal;

    fn seeded_store() -> LedgerStore {
        let mut state = LedgerState::default();
        let mut alice = User::new(1, "alice", "alice@test.com", Role::Player, Utc::now());
        alice.wallet = Wallet::new(Decimal::from(50), Decimal::from(100), Decimal::from(30));
        state.users.insert(1, alice);
        state.next_id = 1;
        LedgerStore::from_state(state)
    }

    #[test]
    fn test_credit_debit_refresh_projection() {
        let store = seeded_store();

        store.debit(Utc::now(), 1, Decimal::from(60)).unwrap();
        let view = store.session_view(1).unwrap();
        assert_eq!(view.wallet, Wallet::new(Decimal::from(20), Decimal::from(100), Decimal::ZERO));

        store.credit(Utc::now(), 1, BalanceTier::Winnable, Decimal::from(5)).unwrap();
        assert_eq!(store.session_view(1).unwrap().wallet.winnable, Decimal::from(105));
    }

    #[test]
    fn test_failed_transaction_restores_users() {
        let store = seeded_store();

        let result: LedgerResult<()> = store.write(Utc::now(), |tx| {
            tx.debit(1, Decimal::from(10))?;
            Err(LedgerError::precondition("abort"))
        });

        assert_eq!(result.unwrap_err().kind(), ErrorKind::PreconditionFailed);
        assert_eq!(store.balance(1).unwrap().total(), Decimal::from(180));
        assert_eq!(store.session_view(1).unwrap().wallet.total(), Decimal::from(180));
    }

    #[test]
    fn test_failed_transaction_drops_inserted_user() {
        let store = seeded_store();

        let result: LedgerResult<()> = store.write(Utc::now(), |tx| {
            tx.insert_user(User::new(2, "bob", "bob@test.com", Role::Player, Utc::now()));
            tx.credit(2, BalanceTier::Bonus, Decimal::from(25))?;
            tx.debit(1, Decimal::from(10))?;
            Err(LedgerError::precondition("abort"))
        });

        assert!(result.is_err());
        assert_eq!(store.balance(2).unwrap_err().kind(), ErrorKind::NotFound);
        assert!(store.session_view(2).is_none());
        assert_eq!(store.balance(1).unwrap().total(), Decimal::from(180));
    }

    #[test]
    fn test_unknown_user() {
        let store = seeded_store();
        let err = store.debit(Utc::now(), 99, Decimal::ONE).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(store.session_view(99).is_none());
    }

    #[test]
    fn test_concurrent_debits_do_not_lose_updates() {
        let store = seeded_store();
        let handles: Vec<_> = (0..18)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.debit(Utc::now(), 1, Decimal::from(10)).is_ok())
            })
            .collect();
        let succeeded = handles
            .into_iter()
            .map(|h| h.join().unwrap_or(false))
            .filter(|ok| *ok)
            .count();
        assert_eq!(succeeded, 18);
        assert_eq!(store.balance(1).unwrap().total(), Decimal::ZERO);
    }
}
