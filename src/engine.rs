// ============================================================================
// SETTLEMENT ENGINE - Operation surface over the ledger store
// ============================================================================
//
// Every user-facing or admin operation is a method on `SettlementEngine`.
// The methods are spread across the domain modules (accounts, payments,
// tournament, guild, verification); this file holds the shared plumbing:
//
//   caller ──► SettlementEngine::op(..)
//                  │  clock.now()
//                  ▼
//              LedgerStore::write(now, |tx| { validate ... mutate ... audit })
//                  │  commit: refresh session projections
//                  ▼
//              LedgerResult<T>  ──►  OperationOutcome (routes)
//
// ============================================================================

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::accounts::{UserId, UserView};
use crate::audit::AuditEntry;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::LedgerResult;
use crate::money::Money;
use crate::storage::{LedgerState, LedgerStore, LedgerTxn};
use crate::wallet::{BalanceTier, DebitBreakdown, Wallet};

/// Cheap to clone; all clones share one store.
#[derive(Clone)]
pub struct SettlementEngine {
    store: LedgerStore,
    config: Arc<EngineConfig>,
    clock: Arc<dyn Clock>,
}

impl SettlementEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: LedgerStore::new(),
            config: Arc::new(config),
            clock,
        }
    }

    /// Resume from a restored snapshot.
    pub fn from_state(state: LedgerState, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: LedgerStore::from_state(state),
            config: Arc::new(config),
            clock,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// One serializable write transaction stamped with the engine clock.
    pub(crate) fn transact<R>(
        &self,
        f: impl FnOnce(&mut LedgerTxn<'_>) -> LedgerResult<R>,
    ) -> LedgerResult<R> {
        self.store.write(self.clock.now(), f)
    }

    // ========================================================================
    // WALLET PRIMITIVES
    // ========================================================================

    /// Add `amount` to one tier of a user's wallet.
    pub fn credit(&self, user_id: UserId, tier: BalanceTier, amount: Money) -> LedgerResult<Wallet> {
        self.store.credit(self.clock.now(), user_id, tier, amount)
    }

    /// Fixed-priority deduction across all three tiers.
    pub fn debit(&self, user_id: UserId, amount: Money) -> LedgerResult<DebitBreakdown> {
        self.store.debit(self.clock.now(), user_id, amount)
    }

    pub fn wallet(&self, user_id: UserId) -> LedgerResult<Wallet> {
        self.store.balance(user_id)
    }

    /// Read-only session projection of a user.
    pub fn session_view(&self, user_id: UserId) -> Option<UserView> {
        self.store.session_view(user_id)
    }

    // ========================================================================
    // READ PROJECTIONS
    // ========================================================================

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.store.read(|s| s.audit.entries().to_vec())
    }

    /// Sum of every user's three tiers.
    pub fn total_user_funds(&self) -> Money {
        self.store.read(|s| s.total_user_funds())
    }

    pub fn snapshot(&self) -> LedgerState {
        self.store.snapshot()
    }
}

impl Default for SettlementEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
