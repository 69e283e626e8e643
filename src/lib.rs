//! Arena Ledger
//!
//! Wallet and settlement engine for a tournament and guild-war platform.
//!
//! ## Architecture
//!
//! - **Wallet**: three tiers (deposited, winnable, bonus), fixed-priority debit
//! - **Storage**: one `RwLock<LedgerState>` write scope + DashMap session projection
//! - **Persistence**: ReDB snapshots of the whole state
//! - **Server**: Axum, JSON `OperationOutcome` on every route
//! - **Money**: `rust_decimal::Decimal`, never floats

// Core
pub mod clock;
pub mod config;
pub mod error;
pub mod money;
pub mod storage;
pub mod wallet;

// Domain
pub mod accounts;
pub mod audit;
pub mod engine;
pub mod guild;
pub mod payments;
pub mod tournament;
pub mod verification;

// HTTP
pub mod routes;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use engine::SettlementEngine;
pub use error::{Entity, ErrorKind, LedgerError, LedgerResult, OperationOutcome};
pub use money::{Money, Percent};

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, EngineConfig, ServerConfig, VipPlan};
pub use storage::{LedgerState, LedgerStore, SnapshotError, SnapshotStore};
pub use wallet::{BalanceTier, DebitBreakdown, Wallet};

pub use accounts::{CoinTransfer, NewUser, Role, User, UserId, UserPatch, UserView};
pub use audit::{AuditAction, AuditEntry, AuditLog};
pub use payments::{Deposit, RequestStatus, Withdrawal};

pub use tournament::results::{KillClaim, KillResult, NormalResult, Verdict, VerificationStatus};
pub use tournament::{
    NewTournament, Participant, PrizeTier, Tournament, TournamentId, TournamentMode, TournamentPatch,
    TournamentStatus,
};

pub use guild::betting::{settle_pool, Bet, BetPayout, PoolSettlement};
pub use guild::war::{GuildWar, NewGuildWar, WarSettlement, WarStatus};
pub use guild::{Guild, GuildId, LeaveOutcome};

pub use verification::{
    Claim, ClaimedOutcome, Evaluation, GatewayError, ResultRef, SimulatedScreenshotScorer,
    VerificationGateway,
};
