// ============================================================================
// PAYMENTS - Deposit and withdrawal requests
// ============================================================================
//
// Money enters and leaves the platform only here:
//
//   request_deposit ──► Pending ──approve──► Completed  (credits `deposited`)
//                              └──reject───► Rejected
//
//   request_withdrawal ──► Pending ──approve──► Completed (debits `winnable`)
//                                 │          └► Rejected  (winnable fell short)
//                                 └──reject───► Rejected
//
// No real payment gateway is involved; the reference string is whatever
// transaction id the user typed in.
// ============================================================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::accounts::UserId;
use crate::audit::AuditAction;
use crate::engine::SettlementEngine;
use crate::error::{Entity, LedgerError, LedgerResult};
use crate::money::Money;
use crate::wallet::BalanceTier;

pub type DepositId = u64;
pub type WithdrawalId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Completed,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: DepositId,
    pub user_id: UserId,
    pub amount: Money,
    pub reference: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: WithdrawalId,
    pub user_id: UserId,
    pub amount: Money,
    pub upi_id: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

fn ensure_pending(status: RequestStatus, what: &str) -> LedgerResult<()> {
    if status != RequestStatus::Pending {
        return Err(LedgerError::AlreadyResolved(format!(
            "{what} has already been processed ({status:?})"
        )));
    }
    Ok(())
}

impl SettlementEngine {
    // ========================================================================
    // DEPOSITS
    // ========================================================================

    pub fn request_deposit(&self, user_id: UserId, amount: Money, reference: &str) -> LedgerResult<Deposit> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let min = self.config().min_deposit;
        if amount < min {
            return Err(LedgerError::LimitExceeded(format!("Minimum deposit amount is ₹{min}")));
        }

        let deposit = self.transact(|tx| {
            tx.user(user_id)?;
            let deposit = Deposit {
                id: tx.next_id(),
                user_id,
                amount,
                reference: reference.trim().to_string(),
                status: RequestStatus::Pending,
                requested_at: tx.now(),
                resolved_at: None,
            };
            tx.state.deposits.insert(deposit.id, deposit.clone());
            Ok(deposit)
        })?;

        info!(deposit_id = deposit.id, user_id, amount = %amount, "📥 Deposit requested");
        Ok(deposit)
    }

    pub fn approve_deposit(&self, admin_id: UserId, deposit_id: DepositId) -> LedgerResult<Deposit> {
        self.resolve_deposit(admin_id, deposit_id, true)
    }

    pub fn reject_deposit(&self, admin_id: UserId, deposit_id: DepositId) -> LedgerResult<Deposit> {
        self.resolve_deposit(admin_id, deposit_id, false)
    }

    fn resolve_deposit(&self, admin_id: UserId, deposit_id: DepositId, approve: bool) -> LedgerResult<Deposit> {
        let deposit = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let deposit = tx
                .state
                .deposits
                .get(&deposit_id)
                .cloned()
                .ok_or(LedgerError::NotFound(Entity::Deposit, deposit_id))?;
            ensure_pending(deposit.status, "Deposit")?;

            if approve {
                tx.credit(deposit.user_id, BalanceTier::Deposited, deposit.amount)?;
            }
            let username = tx.user(deposit.user_id)?.username.clone();

            let now = tx.now();
            let record = tx
                .state
                .deposits
                .get_mut(&deposit_id)
                .ok_or(LedgerError::NotFound(Entity::Deposit, deposit_id))?;
            record.status = if approve { RequestStatus::Completed } else { RequestStatus::Rejected };
            record.resolved_at = Some(now);
            let resolved = record.clone();

            let action = if approve { AuditAction::DepositApproved } else { AuditAction::DepositRejected };
            tx.audit(&actor, action, format!("User: {username}, Amount: ₹{}", resolved.amount));
            Ok(resolved)
        })?;

        info!(
            deposit_id,
            user_id = deposit.user_id,
            amount = %deposit.amount,
            status = ?deposit.status,
            "✅ Deposit processed"
        );
        Ok(deposit)
    }

    // ========================================================================
    // WITHDRAWALS
    // ========================================================================

    /// Only the winnable tier is withdrawable.
    pub fn request_withdrawal(&self, user_id: UserId, amount: Money, upi_id: &str) -> LedgerResult<Withdrawal> {
        let min = self.config().min_withdrawal;

        let withdrawal = self.transact(|tx| {
            let user = tx.user(user_id)?;
            user.ensure_not_banned()?;
            if amount <= Decimal::ZERO {
                return Err(LedgerError::InvalidAmount(amount));
            }
            if user.wallet.winnable < amount {
                return Err(LedgerError::InsufficientFunds {
                    available: user.wallet.winnable,
                    required: amount,
                });
            }
            if amount < min {
                return Err(LedgerError::LimitExceeded(format!("Minimum withdrawal amount is ₹{min}")));
            }

            let withdrawal = Withdrawal {
                id: tx.next_id(),
                user_id,
                amount,
                upi_id: upi_id.trim().to_string(),
                status: RequestStatus::Pending,
                requested_at: tx.now(),
                resolved_at: None,
            };
            tx.state.withdrawals.insert(withdrawal.id, withdrawal.clone());
            Ok(withdrawal)
        })?;

        info!(withdrawal_id = withdrawal.id, user_id, amount = %amount, "📤 Withdrawal requested");
        Ok(withdrawal)
    }

    /// Pays out from `winnable`. When the balance no longer covers the
    /// request the withdrawal is rejected instead and the returned record
    /// carries `RequestStatus::Rejected`.
    pub fn approve_withdrawal(&self, admin_id: UserId, withdrawal_id: WithdrawalId) -> LedgerResult<Withdrawal> {
        let withdrawal = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let pending = tx
                .state
                .withdrawals
                .get(&withdrawal_id)
                .cloned()
                .ok_or(LedgerError::NotFound(Entity::Withdrawal, withdrawal_id))?;
            ensure_pending(pending.status, "Withdrawal")?;

            let user = tx.user(pending.user_id)?;
            let covered = user.wallet.winnable >= pending.amount;
            let target = format!("User: {}, Amount: ₹{}", user.username, pending.amount);

            if covered {
                tx.user_mut(pending.user_id)?.wallet.debit_winnable(pending.amount)?;
            }

            let now = tx.now();
            let record = tx
                .state
                .withdrawals
                .get_mut(&withdrawal_id)
                .ok_or(LedgerError::NotFound(Entity::Withdrawal, withdrawal_id))?;
            record.status = if covered { RequestStatus::Completed } else { RequestStatus::Rejected };
            record.resolved_at = Some(now);
            let resolved = record.clone();

            let action = if covered {
                AuditAction::WithdrawalApproved
            } else {
                AuditAction::WithdrawalAutoRejected
            };
            tx.audit(&actor, action, target);
            Ok(resolved)
        })?;

        match withdrawal.status {
            RequestStatus::Completed => {
                info!(withdrawal_id, user_id = withdrawal.user_id, amount = %withdrawal.amount, "✅ Withdrawal approved")
            }
            _ => warn!(
                withdrawal_id,
                user_id = withdrawal.user_id,
                amount = %withdrawal.amount,
                "Withdrawal auto-rejected: insufficient winnable balance"
            ),
        }
        Ok(withdrawal)
    }

    pub fn reject_withdrawal(&self, admin_id: UserId, withdrawal_id: WithdrawalId) -> LedgerResult<Withdrawal> {
        let withdrawal = self.transact(|tx| {
            let actor = tx.admin_name(admin_id)?;
            let pending = tx
                .state
                .withdrawals
                .get(&withdrawal_id)
                .ok_or(LedgerError::NotFound(Entity::Withdrawal, withdrawal_id))?;
            ensure_pending(pending.status, "Withdrawal")?;
            let username = tx.user(pending.user_id)?.username.clone();

            let now = tx.now();
            let resolved = match tx.state.withdrawals.get_mut(&withdrawal_id) {
                Some(record) => {
                    record.status = RequestStatus::Rejected;
                    record.resolved_at = Some(now);
                    record.clone()
                }
                None => return Err(LedgerError::NotFound(Entity::Withdrawal, withdrawal_id)),
            };

            tx.audit(
                &actor,
                AuditAction::WithdrawalRejected,
                format!("User: {username}, Amount: ₹{}", resolved.amount),
            );
            Ok(resolved)
        })?;

        info!(withdrawal_id, user_id = withdrawal.user_id, "Withdrawal rejected");
        Ok(withdrawal)
    }

    pub fn pending_deposits(&self) -> Vec<Deposit> {
        self.store().read(|s| {
            s.deposits
                .values()
                .filter(|d| d.status == RequestStatus::Pending)
                .cloned()
                .collect()
        })
    }

    pub fn pending_withdrawals(&self) -> Vec<Withdrawal> {
        self.store().read(|s| {
            s.withdrawals
                .values()
                .filter(|w| w.status == RequestStatus::Pending)
                .cloned()
                .collect()
        })
    }
}
