// ============================================================================
// ADMIN ROUTES - Account controls, payment approvals, audit log
// ============================================================================
//
// Every handler here names the acting admin; the engine rejects callers
// without the SuperAdmin role.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::{respond, AppState};
use crate::accounts::{UserId, UserPatch};
use crate::money::Money;
use crate::payments::{DepositId, WithdrawalId};

#[derive(Debug, Deserialize)]
pub struct AdminOnly {
    pub admin_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct BanRequest {
    pub admin_id: UserId,
    pub banned: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditUserRequest {
    pub admin_id: UserId,
    pub patch: UserPatch,
}

#[derive(Debug, Deserialize)]
pub struct BonusRequest {
    pub admin_id: UserId,
    pub amount: Money,
}

/// GET /admin/audit
pub async fn audit_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.audit_entries())
}

/// GET /admin/pending
pub async fn pending_handler(State(state): State<AppState>) -> impl IntoResponse {
    let engine = &state.engine;
    Json(serde_json::json!({
        "deposits": engine.pending_deposits(),
        "withdrawals": engine.pending_withdrawals(),
        "results": engine.pending_results(),
    }))
}

/// POST /admin/users/{id}/ban
pub async fn ban_handler(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(req): Json<BanRequest>,
) -> impl IntoResponse {
    let message = if req.banned { "User has been banned." } else { "User has been unbanned." };
    respond(state.engine.set_ban(req.admin_id, id, req.banned, req.reason), message)
}

/// POST /admin/users/{id}/edit
pub async fn edit_user_handler(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(req): Json<EditUserRequest>,
) -> impl IntoResponse {
    respond(state.engine.update_user(req.admin_id, id, req.patch), "User details updated.")
}

/// POST /admin/users/{id}/bonus
pub async fn bonus_handler(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(req): Json<BonusRequest>,
) -> impl IntoResponse {
    respond(state.engine.grant_bonus(req.admin_id, id, req.amount), "Bonus granted.")
}

/// POST /admin/deposits/{id}/approve
pub async fn approve_deposit_handler(
    State(state): State<AppState>,
    Path(id): Path<DepositId>,
    Json(req): Json<AdminOnly>,
) -> impl IntoResponse {
    respond(state.engine.approve_deposit(req.admin_id, id), "Deposit approved.")
}

/// POST /admin/deposits/{id}/reject
pub async fn reject_deposit_handler(
    State(state): State<AppState>,
    Path(id): Path<DepositId>,
    Json(req): Json<AdminOnly>,
) -> impl IntoResponse {
    respond(state.engine.reject_deposit(req.admin_id, id), "Deposit rejected.")
}

/// POST /admin/withdrawals/{id}/approve
///
/// `success` is true even when the request was auto-rejected; the returned
/// record's status tells the two apart.
pub async fn approve_withdrawal_handler(
    State(state): State<AppState>,
    Path(id): Path<WithdrawalId>,
    Json(req): Json<AdminOnly>,
) -> impl IntoResponse {
    respond(state.engine.approve_withdrawal(req.admin_id, id), "Withdrawal processed.")
}

/// POST /admin/withdrawals/{id}/reject
pub async fn reject_withdrawal_handler(
    State(state): State<AppState>,
    Path(id): Path<WithdrawalId>,
    Json(req): Json<AdminOnly>,
) -> impl IntoResponse {
    respond(state.engine.reject_withdrawal(req.admin_id, id), "Withdrawal rejected.")
}
