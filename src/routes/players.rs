// ============================================================================
// PLAYER ROUTES - Registration, wallet, VIP, payments
// ============================================================================

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::{respond, AppState};
use crate::accounts::{NewUser, Role, UserId};
use crate::error::{Entity, LedgerError};
use crate::money::Money;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub upi_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeviceRequest {
    pub device_info: String,
}

#[derive(Debug, Deserialize)]
pub struct VipRequest {
    pub plan_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub receiver_id: UserId,
    pub amount: Money,
}

#[derive(Debug, Deserialize)]
pub struct DepositRequest {
    pub user_id: UserId,
    pub amount: Money,
    pub reference: String,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalRequest {
    pub user_id: UserId,
    pub amount: Money,
    pub upi_id: String,
}

/// POST /users
///
/// Public registration always creates a player account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    let new = NewUser {
        username: req.username,
        email: req.email,
        role: Role::Player,
        upi_id: req.upi_id,
    };
    respond(state.engine.register_user(new), "Account created successfully!")
}

/// GET /users/{id}
pub async fn session_handler(State(state): State<AppState>, Path(id): Path<UserId>) -> impl IntoResponse {
    let view = state
        .engine
        .session_view(id)
        .ok_or(LedgerError::NotFound(Entity::User, id));
    respond(view, "User found")
}

/// GET /users/{id}/wallet
pub async fn wallet_handler(State(state): State<AppState>, Path(id): Path<UserId>) -> impl IntoResponse {
    respond(state.engine.wallet(id), "Wallet")
}

/// POST /users/{id}/device
pub async fn device_handler(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(req): Json<DeviceRequest>,
) -> impl IntoResponse {
    respond(state.engine.record_device(id, &req.device_info), "Device recorded")
}

/// POST /users/{id}/vip
pub async fn buy_vip_handler(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(req): Json<VipRequest>,
) -> impl IntoResponse {
    respond(state.engine.buy_vip(id, &req.plan_id), "VIP membership activated!")
}

/// GET /users/{id}/bet-limit
pub async fn bet_limit_handler(State(state): State<AppState>, Path(id): Path<UserId>) -> impl IntoResponse {
    respond(state.engine.remaining_daily_limit(id), "Remaining daily bet limit")
}

/// POST /users/{id}/transfer
pub async fn transfer_handler(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(req): Json<TransferRequest>,
) -> impl IntoResponse {
    respond(state.engine.transfer_coins(id, req.receiver_id, req.amount), "Coins sent successfully!")
}

/// POST /deposits
pub async fn request_deposit_handler(
    State(state): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> impl IntoResponse {
    respond(
        state.engine.request_deposit(req.user_id, req.amount, &req.reference),
        "Deposit request submitted for admin review.",
    )
}

/// POST /withdrawals
pub async fn request_withdrawal_handler(
    State(state): State<AppState>,
    Json(req): Json<WithdrawalRequest>,
) -> impl IntoResponse {
    respond(
        state.engine.request_withdrawal(req.user_id, req.amount, &req.upi_id),
        "Withdrawal request submitted successfully for admin review.",
    )
}
