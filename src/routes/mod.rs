// ============================================================================
// HTTP ROUTES - JSON surface over the settlement engine
// ============================================================================
//
// Every operation answers with an `OperationOutcome`:
//
//   { "success": bool, "kind": ErrorKind?, "message": String, "data": T? }
//
// Callers branch on `success` and `kind`; `message` is for display only.
// Authentication is outside this service: the acting user (or admin) id is
// part of each request body and admin routes check the role server-side.
//
// Route Organization:
// - players.rs:     registration, wallet, VIP, deposits, withdrawals
// - tournaments.rs: tournaments, joins, results, verification, reviews
// - guilds.rs:      guilds, wars, bets
// - admin.rs:       account controls, payment approvals, audit log
// ============================================================================

pub mod admin;
pub mod guilds;
pub mod players;
pub mod tournaments;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::engine::SettlementEngine;
use crate::error::{ErrorKind, LedgerResult, OperationOutcome};
use crate::verification::VerificationGateway;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    pub engine: SettlementEngine,
    pub gateway: Arc<dyn VerificationGateway>,
}

impl AppState {
    pub fn new(engine: SettlementEngine, gateway: Arc<dyn VerificationGateway>) -> Self {
        Self { engine, gateway }
    }
}

/// HTTP status for a failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidAmount => StatusCode::BAD_REQUEST,
        ErrorKind::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
        ErrorKind::Capacity | ErrorKind::DuplicateAction | ErrorKind::AlreadyResolved => StatusCode::CONFLICT,
        ErrorKind::LimitExceeded | ErrorKind::PreconditionFailed => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Turn an operation result into `(status, OperationOutcome)`.
pub(crate) fn respond<T: Serialize>(result: LedgerResult<T>, success_message: &str) -> (StatusCode, Json<OperationOutcome>) {
    let outcome = OperationOutcome::from_result(&result, success_message);
    let status = outcome.kind.map(status_for).unwrap_or(StatusCode::OK);
    (status, Json(outcome))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let engine = &state.engine;
    Json(serde_json::json!({
        "status": "healthy",
        "version": VERSION,
        "ledger": {
            "users": engine.store().user_count(),
            "total_user_funds": engine.total_user_funds(),
            "audit_entries": engine.store().read(|s| s.audit.len()),
        }
    }))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        // Players
        .route("/users", post(players::register_handler))
        .route("/users/{id}", get(players::session_handler))
        .route("/users/{id}/wallet", get(players::wallet_handler))
        .route("/users/{id}/device", post(players::device_handler))
        .route("/users/{id}/vip", post(players::buy_vip_handler))
        .route("/users/{id}/bet-limit", get(players::bet_limit_handler))
        .route("/users/{id}/transfer", post(players::transfer_handler))
        .route("/deposits", post(players::request_deposit_handler))
        .route("/withdrawals", post(players::request_withdrawal_handler))
        // Tournaments
        .route("/tournaments", get(tournaments::list_handler))
        .route("/tournaments/{id}", get(tournaments::get_handler))
        .route("/tournaments/{id}/join", post(tournaments::join_handler))
        .route("/tournaments/{id}/results", post(tournaments::submit_result_handler))
        // Guilds & wars
        .route("/guilds", get(guilds::list_handler).post(guilds::create_handler))
        .route("/guilds/leave", post(guilds::leave_handler))
        .route("/guilds/{id}", get(guilds::get_handler))
        .route("/guilds/{id}/join", post(guilds::join_handler))
        .route("/wars", get(guilds::list_wars_handler))
        .route("/wars/{id}", get(guilds::get_war_handler))
        .route("/wars/{id}/bets", get(guilds::war_bets_handler).post(guilds::place_bet_handler))
        // Admin
        .route("/admin/audit", get(admin::audit_handler))
        .route("/admin/pending", get(admin::pending_handler))
        .route("/admin/users/{id}/ban", post(admin::ban_handler))
        .route("/admin/users/{id}/edit", post(admin::edit_user_handler))
        .route("/admin/users/{id}/bonus", post(admin::bonus_handler))
        .route("/admin/deposits/{id}/approve", post(admin::approve_deposit_handler))
        .route("/admin/deposits/{id}/reject", post(admin::reject_deposit_handler))
        .route("/admin/withdrawals/{id}/approve", post(admin::approve_withdrawal_handler))
        .route("/admin/withdrawals/{id}/reject", post(admin::reject_withdrawal_handler))
        .route("/admin/tournaments", post(tournaments::create_handler))
        .route("/admin/tournaments/{id}", delete(tournaments::delete_handler))
        .route("/admin/tournaments/{id}/update", post(tournaments::update_handler))
        .route("/admin/tournaments/{id}/status", post(tournaments::status_handler))
        .route("/admin/tournaments/{id}/kills", post(tournaments::post_kills_handler))
        .route("/admin/tournaments/{id}/kills/{user_id}/verify", post(tournaments::verify_kill_handler))
        .route("/admin/tournaments/{id}/kills/{user_id}/review", post(tournaments::review_kill_handler))
        .route("/admin/results/{id}/verify", post(tournaments::verify_result_handler))
        .route("/admin/results/{id}/review", post(tournaments::review_result_handler))
        .route("/admin/wars", post(guilds::create_war_handler))
        .route("/admin/wars/{id}/resolve", post(guilds::resolve_war_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
