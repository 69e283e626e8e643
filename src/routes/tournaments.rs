// ============================================================================
// TOURNAMENT ROUTES - Lifecycle, joins, results, reviews
// ============================================================================

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::debug;

use super::admin::AdminOnly;
use super::{respond, AppState};
use crate::accounts::UserId;
use crate::tournament::results::{KillClaim, ResultId, Verdict};
use crate::tournament::{NewTournament, TournamentId, TournamentPatch, TournamentStatus};
use crate::verification::ResultRef;

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub user_id: UserId,
    #[serde(default)]
    pub emulator_declaration: bool,
}

#[derive(Debug, Deserialize)]
pub struct SubmitResultRequest {
    pub user_id: UserId,
    pub rank: u32,
    #[serde(default)]
    pub screenshot_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub admin_id: UserId,
    pub tournament: NewTournament,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTournamentRequest {
    pub admin_id: UserId,
    pub patch: TournamentPatch,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub admin_id: UserId,
    pub status: TournamentStatus,
}

#[derive(Debug, Deserialize)]
pub struct PostKillsRequest {
    pub admin_id: UserId,
    pub results: Vec<KillClaim>,
}

#[derive(Debug, Deserialize)]
pub struct VerdictRequest {
    pub admin_id: UserId,
    pub verdict: Verdict,
}

/// GET /tournaments
pub async fn list_handler(State(state): State<AppState>) -> impl IntoResponse {
    let tournaments = state.engine.tournaments();
    debug!(count = tournaments.len(), "Listing tournaments");
    Json(tournaments)
}

/// GET /tournaments/{id}
pub async fn get_handler(State(state): State<AppState>, Path(id): Path<TournamentId>) -> impl IntoResponse {
    respond(state.engine.tournament(id), "Tournament found")
}

/// POST /tournaments/{id}/join
pub async fn join_handler(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
    Json(req): Json<JoinRequest>,
) -> impl IntoResponse {
    respond(
        state.engine.join_tournament(id, req.user_id, req.emulator_declaration),
        "Successfully joined the tournament!",
    )
}

/// POST /tournaments/{id}/results
pub async fn submit_result_handler(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
    Json(req): Json<SubmitResultRequest>,
) -> impl IntoResponse {
    respond(
        state.engine.submit_normal_result(id, req.user_id, req.rank, req.screenshot_path),
        "Your result has been submitted for verification.",
    )
}

/// POST /admin/tournaments
pub async fn create_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateTournamentRequest>,
) -> impl IntoResponse {
    respond(
        state.engine.create_tournament(req.admin_id, req.tournament),
        "Tournament created successfully.",
    )
}

/// POST /admin/tournaments/{id}/update
pub async fn update_handler(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
    Json(req): Json<UpdateTournamentRequest>,
) -> impl IntoResponse {
    respond(
        state.engine.update_tournament(req.admin_id, id, req.patch),
        "Tournament updated successfully.",
    )
}

/// POST /admin/tournaments/{id}/status
pub async fn status_handler(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
    Json(req): Json<StatusRequest>,
) -> impl IntoResponse {
    respond(
        state.engine.set_tournament_status(req.admin_id, id, req.status),
        "Tournament status updated.",
    )
}

/// DELETE /admin/tournaments/{id}
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
    Json(req): Json<AdminOnly>,
) -> impl IntoResponse {
    respond(state.engine.delete_tournament(req.admin_id, id), "Tournament has been deleted.")
}

/// POST /admin/tournaments/{id}/kills
pub async fn post_kills_handler(
    State(state): State<AppState>,
    Path(id): Path<TournamentId>,
    Json(req): Json<PostKillsRequest>,
) -> impl IntoResponse {
    respond(
        state.engine.set_kill_results(req.admin_id, id, req.results),
        "Results submitted for kill-based tournament.",
    )
}

/// POST /admin/tournaments/{id}/kills/{user_id}/verify
pub async fn verify_kill_handler(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(TournamentId, UserId)>,
    Json(req): Json<VerdictRequest>,
) -> impl IntoResponse {
    respond(
        state.engine.verify_kill_result(req.admin_id, id, user_id, req.verdict),
        "Kill result processed.",
    )
}

/// POST /admin/results/{id}/verify
pub async fn verify_result_handler(
    State(state): State<AppState>,
    Path(id): Path<ResultId>,
    Json(req): Json<VerdictRequest>,
) -> impl IntoResponse {
    respond(
        state.engine.verify_normal_result(req.admin_id, id, req.verdict),
        "Result processed.",
    )
}

/// POST /admin/results/{id}/review
///
/// Dispatches the gateway in the background and answers immediately.
pub async fn review_result_handler(State(state): State<AppState>, Path(id): Path<ResultId>) -> impl IntoResponse {
    let target = ResultRef::Normal { result_id: id };
    let dispatched = state
        .engine
        .request_review(state.gateway.clone(), target)
        .map(|_| target);
    respond(dispatched, "Review requested")
}

/// POST /admin/tournaments/{id}/kills/{user_id}/review
pub async fn review_kill_handler(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(TournamentId, UserId)>,
) -> impl IntoResponse {
    let target = ResultRef::Kill { tournament_id: id, user_id };
    let dispatched = state
        .engine
        .request_review(state.gateway.clone(), target)
        .map(|_| target);
    respond(dispatched, "Review requested")
}
