// ============================================================================
// GUILD ROUTES - Guilds, wars, bets
// ============================================================================

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::{respond, AppState};
use crate::accounts::UserId;
use crate::guild::war::{NewGuildWar, WarId};
use crate::guild::GuildId;
use crate::money::Money;

#[derive(Debug, Deserialize)]
pub struct CreateGuildRequest {
    pub user_id: UserId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MemberRequest {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct BetRequest {
    pub user_id: UserId,
    pub guild_id: GuildId,
    pub amount: Money,
}

#[derive(Debug, Deserialize)]
pub struct CreateWarRequest {
    pub admin_id: UserId,
    pub war: NewGuildWar,
}

#[derive(Debug, Deserialize)]
pub struct ResolveWarRequest {
    pub admin_id: UserId,
    pub winner_guild_id: GuildId,
}

/// GET /guilds
pub async fn list_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.guilds())
}

/// POST /guilds
pub async fn create_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateGuildRequest>,
) -> impl IntoResponse {
    respond(state.engine.create_guild(req.user_id, &req.name), "Guild created successfully!")
}

/// GET /guilds/{id}
pub async fn get_handler(State(state): State<AppState>, Path(id): Path<GuildId>) -> impl IntoResponse {
    respond(state.engine.guild(id), "Guild found")
}

/// POST /guilds/{id}/join
pub async fn join_handler(
    State(state): State<AppState>,
    Path(id): Path<GuildId>,
    Json(req): Json<MemberRequest>,
) -> impl IntoResponse {
    respond(state.engine.join_guild(req.user_id, id), "Joined guild")
}

/// POST /guilds/leave
pub async fn leave_handler(State(state): State<AppState>, Json(req): Json<MemberRequest>) -> impl IntoResponse {
    respond(state.engine.leave_guild(req.user_id), "You have left the guild.")
}

/// GET /wars
pub async fn list_wars_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.wars())
}

/// GET /wars/{id}
pub async fn get_war_handler(State(state): State<AppState>, Path(id): Path<WarId>) -> impl IntoResponse {
    respond(state.engine.war(id), "Guild war found")
}

/// GET /wars/{id}/bets
pub async fn war_bets_handler(State(state): State<AppState>, Path(id): Path<WarId>) -> impl IntoResponse {
    Json(state.engine.bets_for_war(id))
}

/// POST /wars/{id}/bets
pub async fn place_bet_handler(
    State(state): State<AppState>,
    Path(id): Path<WarId>,
    Json(req): Json<BetRequest>,
) -> impl IntoResponse {
    respond(
        state.engine.place_bet(req.user_id, id, req.guild_id, req.amount),
        "Bet placed successfully!",
    )
}

/// POST /admin/wars
pub async fn create_war_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateWarRequest>,
) -> impl IntoResponse {
    respond(state.engine.create_guild_war(req.admin_id, req.war), "Guild war created successfully!")
}

/// POST /admin/wars/{id}/resolve
pub async fn resolve_war_handler(
    State(state): State<AppState>,
    Path(id): Path<WarId>,
    Json(req): Json<ResolveWarRequest>,
) -> impl IntoResponse {
    respond(
        state.engine.resolve_guild_war(req.admin_id, id, req.winner_guild_id),
        "War resolved and all payouts processed.",
    )
}
