use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::domain::roster::{EntryId, NewRosterEntry, RosterEntry};

/// Response from the maintenance endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct CleanTeamResponse {
    pub cleaned: bool,
    pub removed: usize,
    pub team: Vec<RosterEntry>,
}

/// List the team in insertion order
///
/// GET /team
pub async fn list_team(State(state): State<AppState>) -> Result<Json<Vec<RosterEntry>>, ApiError> {
    let team = state.roster.list().await?;
    Ok(Json(team))
}

/// Add a Pokémon to the team
///
/// POST /team
pub async fn add_to_team(
    State(state): State<AppState>,
    payload: Result<Json<NewRosterEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<RosterEntry>), ApiError> {
    let Json(candidate) = payload?;
    let entry = state.roster.add(candidate).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Remove an entry from the team
///
/// DELETE /team/:entry_id
pub async fn remove_from_team(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.roster.remove(EntryId::from(entry_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove duplicates and trim the team to capacity
///
/// GET|POST /clean-team
pub async fn clean_team(State(state): State<AppState>) -> Result<Json<CleanTeamResponse>, ApiError> {
    let report = state.roster.repair().await?;

    Ok(Json(CleanTeamResponse {
        cleaned: true,
        removed: report.removed,
        team: report.team,
    }))
}
