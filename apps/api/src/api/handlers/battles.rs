use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::errors::ApiError;
use crate::api::AppState;
use crate::domain::battle::{decide, BattleRecord, BattleStats, NewBattle, Side};
use crate::domain::pokemon::Pokemon;
use crate::domain::RosterResult;

const INVALID_REQUEST: &str = "invalid_request";

/// Request body for a battle between two Pokémon ids
#[derive(Debug, Deserialize)]
pub struct BattleRequest {
    pub pokemon1: Option<u32>,
    pub pokemon2: Option<u32>,
}

/// One combatant as shown in a battle result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
    pub id: u32,
    pub name: String,
    pub display_name: String,
    pub artwork_url: String,
    pub primary_type: Option<String>,
    pub stats: BattleStats,
}

impl Combatant {
    fn from_pokemon(pokemon: &Pokemon) -> RosterResult<Self> {
        Ok(Self {
            id: pokemon.id,
            name: pokemon.name.clone(),
            display_name: pokemon.display_name(),
            artwork_url: pokemon.artwork_url(),
            primary_type: pokemon.primary_type().map(str::to_string),
            stats: pokemon.battle_stats()?,
        })
    }
}

/// Response from a battle
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleResponse {
    pub pokemon1: Combatant,
    pub pokemon2: Combatant,
    pub winner: String,
    pub points: [u8; 2],
    pub battle: BattleRecord,
}

/// Battle history, oldest first
///
/// GET /battles
pub async fn list_battles(
    State(state): State<AppState>,
) -> Result<Json<Vec<BattleRecord>>, ApiError> {
    let battles = state.roster.battles().await?;
    Ok(Json(battles))
}

/// Fight two Pokémon and record the result
///
/// POST /battles
pub async fn start_battle(
    State(state): State<AppState>,
    payload: Result<Json<BattleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BattleResponse>), ApiError> {
    let Json(req) = payload
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()).with_code(INVALID_REQUEST))?;

    let (Some(first_id), Some(second_id)) = (
        req.pokemon1.filter(|id| *id > 0),
        req.pokemon2.filter(|id| *id > 0),
    ) else {
        return Err(
            ApiError::bad_request("Please select two Pokémon to battle!").with_code(INVALID_REQUEST),
        );
    };

    let (first, second) = tokio::try_join!(
        state.pokemon.fetch(first_id),
        state.pokemon.fetch(second_id)
    )?;

    let pokemon1 = Combatant::from_pokemon(&first)?;
    let pokemon2 = Combatant::from_pokemon(&second)?;

    let outcome = decide(&pokemon1.stats, &pokemon2.stats);
    let winner = match outcome.winner {
        Side::First => &pokemon1.name,
        Side::Second => &pokemon2.name,
    }
    .clone();

    let battle = state
        .roster
        .record_battle(NewBattle {
            pokemon1: pokemon1.name.clone(),
            pokemon2: pokemon2.name.clone(),
            winner: winner.clone(),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BattleResponse {
            pokemon1,
            pokemon2,
            winner,
            points: [outcome.first_points, outcome.second_points],
            battle,
        }),
    ))
}
