// API layer module (adapters for controllers)
// Follows Hexagonal Architecture - API is an adapter

pub mod errors;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::repositories::PokemonSource;
use crate::domain::roster::RosterStore;
use handlers::{battles, health, team};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub roster: Arc<RosterStore>,
    pub pokemon: Arc<dyn PokemonSource>,
}

impl AppState {
    pub fn new(roster: Arc<RosterStore>, pokemon: Arc<dyn PokemonSource>) -> Self {
        Self { roster, pokemon }
    }
}

/// Builds the Roster Service router
pub fn router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Team routes
        .route("/team", get(team::list_team).post(team::add_to_team))
        .route("/team/:entry_id", delete(team::remove_from_team))
        .route("/clean-team", get(team::clean_team).post(team::clean_team))
        // Battle routes
        .route("/battles", get(battles::list_battles).post(battles::start_battle))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Shared state
        .with_state(state)
}
