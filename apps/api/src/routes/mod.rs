pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers as interview;
use crate::simulation::handlers as simulation;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Interview API
        .route(
            "/api/v1/interviews/:user_id/start",
            post(interview::handle_start_interview),
        )
        .route(
            "/api/v1/interviews/:user_id/answers",
            post(interview::handle_submit_answer),
        )
        .route(
            "/api/v1/interviews/:user_id/profile",
            post(interview::handle_extract_profile),
        )
        // Simulation & matching API
        .route("/api/v1/simulations", post(simulation::handle_simulate))
        .route(
            "/api/v1/matches/:user_id",
            post(simulation::handle_find_matches),
        )
        .route(
            "/api/v1/users/:user_id/conversations",
            get(simulation::handle_list_conversations),
        )
        .with_state(state)
}
