use std::cmp::Ordering;

use axum::{
    extract::{Path, State},
    Json,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;
use crate::simulation::matching::{MatchOrchestrator, MatchResult};
use crate::simulation::runner::{run_pair, SimulationRecord, CONVERSATIONS_COLLECTION, DEFAULT_EXCHANGES};
use crate::state::AppState;

fn default_exchanges() -> usize {
    DEFAULT_EXCHANGES
}

#[derive(Debug, Deserialize)]
pub struct SimulationRequest {
    pub user_id1: Uuid,
    pub user_id2: Uuid,
    #[serde(default = "default_exchanges")]
    pub num_exchanges: usize,
}

#[derive(Debug, Serialize)]
pub struct MatchesResponse {
    pub message: &'static str,
    pub matches: Vec<MatchResult>,
}

#[derive(Debug, Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<Value>,
}

/// POST /api/v1/simulations
///
/// Simulates one encounter per configured setting for an explicit pair.
pub async fn handle_simulate(
    State(state): State<AppState>,
    Json(req): Json<SimulationRequest>,
) -> Result<Json<Vec<SimulationRecord>>, AppError> {
    if req.num_exchanges == 0 {
        return Err(AppError::Validation(
            "num_exchanges must be at least 1".to_string(),
        ));
    }

    let profile_a = state.store.get(req.user_id1).await?.ok_or_else(|| {
        AppError::NotFound(format!("User {} not found", req.user_id1))
    })?;
    let profile_b = state.store.get(req.user_id2).await?.ok_or_else(|| {
        AppError::NotFound(format!("User {} not found", req.user_id2))
    })?;

    let mut rng = StdRng::from_entropy();
    let records = run_pair(
        state.llm.as_ref(),
        state.store.as_ref(),
        (req.user_id1, &profile_a),
        (req.user_id2, &profile_b),
        req.num_exchanges,
        &mut rng,
    )
    .await?;

    Ok(Json(records))
}

/// POST /api/v1/matches/:user_id
pub async fn handle_find_matches(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MatchesResponse>, AppError> {
    let orchestrator = MatchOrchestrator::new(state.llm.clone(), state.store.clone());
    let matches = orchestrator.find_matches(user_id).await?;

    Ok(Json(MatchesResponse {
        message: "Matching simulation completed",
        matches,
    }))
}

/// GET /api/v1/users/:user_id/conversations
///
/// Stored encounter documents, best compatibility first; documents without a
/// usable score sort after every scored one, in stored order.
pub async fn handle_list_conversations(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ConversationsResponse>, AppError> {
    let mut conversations = state
        .store
        .list_records(user_id, CONVERSATIONS_COLLECTION)
        .await?;

    conversations.sort_by(|left, right| {
        match (stored_score(left), stored_score(right)) {
            (Some(l), Some(r)) => r.cmp(&l),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });

    Ok(Json(ConversationsResponse { conversations }))
}

fn stored_score(document: &Value) -> Option<i64> {
    document.get("compatibility").and_then(Value::as_i64)
}
