use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::extraction::extract_profile;
use crate::interview::session::SessionReply;
use crate::models::profile::Profile;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub message: &'static str,
    pub initial_question: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnswerResponse {
    Question { next_question: String },
    Completed { message: &'static str },
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Profile,
}

/// POST /api/v1/interviews/:user_id/start
pub async fn handle_start_interview(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<StartResponse>, AppError> {
    info!("Starting interview for user {user_id}");

    let handle = state.sessions.create(user_id);
    let mut session = handle.lock().await;
    let initial_question = session.start(state.llm.as_ref()).await?;

    Ok(Json(StartResponse {
        message: "Interview started",
        initial_question,
    }))
}

/// POST /api/v1/interviews/:user_id/answers
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("Answer must not be empty".to_string()));
    }

    let handle = state.sessions.get(user_id)?;
    let mut session = handle.lock().await;
    let reply = session.submit_answer(state.llm.as_ref(), &req.content).await?;

    let response = match reply {
        SessionReply::Question(next_question) => AnswerResponse::Question { next_question },
        SessionReply::Completed => {
            info!("Interview completed for user {user_id}");
            AnswerResponse::Completed {
                message: "Interview completed",
            }
        }
    };
    Ok(Json(response))
}

/// POST /api/v1/interviews/:user_id/profile
///
/// Extracts the structured profile from the interview transcript, persists
/// it, and retires the session.
pub async fn handle_extract_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, AppError> {
    info!("Generating profile for user {user_id}");

    let handle = state.sessions.get(user_id)?;
    let profile = {
        let session = handle.lock().await;
        extract_profile(state.llm.as_ref(), session.transcript()).await?
    };

    state.store.put(user_id, &profile, true).await?;
    state.sessions.remove(user_id);
    info!("Profile stored for user {user_id}");

    Ok(Json(ProfileResponse { profile }))
}
