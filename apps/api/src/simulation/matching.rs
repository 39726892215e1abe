//! Batched pairwise matchmaking.
//!
//! Candidates are evaluated against the user in fixed-size batches: within a
//! batch the evaluations run concurrently and are joined in fetch order, and
//! a short sleep separates batches to avoid bursting the model endpoint.
//! Each evaluation is wrapped so one candidate's failure becomes an
//! error-carrying entry instead of cancelling its siblings.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::ChatApi;
use crate::models::profile::Profile;
use crate::simulation::runner::{run_pair, SimulationRecord, DEFAULT_EXCHANGES};
use crate::store::{ProfileQuery, ProfileStore, QueryMode};

/// Candidates evaluated concurrently per batch.
pub const BATCH_SIZE: usize = 3;
/// Pause between batches. A bounded sleep, not a token bucket.
pub const BATCH_DELAY: Duration = Duration::from_secs(1);
/// Per-user collection that keeps one summary document per matching run.
pub const MATCH_RUNS_COLLECTION: &str = "match_runs";

/// One evaluated candidate. `results` holds one record per meeting setting;
/// an empty list plus `error` marks a candidate whose evaluation failed.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub match_id: Uuid,
    pub profile: Profile,
    pub results: Vec<SimulationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MatchResult {
    /// Ranking reads only the first setting's score. The remaining settings'
    /// scores are computed and stored but not folded in here.
    pub fn primary_score(&self) -> Option<u8> {
        self.results
            .first()
            .and_then(|record| record.analysis.compatibility_score)
    }
}

pub struct MatchOrchestrator {
    llm: Arc<dyn ChatApi>,
    store: Arc<dyn ProfileStore>,
}

impl MatchOrchestrator {
    pub fn new(llm: Arc<dyn ChatApi>, store: Arc<dyn ProfileStore>) -> Self {
        Self { llm, store }
    }

    /// Evaluates every eligible candidate against the user and returns them
    /// ranked: scored entries descending, score-absent entries after all
    /// scored ones, ties kept in fetch order.
    pub async fn find_matches(&self, user_id: Uuid) -> Result<Vec<MatchResult>, AppError> {
        info!("Starting matching run for user {user_id}");

        let user = self
            .store
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

        // No usable gender means no filter can be built: an empty result
        // list, not an error.
        let Some(gender) = user.declared_gender() else {
            warn!("User {user_id} has no usable gender attribute; returning no matches");
            return Ok(Vec::new());
        };
        let Some(target) = opposite_gender(&gender) else {
            warn!("Unrecognized gender '{gender}' for user {user_id}; returning no matches");
            return Ok(Vec::new());
        };

        let mut pool = self
            .store
            .query(&ProfileQuery {
                gender: target.to_string(),
                mode: QueryMode::Primary,
            })
            .await?;
        if pool.is_empty() {
            info!("Primary candidate query returned nothing; broadening");
            pool = self
                .store
                .query(&ProfileQuery {
                    gender: target.to_string(),
                    mode: QueryMode::Broadened,
                })
                .await?;
        }
        pool.retain(|(candidate_id, _)| *candidate_id != user_id);
        info!("Evaluating {} candidates for user {user_id}", pool.len());

        let batches: Vec<&[(Uuid, Profile)]> = pool.chunks(BATCH_SIZE).collect();
        let mut matches = Vec::with_capacity(pool.len());
        for (index, batch) in batches.iter().enumerate() {
            let evaluations = batch.iter().map(|(candidate_id, candidate)| {
                self.evaluate_candidate(user_id, &user, *candidate_id, candidate)
            });
            matches.extend(join_all(evaluations).await);

            if index + 1 < batches.len() {
                tokio::time::sleep(BATCH_DELAY).await;
            }
        }

        rank_matches(&mut matches);
        self.record_run(user_id, &matches).await?;
        info!("Matching run for user {user_id} produced {} results", matches.len());
        Ok(matches)
    }

    /// One candidate, all settings. Failures are contained here so the rest
    /// of the batch always completes.
    async fn evaluate_candidate(
        &self,
        user_id: Uuid,
        user: &Profile,
        candidate_id: Uuid,
        candidate: &Profile,
    ) -> MatchResult {
        let mut rng = StdRng::from_entropy();
        match run_pair(
            self.llm.as_ref(),
            self.store.as_ref(),
            (user_id, user),
            (candidate_id, candidate),
            DEFAULT_EXCHANGES,
            &mut rng,
        )
        .await
        {
            Ok(results) => MatchResult {
                match_id: candidate_id,
                profile: candidate.clone(),
                results,
                error: None,
            },
            Err(e) => {
                error!("Evaluation of candidate {candidate_id} failed: {e}");
                MatchResult {
                    match_id: candidate_id,
                    profile: candidate.clone(),
                    results: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn record_run(&self, user_id: Uuid, matches: &[MatchResult]) -> Result<(), AppError> {
        let summary = serde_json::json!({
            "user_id": user_id,
            "recorded_at": chrono::Utc::now(),
            "matches": matches
                .iter()
                .map(|result| serde_json::json!({
                    "match_id": result.match_id,
                    "compatibility_score": result.primary_score(),
                }))
                .collect::<Vec<_>>(),
        });
        self.store
            .append_record(user_id, MATCH_RUNS_COLLECTION, &summary)
            .await
    }
}

/// The declared-preference filter: recognized categories map to their
/// opposite, anything else means no filter can be constructed.
pub fn opposite_gender(gender: &str) -> Option<&'static str> {
    match gender {
        "male" => Some("Female"),
        "female" => Some("Male"),
        _ => None,
    }
}

/// Stable descending sort by primary score; score-absent entries sink below
/// every scored one while keeping their fetch order among themselves.
fn rank_matches(matches: &mut [MatchResult]) {
    matches.sort_by(|left, right| match (left.primary_score(), right.primary_score()) {
        (Some(l), Some(r)) => r.cmp(&l),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
