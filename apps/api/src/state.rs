use std::sync::Arc;

use crate::config::Config;
use crate::interview::session::SessionStore;
use crate::llm_client::ChatApi;
use crate::store::ProfileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn ChatApi>,
    pub store: Arc<dyn ProfileStore>,
    /// In-process interview sessions. Deliberately not persisted: a restart
    /// drops open interviews.
    pub sessions: Arc<SessionStore>,
    /// Runtime settings, kept available to handlers.
    #[allow(dead_code)]
    pub config: Config,
}
