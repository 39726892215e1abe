//! Per-user interview sessions.
//!
//! A session owns its transcript and topic bookkeeping and is only ever
//! mutated through its own methods. Sessions live in the in-process
//! `SessionStore`; an interview does not survive a restart, by design.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use tokio::sync::Mutex as AsyncMutex;
use tracing::info;

use crate::errors::AppError;
use crate::interview::prompts;
use crate::interview::topics::{TopicChoice, TopicTracker};
use crate::llm_client::{ChatApi, ChatMessage};

/// Questions asked per interview before it completes.
pub const MAX_QUESTIONS: u32 = 10;

/// What the caller gets back from an answer submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionReply {
    Question(String),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Active,
    Completed,
}

#[derive(Debug)]
pub struct InterviewSession {
    transcript: Vec<ChatMessage>,
    covered: HashSet<String>,
    question_count: u32,
    pending_topic: Option<String>,
    phase: Phase,
    tracker: TopicTracker,
}

impl Default for InterviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl InterviewSession {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            covered: HashSet::new(),
            question_count: 0,
            pending_topic: None,
            phase: Phase::Active,
            tracker: TopicTracker::default(),
        }
    }

    /// Asks the opening question of a fresh interview.
    pub async fn start(&mut self, llm: &dyn ChatApi) -> Result<String, AppError> {
        self.next_question(llm).await
    }

    /// Records the user's answer and either asks the next question or
    /// completes the interview once the question budget is spent.
    pub async fn submit_answer(
        &mut self,
        llm: &dyn ChatApi,
        answer: &str,
    ) -> Result<SessionReply, AppError> {
        if self.phase == Phase::Completed {
            return Err(AppError::InvalidSession(
                "Interview already completed".to_string(),
            ));
        }

        self.transcript.push(ChatMessage::user(answer));

        // At most one topic is pending between question and answer; the
        // answer always moves it into the covered set before anything else.
        if let Some(topic) = self.pending_topic.take() {
            self.covered.insert(topic);
        }

        if self.question_count >= MAX_QUESTIONS {
            self.phase = Phase::Completed;
            return Ok(SessionReply::Completed);
        }

        let question = self.next_question(llm).await?;
        Ok(SessionReply::Question(question))
    }

    /// Selects the next topic and phrases the question: required topics get
    /// the fixed template, open topics are phrased by the model. A model
    /// failure here propagates, since with no question there is no turn to take.
    async fn next_question(&mut self, llm: &dyn ChatApi) -> Result<String, AppError> {
        let question = match self.tracker.next_topic(&self.covered) {
            TopicChoice::Required(topic) => {
                self.pending_topic = Some(topic.to_string());
                prompts::required_topic_question(topic)
            }
            TopicChoice::Open(remaining) => {
                self.pending_topic = None;
                let prompt = prompts::build_question_prompt(&self.transcript, &remaining);
                llm.complete(&[ChatMessage::system(prompt)], false)
                    .await
                    .map_err(|e| AppError::Llm(format!("Interview question call failed: {e}")))?
            }
        };

        self.transcript.push(ChatMessage::assistant(question.clone()));
        self.question_count += 1;
        Ok(question)
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn covered_topics(&self) -> &HashSet<String> {
        &self.covered
    }

    pub fn pending_topic(&self) -> Option<&str> {
        self.pending_topic.as_deref()
    }

    pub fn questions_asked(&self) -> u32 {
        self.question_count
    }

    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }
}

/// In-process session registry with an explicit lifecycle: create,
/// fetch-or-fail, remove. Each session sits behind its own async lock so
/// concurrent submits for one user id serialize instead of racing.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

pub type SessionHandle = std::sync::Arc<AsyncMutex<InterviewSession>>;

impl SessionStore {
    /// Creates a fresh session for the user, replacing any existing one.
    pub fn create(&self, user_id: Uuid) -> SessionHandle {
        let handle = SessionHandle::new(AsyncMutex::new(InterviewSession::new()));
        let mut sessions = self.lock();
        if sessions.insert(user_id, handle.clone()).is_some() {
            info!("Replacing existing interview session for user {user_id}");
        }
        handle
    }

    pub fn get(&self, user_id: Uuid) -> Result<SessionHandle, AppError> {
        self.lock().get(&user_id).cloned().ok_or_else(|| {
            AppError::InvalidSession(format!("No active interview session for user {user_id}"))
        })
    }

    pub fn remove(&self, user_id: Uuid) -> Option<SessionHandle> {
        self.lock().remove(&user_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedChat;
    use crate::llm_client::ChatError;

    fn phrased_chat() -> impl ChatApi {
        ScriptedChat(|messages: &[ChatMessage], _json| {
            assert_eq!(messages.len(), 1);
            Ok("Tell me about a hobby you love?".to_string())
        })
    }

    #[tokio::test]
    async fn test_start_asks_canned_name_question() {
        let llm = phrased_chat();
        let mut session = InterviewSession::new();

        let question = session.start(&llm).await.unwrap();
        assert_eq!(question, "What is your name?");
        assert_eq!(session.pending_topic(), Some("Name"));
        assert_eq!(session.questions_asked(), 1);
        assert_eq!(session.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_moves_exactly_one_pending_topic_to_covered() {
        let llm = phrased_chat();
        let mut session = InterviewSession::new();
        session.start(&llm).await.unwrap();

        let reply = session.submit_answer(&llm, "Alice").await.unwrap();
        assert_eq!(
            reply,
            SessionReply::Question("What is your gender?".to_string())
        );
        assert_eq!(session.covered_topics().len(), 1);
        assert!(session.covered_topics().contains("Name"));
        assert_eq!(session.pending_topic(), Some("Gender"));
    }

    #[tokio::test]
    async fn test_open_questions_are_model_phrased_after_required() {
        let llm = phrased_chat();
        let mut session = InterviewSession::new();
        session.start(&llm).await.unwrap();

        for answer in ["Alice", "Female", "Heterosexual"] {
            session.submit_answer(&llm, answer).await.unwrap();
        }
        // Fourth answer covers "Age Group"; the next question is open-topic.
        let reply = session.submit_answer(&llm, "25-34").await.unwrap();
        assert_eq!(
            reply,
            SessionReply::Question("Tell me about a hobby you love?".to_string())
        );
        assert_eq!(session.covered_topics().len(), 4);
        assert_eq!(session.pending_topic(), None);
    }

    #[tokio::test]
    async fn test_completes_after_ten_round_trips_then_rejects() {
        let llm = phrased_chat();
        let mut session = InterviewSession::new();
        session.start(&llm).await.unwrap();

        for round in 1..MAX_QUESTIONS {
            let before = session.covered_topics().len();
            let reply = session.submit_answer(&llm, "answer").await.unwrap();
            assert!(matches!(reply, SessionReply::Question(_)), "round {round}");
            // Never more than one topic marked per call.
            assert!(session.covered_topics().len() <= before + 1);
        }
        assert_eq!(session.questions_asked(), MAX_QUESTIONS);

        let reply = session.submit_answer(&llm, "final answer").await.unwrap();
        assert_eq!(reply, SessionReply::Completed);
        assert!(session.is_completed());

        let err = session.submit_answer(&llm, "too late").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidSession(_)));
    }

    #[tokio::test]
    async fn test_model_failure_propagates_in_question_path() {
        let failing = ScriptedChat(|_m: &[ChatMessage], _j| Err(ChatError::Timeout));
        let mut session = InterviewSession::new();
        session.start(&failing).await.unwrap(); // canned, no model call

        for answer in ["Alice", "Female", "Heterosexual"] {
            session.submit_answer(&failing, answer).await.unwrap();
        }
        let err = session.submit_answer(&failing, "25-34").await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_session_store_lifecycle() {
        let store = SessionStore::default();
        let user_id = Uuid::new_v4();

        assert!(store.get(user_id).is_err());

        store.create(user_id);
        assert!(store.get(user_id).is_ok());

        store.remove(user_id);
        let err = store.get(user_id).unwrap_err();
        assert!(matches!(err, AppError::InvalidSession(_)));
    }
}
