//! Wizard controller and per-session state
//!
//! The controller holds the shared, read-only collaborators (question bank,
//! generation client, refinement settings). Everything that changes during
//! an interview lives in a [`WizardSession`] owned by the caller and passed
//! into every operation. Every operation is dispatched through
//! [`transition`], so the session can never hold a contradictory state.

use pagewright_agent::GenerationClient;
use pagewright_core::{
    retry_transient, Asset, GenerationFailure, PagewrightConfig, PagewrightError, QuestionSpec,
    Result, RetryPolicy,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::briefing::Briefing;
use crate::document::GeneratedDocument;
use crate::prompt::{request_fingerprint, synthesize};
use crate::question_bank::QuestionBank;
use crate::refinement::{RefinementCoordinator, RefinementOutcome};
use crate::sanitizer;
use crate::state_machine::{transition, Event, WizardState};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Mutable state of one interview
#[derive(Debug, Clone)]
pub struct WizardSession {
    id: Uuid,
    state: WizardState,
    briefing: Briefing,
    document: Option<GeneratedDocument>,
    last_error: Option<String>,
}

impl WizardSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: WizardState::NotStarted,
            briefing: Briefing::new(),
            document: None,
            last_error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn briefing(&self) -> &Briefing {
        &self.briefing
    }

    /// Current artifact, if generation has succeeded
    pub fn document(&self) -> Option<&GeneratedDocument> {
        self.document.as_ref()
    }

    /// Message of the most recent failed operation, cleared on success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

/// A session shared between tasks, admitting one operation at a time
///
/// A second caller is turned away with [`PagewrightError::Busy`] instead of
/// waiting behind the first.
#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<WizardSession>>,
}

impl SharedSession {
    pub fn new(session: WizardSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Exclusive access for one operation, or `Busy`
    pub fn try_acquire(&self) -> Result<OwnedMutexGuard<WizardSession>> {
        self.inner.clone().try_lock_owned().map_err(|_| {
            warn!("Rejected wizard operation: session is busy");
            PagewrightError::Busy
        })
    }

    /// True while some caller holds the session
    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }

    /// Copy of the session once it is free
    pub async fn snapshot(&self) -> WizardSession {
        self.inner.lock().await.clone()
    }
}

impl Default for SharedSession {
    fn default() -> Self {
        Self::new(WizardSession::new())
    }
}

const CANCELLED_MESSAGE: &str = "generation cancelled";

/// Moves a session out of `Generating` if the generation future is dropped
///
/// The briefing is kept; the session lands in `Error` so the caller can
/// retry or edit the answers.
struct CancelGuard<'a> {
    session: &'a mut WizardSession,
    question_count: u32,
    armed: bool,
}

impl<'a> CancelGuard<'a> {
    fn new(session: &'a mut WizardSession, question_count: u32) -> Self {
        Self {
            session,
            question_count,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let event = Event::GenerationFailed {
            message: CANCELLED_MESSAGE.to_string(),
        };
        if let Ok(next) = transition(&self.session.state, event, self.question_count) {
            warn!(
                "Session {}: generation dropped before completion",
                self.session.id
            );
            self.session.state = next;
            self.session.last_error = Some(CANCELLED_MESSAGE.to_string());
        }
    }
}

/// Orchestrates interview, generation and refinement for sessions
#[derive(Clone)]
pub struct WizardController {
    bank: QuestionBank,
    client: Arc<dyn GenerationClient>,
    refiner: RefinementCoordinator,
    retry: RetryPolicy,
    timeout: Duration,
}

impl WizardController {
    /// Create a controller with default retry, timeout and asset limits
    pub fn new(bank: QuestionBank, client: Arc<dyn GenerationClient>) -> Self {
        Self {
            bank,
            client,
            refiner: RefinementCoordinator::default(),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create a controller from configuration
    pub fn from_config(config: &PagewrightConfig, client: Arc<dyn GenerationClient>) -> Result<Self> {
        let bank = QuestionBank::from_config(&config.wizard)?;
        Ok(Self::new(bank, client)
            .with_retry_policy(config.retry.policy())
            .with_timeout(config.generation.timeout())
            .with_max_asset_bytes(config.assets.max_bytes))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Upper bound for each generation attempt
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_asset_bytes(mut self, max_bytes: usize) -> Self {
        self.refiner = RefinementCoordinator::new(max_bytes);
        self
    }

    pub fn question_bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn new_session(&self) -> WizardSession {
        let session = WizardSession::new();
        debug!("Created wizard session {}", session.id);
        session
    }

    /// Question shown in the current `Asking` state
    pub fn current_question(&self, session: &WizardSession) -> Option<&QuestionSpec> {
        session.state.step().and_then(|step| self.bank.get(step))
    }

    /// `(step, total)` while asking
    pub fn progress(&self, session: &WizardSession) -> Option<(u32, u32)> {
        session.state.step().map(|step| (step, self.bank.count()))
    }

    /// Begin the interview at question 1
    pub fn start(&self, session: &mut WizardSession) -> Result<()> {
        self.apply(session, Event::Start)
    }

    /// Record the answer for the current question (overwrites)
    pub fn answer(&self, session: &mut WizardSession, step: u32, text: impl Into<String>) -> Result<()> {
        self.apply(session, Event::Answer { step })?;
        session.briefing.record(&self.bank, step, text)
    }

    /// Advance to the next question, or to review after the last one
    pub fn next(&self, session: &mut WizardSession) -> Result<()> {
        let step = session.state.step();
        let question = step.and_then(|step| self.bank.get(step));

        let answered = match question {
            Some(q) => !q.required || !session.briefing.answer(q.id).trim().is_empty(),
            None => false,
        };

        self.apply(session, Event::Next { answered })?;

        // Optional questions left blank still get an entry
        if let Some(q) = question {
            if !session.briefing.has_answer(q.id) {
                session.briefing.record(&self.bank, q.id, "")?;
            }
        }
        Ok(())
    }

    /// Return to the previous question
    pub fn back(&self, session: &mut WizardSession) -> Result<()> {
        self.apply(session, Event::Back)
    }

    /// Leave review (or error) and restart at question 1 with answers kept
    pub fn edit_answers(&self, session: &mut WizardSession) -> Result<()> {
        self.apply(session, Event::EditAnswers)?;
        session.last_error = None;
        Ok(())
    }

    /// Synthesize, call the generation service, validate and store the result
    ///
    /// On failure the session moves to `Error` with the briefing intact, and
    /// `generate` may be called again to retry.
    pub async fn generate<'s>(&self, session: &'s mut WizardSession) -> Result<&'s GeneratedDocument> {
        // Validate the transition before doing any work
        transition(&session.state, Event::Generate, self.bank.count())
            .inspect_err(|e| warn!("Session {}: {}", session.id, e))?;

        let request = match synthesize(&self.bank, &session.briefing) {
            Ok(request) => request,
            Err(e) => {
                warn!("Session {}: {}", session.id, e);
                session.last_error = Some(e.to_string());
                return Err(e);
            }
        };
        let fingerprint = request_fingerprint(&request);

        self.apply(session, Event::Generate)?;
        info!(
            "Session {}: generating document (request {} chars, fingerprint {})",
            session.id,
            request.len(),
            &fingerprint[..12]
        );

        let result = {
            let guard = CancelGuard::new(session, self.bank.count());
            let result = self.call_and_sanitize(&request).await;
            guard.disarm();
            result
        };

        match result {
            Ok((raw_text, html)) => {
                let document =
                    GeneratedDocument::new(raw_text, html, session.briefing.clone(), fingerprint);
                self.apply(session, Event::GenerationSucceeded)?;
                session.last_error = None;
                info!(
                    "Session {}: document generated ({} bytes)",
                    session.id,
                    document.sanitized_html().len()
                );
                let stored: &GeneratedDocument = session.document.insert(document);
                Ok(stored)
            }
            Err(e) => {
                error!("Session {}: generation failed: {}", session.id, e);
                self.apply(
                    session,
                    Event::GenerationFailed {
                        message: e.to_string(),
                    },
                )?;
                session.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Inject assets into the current document
    ///
    /// An empty asset list returns the current document unchanged as
    /// [`RefinementOutcome::NoChangeRequested`]. On failure the previous
    /// document is kept and the error is returned.
    pub async fn request_refinement(
        &self,
        session: &mut WizardSession,
        assets: Vec<Asset>,
    ) -> Result<RefinementOutcome> {
        transition(&session.state, Event::Refine, self.bank.count())
            .inspect_err(|e| warn!("Session {}: {}", session.id, e))?;

        let current = session.document.clone().ok_or(PagewrightError::NoDocument)?;

        if assets.is_empty() {
            debug!("Session {}: refinement without assets, nothing to do", session.id);
            return Ok(RefinementOutcome::NoChangeRequested(current));
        }

        self.apply(session, Event::Refine)?;
        let result = self.refiner.refine(&current, &assets);
        self.apply(session, Event::RefinementFinished)?;

        match result {
            Ok(outcome) => {
                if let RefinementOutcome::Refined(document) = &outcome {
                    session.document = Some(document.clone());
                }
                session.last_error = None;
                Ok(outcome)
            }
            Err(e) => {
                warn!("Session {}: refinement failed: {}", session.id, e);
                session.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Discard answers, document and errors; valid from any state
    pub fn reset(&self, session: &mut WizardSession) {
        if self.apply(session, Event::Reset).is_err() {
            return;
        }
        session.briefing.clear();
        session.document = None;
        session.last_error = None;
        info!("Session {}: reset", session.id);
    }

    async fn call_and_sanitize(&self, request: &str) -> Result<(String, String)> {
        let raw_text = retry_transient("generation", &self.retry, |attempt| async move {
            debug!("Generation attempt {}", attempt);
            match tokio::time::timeout(self.timeout, self.client.complete(request)).await {
                Ok(Ok(text)) => Ok(text),
                Ok(Err(failure)) => Err(PagewrightError::Generation(failure)),
                Err(_) => Err(PagewrightError::Generation(GenerationFailure::Timeout)),
            }
        })
        .await?;

        let html = sanitizer::sanitize(&raw_text)?;
        Ok((raw_text, html))
    }

    fn apply(&self, session: &mut WizardSession, event: Event) -> Result<()> {
        match transition(&session.state, event, self.bank.count()) {
            Ok(next) => {
                if next != session.state {
                    info!("Session {}: {} -> {}", session.id, session.state, next);
                }
                session.state = next;
                Ok(())
            }
            Err(e) => {
                warn!("Session {}: {}", session.id, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pagewright_core::PlaceholderToken;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Replays scripted responses and counts calls
    struct ScriptedClient {
        responses: StdMutex<VecDeque<std::result::Result<String, GenerationFailure>>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(responses: Vec<std::result::Result<String, GenerationFailure>>) -> Arc<Self> {
            Arc::new(Self {
                responses: StdMutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn complete(&self, _request: &str) -> std::result::Result<String, GenerationFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationFailure::Unknown("script exhausted".to_string())))
        }
    }

    /// Never answers before the timeout
    struct HangingClient;

    #[async_trait]
    impl GenerationClient for HangingClient {
        async fn complete(&self, _request: &str) -> std::result::Result<String, GenerationFailure> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    fn valid_page() -> String {
        format!(
            "<!DOCTYPE html><html><head><title>Acme Bakery</title></head><body>\
             <img src=\"{}\"><img src=\"{}\"></body></html>",
            PlaceholderToken::LOGO,
            PlaceholderToken::HERO_IMAGE
        )
    }

    fn controller(client: Arc<dyn GenerationClient>) -> WizardController {
        WizardController::new(QuestionBank::landing_page(), client).with_retry_policy(
            RetryPolicy::new(3, Duration::ZERO, Duration::ZERO),
        )
    }

    fn answer_all(ctrl: &WizardController, session: &mut WizardSession) {
        ctrl.start(session).unwrap();
        for step in 1..=ctrl.question_bank().count() {
            ctrl.answer(session, step, format!("answer {}", step)).unwrap();
            ctrl.next(session).unwrap();
        }
        assert_eq!(session.state(), &WizardState::Review);
    }

    #[test]
    fn test_start_and_progress() {
        let ctrl = controller(ScriptedClient::new(vec![]));
        let mut session = ctrl.new_session();

        assert!(ctrl.current_question(&session).is_none());
        ctrl.start(&mut session).unwrap();
        assert_eq!(ctrl.progress(&session), Some((1, 7)));
        assert_eq!(ctrl.current_question(&session).unwrap().id, 1);
        assert!(session.briefing().is_empty());

        assert!(matches!(
            ctrl.start(&mut session),
            Err(PagewrightError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_answer_must_match_current_step() {
        let ctrl = controller(ScriptedClient::new(vec![]));
        let mut session = ctrl.new_session();
        ctrl.start(&mut session).unwrap();

        assert!(ctrl.answer(&mut session, 2, "too early").is_err());
        assert!(!session.briefing().has_answer(2));

        ctrl.answer(&mut session, 1, "rustic").unwrap();
        ctrl.answer(&mut session, 1, "modern").unwrap();
        assert_eq!(session.briefing().answer(1), "modern");
        assert_eq!(session.state(), &WizardState::Asking { step: 1 });
    }

    #[test]
    fn test_next_blocks_blank_required_answer() {
        let ctrl = controller(ScriptedClient::new(vec![]));
        let mut session = ctrl.new_session();
        ctrl.start(&mut session).unwrap();

        assert!(matches!(
            ctrl.next(&mut session),
            Err(PagewrightError::AnswerRequired { step: 1 })
        ));
        ctrl.answer(&mut session, 1, "   ").unwrap();
        assert!(ctrl.next(&mut session).is_err());
        assert_eq!(session.state(), &WizardState::Asking { step: 1 });
    }

    #[test]
    fn test_optional_question_can_be_skipped() {
        let bank = QuestionBank::from_specs(vec![
            QuestionSpec::new(1, "Business name?", "", "Content"),
            QuestionSpec::new(2, "Slogan?", "", "Content").optional(),
        ])
        .unwrap();
        let ctrl = WizardController::new(bank, ScriptedClient::new(vec![]));
        let mut session = ctrl.new_session();

        ctrl.start(&mut session).unwrap();
        ctrl.answer(&mut session, 1, "Acme Bakery").unwrap();
        ctrl.next(&mut session).unwrap();
        ctrl.next(&mut session).unwrap();

        assert_eq!(session.state(), &WizardState::Review);
        assert!(session.briefing().has_answer(2));
        assert_eq!(session.briefing().answer(2), "");
    }

    #[test]
    fn test_back_then_next_preserves_answers() {
        let ctrl = controller(ScriptedClient::new(vec![]));
        let mut session = ctrl.new_session();
        ctrl.start(&mut session).unwrap();
        ctrl.answer(&mut session, 1, "rustic").unwrap();
        ctrl.next(&mut session).unwrap();
        ctrl.answer(&mut session, 2, "green and cream").unwrap();

        assert!(ctrl.back(&mut session).is_ok());
        assert_eq!(session.state(), &WizardState::Asking { step: 1 });
        assert!(ctrl.back(&mut session).is_err());

        ctrl.next(&mut session).unwrap();
        assert_eq!(session.state(), &WizardState::Asking { step: 2 });
        assert_eq!(session.briefing().answer(1), "rustic");
        assert_eq!(session.briefing().answer(2), "green and cream");
    }

    #[test]
    fn test_edit_answers_keeps_briefing() {
        let ctrl = controller(ScriptedClient::new(vec![]));
        let mut session = ctrl.new_session();
        answer_all(&ctrl, &mut session);

        ctrl.edit_answers(&mut session).unwrap();
        assert_eq!(session.state(), &WizardState::Asking { step: 1 });
        assert_eq!(session.briefing().answer(7), "answer 7");
    }

    #[tokio::test]
    async fn test_generate_success() {
        let client = ScriptedClient::new(vec![Ok(format!("```html\n{}\n```", valid_page()))]);
        let ctrl = controller(client.clone());
        let mut session = ctrl.new_session();
        answer_all(&ctrl, &mut session);

        let document = ctrl.generate(&mut session).await.unwrap();
        assert_eq!(document.sanitized_html(), valid_page());
        assert_eq!(document.revision(), 0);
        assert_eq!(document.source_briefing_snapshot().answer(3), "answer 3");
        assert_eq!(session.state(), &WizardState::Generated);
        assert!(session.last_error().is_none());
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_generate_requires_review() {
        let client = ScriptedClient::new(vec![Ok(valid_page())]);
        let ctrl = controller(client.clone());
        let mut session = ctrl.new_session();
        ctrl.start(&mut session).unwrap();

        let err = ctrl.generate(&mut session).await.unwrap_err();
        assert!(matches!(err, PagewrightError::InvalidTransition { .. }));
        assert_eq!(session.state(), &WizardState::Asking { step: 1 });
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_transient_failures_retried() {
        let client = ScriptedClient::new(vec![
            Err(GenerationFailure::ServiceUnavailable),
            Err(GenerationFailure::QuotaExceeded),
            Ok(valid_page()),
        ]);
        let ctrl = controller(client.clone());
        let mut session = ctrl.new_session();
        answer_all(&ctrl, &mut session);

        assert!(ctrl.generate(&mut session).await.is_ok());
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_invalid_output_moves_to_error_and_keeps_briefing() {
        let client = ScriptedClient::new(vec![
            Ok("Sorry, I can't help with that.".to_string()),
            Ok(valid_page()),
        ]);
        let ctrl = controller(client.clone());
        let mut session = ctrl.new_session();
        answer_all(&ctrl, &mut session);

        let err = ctrl.generate(&mut session).await.unwrap_err();
        assert!(matches!(err, PagewrightError::InvalidOutput(_)));
        assert!(matches!(session.state(), WizardState::Error { .. }));
        assert!(session.document().is_none());
        assert!(session.last_error().is_some());
        assert_eq!(session.briefing().len(), 7);
        assert_eq!(client.calls(), 1);

        // Retry straight from Error
        ctrl.generate(&mut session).await.unwrap();
        assert_eq!(session.state(), &WizardState::Generated);
        assert!(session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_edit_answers_clears_error_message() {
        let client = ScriptedClient::new(vec![Ok("<p>partial</p>".to_string())]);
        let ctrl = controller(client);
        let mut session = ctrl.new_session();
        answer_all(&ctrl, &mut session);

        assert!(ctrl.generate(&mut session).await.is_err());
        assert!(session.last_error().is_some());

        ctrl.edit_answers(&mut session).unwrap();
        assert!(session.last_error().is_none());
        assert_eq!(session.briefing().len(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_generation_lands_in_error() {
        let ctrl = WizardController::new(QuestionBank::landing_page(), Arc::new(HangingClient))
            .with_retry_policy(RetryPolicy::no_retry());
        let mut session = ctrl.new_session();
        answer_all(&ctrl, &mut session);

        let cancelled =
            tokio::time::timeout(Duration::from_secs(1), ctrl.generate(&mut session)).await;
        assert!(cancelled.is_err());

        assert!(matches!(
            session.state(),
            WizardState::Error { message } if message == "generation cancelled"
        ));
        assert_eq!(session.last_error(), Some("generation cancelled"));
        assert_eq!(session.briefing().len(), 7);
        ctrl.edit_answers(&mut session).unwrap();
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let client = ScriptedClient::new(vec![Err(GenerationFailure::Unknown(
            "400 Bad Request".to_string(),
        ))]);
        let ctrl = controller(client.clone());
        let mut session = ctrl.new_session();
        answer_all(&ctrl, &mut session);

        assert!(ctrl.generate(&mut session).await.is_err());
        assert_eq!(client.calls(), 1);
        assert!(matches!(
            session.state(),
            WizardState::Error { message } if message.contains("400")
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_service_times_out() {
        let ctrl = WizardController::new(QuestionBank::landing_page(), Arc::new(HangingClient))
            .with_retry_policy(RetryPolicy::no_retry())
            .with_timeout(Duration::from_secs(5));
        let mut session = ctrl.new_session();
        answer_all(&ctrl, &mut session);

        let err = ctrl.generate(&mut session).await.unwrap_err();
        assert!(matches!(
            err,
            PagewrightError::Generation(GenerationFailure::Timeout)
        ));
        assert!(matches!(session.state(), WizardState::Error { .. }));
    }

    #[tokio::test]
    async fn test_refinement_requires_generated() {
        let client = ScriptedClient::new(vec![]);
        let ctrl = controller(client);
        let mut session = ctrl.new_session();
        answer_all(&ctrl, &mut session);

        let err = ctrl.request_refinement(&mut session, vec![]).await.unwrap_err();
        assert!(matches!(err, PagewrightError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_empty_refinement_is_no_op() {
        let client = ScriptedClient::new(vec![Ok(valid_page())]);
        let ctrl = controller(client.clone());
        let mut session = ctrl.new_session();
        answer_all(&ctrl, &mut session);
        ctrl.generate(&mut session).await.unwrap();

        let outcome = ctrl.request_refinement(&mut session, vec![]).await.unwrap();
        assert!(matches!(outcome, RefinementOutcome::NoChangeRequested(_)));
        assert_eq!(outcome.document().sanitized_html(), valid_page());
        assert_eq!(session.state(), &WizardState::Generated);
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_refinement_keeps_document() {
        let client = ScriptedClient::new(vec![Ok(valid_page())]);
        let ctrl = controller(client);
        let mut session = ctrl.new_session();
        answer_all(&ctrl, &mut session);
        ctrl.generate(&mut session).await.unwrap();

        let bad = Asset::logo(b"GIF89a".to_vec(), "image/gif");
        let err = ctrl.request_refinement(&mut session, vec![bad]).await.unwrap_err();
        assert!(matches!(err, PagewrightError::InvalidAsset(_)));
        assert_eq!(session.state(), &WizardState::Generated);
        assert_eq!(session.document().unwrap().sanitized_html(), valid_page());
        assert!(session.last_error().is_some());
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let client = ScriptedClient::new(vec![Ok(valid_page())]);
        let ctrl = controller(client);
        let mut session = ctrl.new_session();
        answer_all(&ctrl, &mut session);
        ctrl.generate(&mut session).await.unwrap();

        ctrl.reset(&mut session);
        assert_eq!(session.state(), &WizardState::NotStarted);
        assert!(session.briefing().is_empty());
        assert!(session.document().is_none());
        assert!(session.last_error().is_none());

        // A fresh interview can begin
        ctrl.start(&mut session).unwrap();
    }

    #[tokio::test]
    async fn test_shared_session_rejects_concurrent_operation() {
        let shared = SharedSession::default();
        assert!(!shared.is_busy());

        let guard = shared.try_acquire().unwrap();
        assert!(shared.is_busy());
        assert!(matches!(shared.try_acquire(), Err(PagewrightError::Busy)));

        drop(guard);
        assert!(!shared.is_busy());
        assert!(shared.try_acquire().is_ok());
    }
}
