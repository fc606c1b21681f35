//! Per-query orchestration.
//!
//! One call to [`ConversationManager::handle`] walks the whole pipeline:
//! classify, retrieve context, route, build the prompt, invoke the chosen
//! backend (time-boxed), post-process, and persist the turn. Every path
//! ends in a reply with either a delivered or an explicitly failed status;
//! exactly one turn is persisted per query regardless of outcome.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Utc};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use pulse_core::{
    defaults, BackendId, CoachReply, Completion, CompletionBackend, ConversationTurn,
    PrivacySensitivity, Query, TurnStatus, TurnStore,
};
use pulse_inference::ModelRouter;

use crate::context::ContextRetriever;
use crate::intent::{classify, Classification};
use crate::postprocess::verify_reply;
use crate::prompt::build_prompt;

/// User-facing text for a sensitive query that cannot be served locally.
/// The query fails closed; it never escalates to a remote backend.
pub const PRIVACY_LOCKOUT_MESSAGE: &str =
    "This question involves sensitive health information, which is only ever \
     processed on your own machine. The local model is temporarily unavailable, \
     so the question was not sent anywhere. Please try again shortly.";

/// User-facing text when every permitted backend has been exhausted.
pub const UNAVAILABLE_MESSAGE: &str =
    "The coaching service is temporarily unavailable. Your question was not \
     answered; please try again shortly.";

/// Conversation manager configuration.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Time box for a single backend invocation; a timeout counts as a
    /// backend failure and triggers the fallback policy.
    pub invoke_timeout: Duration,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            invoke_timeout: Duration::from_secs(defaults::GEN_TIMEOUT_SECS),
        }
    }
}

/// Orchestrates one query end to end.
pub struct ConversationManager {
    retriever: ContextRetriever,
    router: ModelRouter,
    backends: HashMap<BackendId, Arc<dyn CompletionBackend>>,
    turns: Arc<dyn TurnStore>,
    config: ConversationConfig,
}

impl ConversationManager {
    pub fn new(
        retriever: ContextRetriever,
        router: ModelRouter,
        backends: HashMap<BackendId, Arc<dyn CompletionBackend>>,
        turns: Arc<dyn TurnStore>,
    ) -> Self {
        Self {
            retriever,
            router,
            backends,
            turns,
            config: ConversationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ConversationConfig) -> Self {
        self.config = config;
        self
    }

    /// Handle one query against the reference date `today`.
    ///
    /// Backend failures surface as a reply with a failed status and a
    /// human-readable reason, never as an error from this method; only the
    /// caller's own misuse (none here) would produce an `Err`.
    pub async fn handle(&self, query: &Query, today: NaiveDate) -> CoachReply {
        let start = Instant::now();

        // CLASSIFY
        let classification = classify(&query.text, today);

        // RETRIEVE_CONTEXT
        let bundle = self
            .retriever
            .retrieve(
                classification.intent,
                classification.date_scope,
                &query.text,
                &query.session_id,
                today,
            )
            .await;

        // ROUTE
        let primary = self.router.select(&classification.route);

        // BUILD_PROMPT
        let prompt = build_prompt(classification.intent, &bundle, &query.text);

        // INVOKE_BACKEND, with one fallback hop on failure or timeout.
        let outcome = self
            .invoke_with_fallback(primary, classification.route.privacy, &prompt)
            .await;

        // POSTPROCESS + PERSIST_TURN
        let reply = match outcome {
            Ok((backend, completion)) => {
                let processed =
                    verify_reply(&completion.text, &bundle, classification.confidence);
                let cost = self
                    .router
                    .cost_estimate(backend, completion.total_tokens());

                self.persist_turn(
                    query,
                    &classification,
                    Some(backend),
                    &completion.text,
                    completion.input_tokens,
                    completion.output_tokens,
                    cost,
                    TurnStatus::Delivered,
                )
                .await;

                info!(
                    subsystem = "engine",
                    op = "handle",
                    session_id = %query.session_id,
                    intent = %classification.intent,
                    backend = %backend,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Query delivered"
                );

                CoachReply {
                    text: completion.text,
                    intent: classification.intent,
                    confidence: processed.confidence,
                    citations: processed.citations,
                    backend: Some(backend),
                    status: TurnStatus::Delivered,
                }
            }
            Err(reason) => {
                let text = if classification.route.privacy == PrivacySensitivity::Sensitive {
                    PRIVACY_LOCKOUT_MESSAGE
                } else {
                    UNAVAILABLE_MESSAGE
                };

                self.persist_turn(
                    query,
                    &classification,
                    None,
                    text,
                    0,
                    0,
                    0.0,
                    TurnStatus::Failed(reason.clone()),
                )
                .await;

                warn!(
                    subsystem = "engine",
                    op = "handle",
                    session_id = %query.session_id,
                    intent = %classification.intent,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Query failed: {}",
                    reason
                );

                CoachReply {
                    text: text.to_string(),
                    intent: classification.intent,
                    confidence: 0.0,
                    citations: vec![],
                    backend: None,
                    status: TurnStatus::Failed(reason),
                }
            }
        };

        reply
    }

    /// Try the primary backend, then at most one fallback hop. Sensitive
    /// queries get no fallback: the router returns none and the failure
    /// propagates as a closed-off reason.
    async fn invoke_with_fallback(
        &self,
        primary: BackendId,
        privacy: PrivacySensitivity,
        prompt: &crate::prompt::Prompt,
    ) -> std::result::Result<(BackendId, Completion), String> {
        match self.invoke_one(primary, prompt).await {
            Ok(completion) => Ok((primary, completion)),
            Err(first_error) => {
                let Some(fallback) = self.router.fallback(primary, privacy) else {
                    return Err(format!("{} backend failed: {}", primary, first_error));
                };
                debug!(
                    subsystem = "engine",
                    op = "fallback",
                    backend = %fallback,
                    "Retrying on fallback backend"
                );
                match self.invoke_one(fallback, prompt).await {
                    Ok(completion) => Ok((fallback, completion)),
                    Err(second_error) => Err(format!(
                        "{} backend failed ({}), {} fallback failed ({})",
                        primary, first_error, fallback, second_error
                    )),
                }
            }
        }
    }

    async fn invoke_one(
        &self,
        id: BackendId,
        prompt: &crate::prompt::Prompt,
    ) -> std::result::Result<Completion, String> {
        let Some(backend) = self.backends.get(&id) else {
            return Err("backend not configured".to_string());
        };

        if !backend.is_available().await {
            return Err("backend unavailable".to_string());
        }

        match timeout(
            self.config.invoke_timeout,
            backend.complete(&prompt.system, &prompt.user),
        )
        .await
        {
            Ok(Ok(completion)) => Ok(completion),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "timed out after {}s",
                self.config.invoke_timeout.as_secs()
            )),
        }
    }

    /// Append the turn; a store failure is logged but never takes down a
    /// reply that is already in hand.
    #[allow(clippy::too_many_arguments)]
    async fn persist_turn(
        &self,
        query: &Query,
        classification: &Classification,
        backend: Option<BackendId>,
        response_text: &str,
        input_tokens: i64,
        output_tokens: i64,
        cost_usd: f64,
        status: TurnStatus,
    ) {
        let turn = ConversationTurn {
            id: Uuid::new_v4(),
            session_id: query.session_id.clone(),
            query_text: query.text.clone(),
            intent: classification.intent,
            backend,
            response_text: response_text.to_string(),
            input_tokens,
            output_tokens,
            cost_usd,
            status,
            created_at: Utc::now(),
        };

        if let Err(e) = self.turns.append_turn(&turn).await {
            error!(
                subsystem = "engine",
                op = "persist_turn",
                session_id = %query.session_id,
                "Failed to persist turn: {}",
                e
            );
        }
    }
}
