//! Completion stage: send the extraction prompt to a chat-completion model.
//!
//! This module is intentionally thin; all prompt text lives in
//! [`crate::prompts`]. What lives here is the call itself: the
//! [`CompletionClient`] seam, the adapter onto an `edgequake_llm` provider,
//! and the timeout/retry loop around a single request.
//!
//! ## Retry Strategy
//!
//! By default a document gets exactly one attempt (`max_retries = 0`). When
//! retries are enabled the wait doubles after each failure
//! (`retry_backoff_ms * 2^attempt`), so with 500 ms base and 3 retries the
//! sequence is 500 ms → 1 s → 2 s. A single wait never exceeds
//! [`MAX_BACKOFF_MS`].

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::prompts::SYSTEM_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Upper bound on a single retry wait.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Error type returned by [`CompletionClient`] implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// One chat-completion request: a system turn and a user turn.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// The model's reply plus token usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Anything that can answer a [`CompletionRequest`].
///
/// The library talks to models only through this trait, so tests and
/// embedders can substitute a canned or caching client for the real
/// provider. Implementations must be `Send + Sync`; documents may be
/// processed concurrently.
pub trait CompletionClient: Send + Sync {
    fn complete<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> BoxFuture<'a, Result<Completion, BoxError>>;

    /// Short label used in log lines.
    fn label(&self) -> &str {
        "custom"
    }
}

/// [`CompletionClient`] backed by an `edgequake_llm` provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    label: String,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, label: impl Into<String>) -> Self {
        Self {
            provider,
            label: label.into(),
        }
    }
}

impl CompletionClient for ProviderClient {
    fn complete<'a>(
        &'a self,
        request: CompletionRequest<'a>,
    ) -> BoxFuture<'a, Result<Completion, BoxError>> {
        Box::pin(async move {
            let messages = vec![
                ChatMessage::system(request.system),
                ChatMessage::user(request.prompt),
            ];
            let options = CompletionOptions {
                temperature: Some(request.temperature),
                max_tokens: Some(request.max_tokens),
                ..Default::default()
            };

            let response = self
                .provider
                .chat(&messages, Some(&options))
                .await
                .map_err(|e| BoxError::from(e.to_string()))?;

            Ok::<_, BoxError>(Completion {
                text: response.content,
                prompt_tokens: response.prompt_tokens as usize,
                completion_tokens: response.completion_tokens as usize,
            })
        })
    }

    fn label(&self) -> &str {
        &self.label
    }
}

enum LastFailure {
    Timeout,
    Api(String),
}

/// Send `prompt` to the model and return its whitespace-trimmed reply.
///
/// Uses the configured system prompt (or [`SYSTEM_PROMPT`]), temperature and
/// output bound. Each attempt is limited by `api_timeout_secs` when non-zero.
///
/// # Errors
/// [`ScrapeError::ApiTimeout`] if the final attempt timed out, otherwise
/// [`ScrapeError::LlmApiError`] carrying the last provider error.
pub async fn request_completion(
    client: &dyn CompletionClient,
    prompt: &str,
    config: &ScrapeConfig,
) -> Result<Completion, ScrapeError> {
    let request = build_request(prompt, config);
    let start = Instant::now();
    let mut last: Option<LastFailure> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "{}: retry {}/{} after {}ms",
                client.label(),
                attempt,
                config.max_retries,
                backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let call = client.complete(request);
        let outcome = if config.api_timeout_secs > 0 {
            match timeout(Duration::from_secs(config.api_timeout_secs), call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(
                        "{}: attempt {} timed out after {}s",
                        client.label(),
                        attempt + 1,
                        config.api_timeout_secs
                    );
                    last = Some(LastFailure::Timeout);
                    continue;
                }
            }
        } else {
            call.await
        };

        match outcome {
            Ok(mut completion) => {
                completion.text = completion.text.trim().to_string();
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    client.label(),
                    completion.prompt_tokens,
                    completion.completion_tokens,
                    start.elapsed()
                );
                return Ok(completion);
            }
            Err(e) => {
                warn!("{}: attempt {} failed: {}", client.label(), attempt + 1, e);
                last = Some(LastFailure::Api(e.to_string()));
            }
        }
    }

    Err(match last {
        Some(LastFailure::Timeout) => ScrapeError::ApiTimeout {
            secs: config.api_timeout_secs,
        },
        Some(LastFailure::Api(message)) => ScrapeError::LlmApiError {
            attempts: config.max_retries.saturating_add(1),
            message,
        },
        None => ScrapeError::Internal("completion loop made no attempts".into()),
    })
}

/// Wait before retry `attempt` (1-based): `base * 2^(attempt-1)`, saturating, capped.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    let factor = 2u64.checked_pow(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    base.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

fn build_request<'a>(prompt: &'a str, config: &'a ScrapeConfig) -> CompletionRequest<'a> {
    CompletionRequest {
        system: config.system_prompt.as_deref().unwrap_or(SYSTEM_PROMPT),
        prompt,
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    }
}
