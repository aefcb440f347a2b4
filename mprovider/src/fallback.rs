//! Ordered model fallback ladder and its operational hook contract.
//!
//! A model is committed as soon as its stream yields a first item. Errors
//! raised before that point either advance the ladder (model-not-found and
//! bad-request classes) or stop it.

use std::future::{Future, poll_fn};
use std::pin::Pin;

use futures_core::Stream;

use crate::{ProviderError, ProviderId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLadder {
    models: Vec<String>,
}

impl ModelLadder {
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            models: models.into_iter().map(Into::into).collect(),
        }
    }

    /// Fastest model first, most stable last.
    pub fn gemini_default() -> Self {
        Self::new(["gemini-1.5-flash", "gemini-pro"])
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

pub trait FallbackHooks: Send + Sync {
    fn on_attempt_start(&self, _provider: ProviderId, _model: &str, _attempt: u32) {}

    fn on_fallback(
        &self,
        _provider: ProviderId,
        _model: &str,
        _attempt: u32,
        _error: &ProviderError,
    ) {
    }

    fn on_success(&self, _provider: ProviderId, _model: &str, _attempts: u32) {}

    fn on_failure(&self, _provider: ProviderId, _attempts: u32, _error: Option<&ProviderError>) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFallbackHooks;

impl FallbackHooks for NoopFallbackHooks {}

/// The model that produced output, its first item, and the remaining stream.
pub struct LadderCommit<T, S> {
    pub model: String,
    pub attempts: u32,
    pub first: Option<T>,
    pub rest: S,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderFailure {
    pub attempts: u32,
    pub last_error: Option<ProviderError>,
}

impl LadderFailure {
    pub fn friendly_message(&self) -> String {
        match &self.last_error {
            Some(error) => error.user_facing(),
            None => "Connection failed.".to_string(),
        }
    }
}

pub async fn open_committed<T, S, Open, OpenFuture>(
    provider: ProviderId,
    ladder: &ModelLadder,
    hooks: &dyn FallbackHooks,
    mut open: Open,
) -> Result<LadderCommit<T, S>, LadderFailure>
where
    S: Stream<Item = Result<T, ProviderError>> + Unpin,
    Open: FnMut(String) -> OpenFuture,
    OpenFuture: Future<Output = Result<S, ProviderError>>,
{
    let mut last_error = None;
    let mut attempts = 0;

    for model in ladder.models() {
        attempts += 1;
        hooks.on_attempt_start(provider, model, attempts);

        let outcome = match open(model.clone()).await {
            Ok(mut stream) => {
                let first = poll_fn(|cx| Pin::new(&mut stream).poll_next(cx)).await;
                match first {
                    Some(Ok(first)) => Ok((Some(first), stream)),
                    None => Ok((None, stream)),
                    Some(Err(error)) => Err(error),
                }
            }
            Err(error) => Err(error),
        };

        match outcome {
            Ok((first, rest)) => {
                hooks.on_success(provider, model, attempts);
                return Ok(LadderCommit {
                    model: model.clone(),
                    attempts,
                    first,
                    rest,
                });
            }
            Err(error) => {
                let advance = error.falls_back();
                if advance {
                    hooks.on_fallback(provider, model, attempts, &error);
                }
                last_error = Some(error);
                if !advance {
                    break;
                }
            }
        }
    }

    hooks.on_failure(provider, attempts, last_error.as_ref());
    Err(LadderFailure {
        attempts,
        last_error,
    })
}
