//! Streaming generation and speech contracts.

use std::future::Future;
use std::pin::Pin;

use crate::{BoxedFragmentStream, GenerationRequest, ProviderError, ProviderId};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Produces a lazy fragment stream for one turn.
///
/// An `Err` means the request never reached a provider. Failures after that
/// point arrive in-band as an error fragment.
pub trait ResponseStreamer: Send + Sync {
    fn id(&self) -> ProviderId;

    fn stream_response<'a>(
        &'a self,
        request: GenerationRequest,
    ) -> ProviderFuture<'a, Result<BoxedFragmentStream<'a>, ProviderError>>;
}

/// Text-to-speech. `Ok(None)` means the provider produced no audio.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize<'a>(
        &'a self,
        text: &'a str,
    ) -> ProviderFuture<'a, Result<Option<String>, ProviderError>>;
}

/// Streamer used when no provider credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredStreamer;

impl ResponseStreamer for UnconfiguredStreamer {
    fn id(&self) -> ProviderId {
        ProviderId::Unconfigured
    }

    fn stream_response<'a>(
        &'a self,
        _request: GenerationRequest,
    ) -> ProviderFuture<'a, Result<BoxedFragmentStream<'a>, ProviderError>> {
        Box::pin(async { Err(ProviderError::unavailable("No AI Service configured.")) })
    }
}
