//! Streamer and speech selection from configured credentials.

use std::sync::Arc;
#[cfg(any(feature = "provider-gemini", feature = "provider-openai"))]
use std::time::Duration;

use mprovider::{
    FallbackHooks, ProviderError, ProviderId, ResponseStreamer, SecureCredentialManager,
    SpeechSynthesizer, UnconfiguredStreamer,
};

use crate::AppConfig;

/// The streamer every turn goes through, plus speech when a provider offers it.
#[derive(Clone)]
pub struct ProviderStack {
    pub streamer: Arc<dyn ResponseStreamer>,
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl ProviderStack {
    pub fn unconfigured() -> Self {
        Self {
            streamer: Arc::new(UnconfiguredStreamer),
            speech: None,
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.streamer.id()
    }
}

/// OpenAI wins when its key is present, then Gemini, else the unconfigured streamer.
///
/// Speech is only available through Gemini.
pub fn build_providers(
    config: &AppConfig,
    hooks: Arc<dyn FallbackHooks>,
) -> Result<ProviderStack, ProviderError> {
    let credentials = Arc::new(SecureCredentialManager::new());
    let gemini = build_gemini(config, &credentials, hooks)?;
    let openai = build_openai(config, &credentials)?;

    let speech = gemini.as_ref().and_then(|gemini| gemini.speech.clone());
    let streamer = match openai.or(gemini.map(|gemini| gemini.streamer)) {
        Some(streamer) => streamer,
        None => {
            tracing::warn!("no provider credentials configured; chat turns will fail");
            Arc::new(UnconfiguredStreamer)
        }
    };

    tracing::info!(provider = %streamer.id(), speech = speech.is_some(), "provider selected");
    Ok(ProviderStack { streamer, speech })
}

/// Only connection setup is bounded; a response body may stream for as long as
/// the provider keeps it open.
#[cfg(any(feature = "provider-gemini", feature = "provider-openai"))]
fn http_client(connect_timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))
}

#[cfg(feature = "provider-gemini")]
fn build_gemini(
    config: &AppConfig,
    credentials: &Arc<SecureCredentialManager>,
    hooks: Arc<dyn FallbackHooks>,
) -> Result<Option<ProviderStack>, ProviderError> {
    use mprovider::adapters::gemini::{GeminiHttpTransport, GeminiProvider};

    let Some(api_key) = &config.gemini_api_key else {
        return Ok(None);
    };

    credentials.set_api_key(ProviderId::Gemini, api_key.expose())?;
    let transport = Arc::new(GeminiHttpTransport::new(http_client(config.connect_timeout)?));
    let gemini = Arc::new(GeminiProvider::new(Arc::clone(credentials), transport).with_hooks(hooks));
    Ok(Some(ProviderStack {
        streamer: gemini.clone(),
        speech: Some(gemini),
    }))
}

#[cfg(not(feature = "provider-gemini"))]
fn build_gemini(
    config: &AppConfig,
    _credentials: &Arc<SecureCredentialManager>,
    _hooks: Arc<dyn FallbackHooks>,
) -> Result<Option<ProviderStack>, ProviderError> {
    if config.gemini_api_key.is_some() {
        tracing::warn!("Gemini key set but the provider-gemini feature is disabled");
    }
    Ok(None)
}

#[cfg(feature = "provider-openai")]
fn build_openai(
    config: &AppConfig,
    credentials: &Arc<SecureCredentialManager>,
) -> Result<Option<Arc<dyn ResponseStreamer>>, ProviderError> {
    use mprovider::adapters::openai::{OpenAiHttpTransport, OpenAiProvider};

    let Some(api_key) = &config.openai_api_key else {
        return Ok(None);
    };

    credentials.set_openai_api_key(api_key.expose())?;
    let transport = Arc::new(OpenAiHttpTransport::new(http_client(config.connect_timeout)?));
    Ok(Some(Arc::new(OpenAiProvider::new(
        Arc::clone(credentials),
        transport,
    ))))
}

#[cfg(not(feature = "provider-openai"))]
fn build_openai(
    config: &AppConfig,
    _credentials: &Arc<SecureCredentialManager>,
) -> Result<Option<Arc<dyn ResponseStreamer>>, ProviderError> {
    if config.openai_api_key.is_some() {
        tracing::warn!("OpenAI key set but the provider-openai feature is disabled");
    }
    Ok(None)
}
