//! Gemini provider: image generation, laddered chat streaming, and speech.

use std::sync::Arc;

use async_stream::stream;
use futures_util::StreamExt;

use crate::fallback::{LadderCommit, open_committed};
use crate::prompts::system_instruction;
use crate::{
    BoxedFragmentStream, ChatMode, FallbackHooks, Fragment, GenerationRequest, ModelLadder,
    NoopFallbackHooks, ProviderError, ProviderFuture, ProviderId, ResponseStreamer, SecretString,
    SecureCredentialManager, SpeechSynthesizer, VecFragmentStream, replayable_history,
};

use super::transport::GeminiTransport;
use super::types::{GeminiContent, GeminiPart, GeminiRequest, GeminiRole, GeminiSpeechConfig};

pub const MAX_SPEECH_CHARS: usize = 4000;

const DEFAULT_IMAGE_TEXT: &str = "Here is your visualization.";

#[derive(Clone)]
pub struct GeminiProvider {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn GeminiTransport>,
    hooks: Arc<dyn FallbackHooks>,
    ladder: ModelLadder,
    image_model: String,
    speech_model: String,
    voice: String,
}

impl GeminiProvider {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn GeminiTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
            hooks: Arc::new(NoopFallbackHooks),
            ladder: ModelLadder::gemini_default(),
            image_model: "gemini-2.5-flash-image".to_string(),
            speech_model: "gemini-2.5-flash-preview-tts".to_string(),
            voice: "Kore".to_string(),
        }
    }

    pub fn with_ladder(mut self, ladder: ModelLadder) -> Self {
        self.ladder = ladder;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn FallbackHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn with_speech_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn ladder(&self) -> &ModelLadder {
        &self.ladder
    }

    /// Replayable history in Gemini turn format with a trailing user turn
    /// removed, followed by the new user turn.
    pub(crate) fn build_contents(&self, request: &GenerationRequest) -> Vec<GeminiContent> {
        let mut contents = replayable_history(&request.history)
            .map(GeminiContent::from)
            .collect::<Vec<_>>();

        if contents
            .last()
            .is_some_and(|content| content.role == GeminiRole::User)
        {
            contents.pop();
        }

        contents.push(GeminiContent::user(user_parts(request)));
        contents
    }

    async fn generate_image(
        &self,
        request: &GenerationRequest,
        instruction: String,
        api_key: SecretString,
    ) -> Fragment {
        self.hooks.on_attempt_start(ProviderId::Gemini, &self.image_model, 1);

        let image_request = GeminiRequest {
            model: self.image_model.clone(),
            system_instruction: Some(instruction),
            contents: vec![GeminiContent::user(user_parts(request))],
            speech: None,
        };

        match self.transport.generate(image_request, api_key).await {
            Ok(response) => {
                self.hooks.on_success(ProviderId::Gemini, &self.image_model, 1);
                let text = if response.text.is_empty() {
                    DEFAULT_IMAGE_TEXT.to_string()
                } else {
                    response.text.clone()
                };
                Fragment::text(text)
                    .with_image_url(response.image_data_url())
                    .finished()
            }
            Err(error) => {
                self.hooks.on_failure(ProviderId::Gemini, 1, Some(&error));
                Fragment::error(format!(
                    "Image Generation Error: {}. Try describing the image in Assistant mode.",
                    error.message
                ))
            }
        }
    }
}

fn user_parts(request: &GenerationRequest) -> Vec<GeminiPart> {
    let mut parts = Vec::with_capacity(request.attachments.len() + 1);
    if !request.input.is_empty() {
        parts.push(GeminiPart::Text(request.input.clone()));
    }
    parts.extend(request.attachments.iter().map(GeminiPart::from));
    parts
}

fn single_fragment<'a>(fragment: Fragment) -> BoxedFragmentStream<'a> {
    Box::pin(VecFragmentStream::new(vec![fragment]))
}

fn failure_fragment(friendly: &str) -> Fragment {
    Fragment::error(format!("\n\n**{friendly}**"))
}

impl ResponseStreamer for GeminiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn stream_response<'a>(
        &'a self,
        request: GenerationRequest,
    ) -> ProviderFuture<'a, Result<BoxedFragmentStream<'a>, ProviderError>> {
        Box::pin(async move {
            let api_key = self.credentials.require_api_key(ProviderId::Gemini)?;
            let instruction = system_instruction(request.mode);

            if request.mode == ChatMode::ImageGen {
                let fragment = self.generate_image(&request, instruction, api_key).await;
                return Ok(single_fragment(fragment));
            }

            let contents = self.build_contents(&request);
            let outcome = open_committed(
                ProviderId::Gemini,
                &self.ladder,
                self.hooks.as_ref(),
                |model| {
                    let attempt = GeminiRequest {
                        model,
                        system_instruction: Some(instruction.clone()),
                        contents: contents.clone(),
                        speech: None,
                    };
                    self.transport.stream_generate(attempt, api_key.clone())
                },
            )
            .await;

            let LadderCommit { first, mut rest, .. } = match outcome {
                Ok(commit) => commit,
                Err(failure) => {
                    return Ok(single_fragment(failure_fragment(&failure.friendly_message())));
                }
            };

            let stream = stream! {
                if let Some(text) = first {
                    yield Fragment::text(text);
                }

                let mut failed = false;
                while let Some(item) = rest.next().await {
                    match item {
                        Ok(text) => {
                            yield Fragment::text(text);
                        }
                        Err(error) => {
                            yield failure_fragment(&error.user_facing());
                            failed = true;
                            break;
                        }
                    }
                }

                if !failed {
                    yield Fragment::done();
                }
            };

            Ok(Box::pin(stream) as BoxedFragmentStream<'a>)
        })
    }
}

impl SpeechSynthesizer for GeminiProvider {
    fn synthesize<'a>(
        &'a self,
        text: &'a str,
    ) -> ProviderFuture<'a, Result<Option<String>, ProviderError>> {
        Box::pin(async move {
            let api_key = self.credentials.require_api_key(ProviderId::Gemini)?;
            let text = text.chars().take(MAX_SPEECH_CHARS).collect::<String>();
            let speech_request = GeminiRequest {
                model: self.speech_model.clone(),
                system_instruction: None,
                contents: vec![GeminiContent::user(vec![GeminiPart::Text(text)])],
                speech: Some(GeminiSpeechConfig {
                    voice: self.voice.clone(),
                }),
            };

            let response = self.transport.generate(speech_request, api_key).await?;
            Ok(response.audio_base64())
        })
    }
}
