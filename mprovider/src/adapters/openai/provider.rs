//! OpenAI provider implementation over transport and shared models.

use std::sync::Arc;

use async_stream::stream;
use futures_util::StreamExt;

use crate::prompts::system_instruction;
use crate::{
    BoxedFragmentStream, Fragment, GenerationRequest, ProviderError, ProviderFuture, ProviderId,
    ResponseStreamer, SecureCredentialManager, replayable_history,
};

use super::transport::OpenAiTransport;
use super::types::{OpenAiMessage, OpenAiRequest, OpenAiRole, OpenAiStreamChunk};

#[derive(Clone)]
pub struct OpenAiProvider {
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn OpenAiTransport>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn OpenAiTransport>,
    ) -> Self {
        Self {
            credentials,
            transport,
            model: "gpt-4o-mini".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub(crate) fn build_openai_request(&self, request: &GenerationRequest) -> OpenAiRequest {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(OpenAiMessage::new(
            OpenAiRole::System,
            system_instruction(request.mode),
        ));
        messages.extend(replayable_history(&request.history).map(OpenAiMessage::from));
        messages.push(OpenAiMessage::new(OpenAiRole::User, request.input.clone()));

        OpenAiRequest {
            model: self.model.clone(),
            messages,
        }
    }
}

fn error_fragment(error: &ProviderError) -> Fragment {
    Fragment::error(format!("**OpenAI Error:** {}", error.message))
}

impl ResponseStreamer for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn stream_response<'a>(
        &'a self,
        request: GenerationRequest,
    ) -> ProviderFuture<'a, Result<BoxedFragmentStream<'a>, ProviderError>> {
        Box::pin(async move {
            let api_key = self.credentials.require_api_key(ProviderId::OpenAi)?;
            let openai_request = self.build_openai_request(&request);

            let stream = stream! {
                match self.transport.stream(openai_request, api_key).await {
                    Err(error) => {
                        yield error_fragment(&error);
                    }
                    Ok(mut chunks) => {
                        let mut failed = false;
                        while let Some(chunk) = chunks.next().await {
                            match chunk {
                                Ok(OpenAiStreamChunk::TextDelta(text)) => {
                                    yield Fragment::text(text);
                                }
                                Err(error) => {
                                    yield error_fragment(&error);
                                    failed = true;
                                    break;
                                }
                            }
                        }

                        if !failed {
                            yield Fragment::done();
                        }
                    }
                }
            };

            Ok(Box::pin(stream) as BoxedFragmentStream<'a>)
        })
    }
}
