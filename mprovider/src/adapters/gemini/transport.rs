//! Gemini transport trait and reqwest-based HTTP implementation.

use std::pin::Pin;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{Client, Response};

use crate::sse::{SseDecoder, SseEvent};
use crate::{ProviderError, ProviderFuture, SecretString};

use super::serde_api::{GeminiApiResponse, build_api_request, classify_error};
use super::types::{GeminiRequest, GeminiResponse};

/// Text deltas in arrival order.
pub type GeminiChunkStream<'a> =
    Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send + 'a>>;

pub trait GeminiTransport: Send + Sync + std::fmt::Debug {
    fn generate<'a>(
        &'a self,
        request: GeminiRequest,
        api_key: SecretString,
    ) -> ProviderFuture<'a, Result<GeminiResponse, ProviderError>>;

    fn stream_generate<'a>(
        &'a self,
        request: GeminiRequest,
        api_key: SecretString,
    ) -> ProviderFuture<'a, Result<GeminiChunkStream<'a>, ProviderError>>;
}

#[derive(Debug, Clone)]
pub struct GeminiHttpTransport {
    client: Client,
    base_url: String,
}

impl GeminiHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{model}:{method}",
            self.base_url.trim_end_matches('/')
        )
    }

    async fn send(
        &self,
        url: String,
        request: GeminiRequest,
        api_key: &SecretString,
    ) -> Result<Response, ProviderError> {
        let api_request = build_api_request(request)?;
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key.expose())
            .json(&api_request)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ProviderError::timeout(err.to_string())
                } else {
                    ProviderError::transport(err.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &body));
        }

        Ok(response)
    }
}

fn response_text(payload: &str) -> Result<String, ProviderError> {
    let parsed: GeminiApiResponse =
        serde_json::from_str(payload).map_err(|err| ProviderError::decode(err.to_string()))?;
    Ok(GeminiResponse::from(parsed).text)
}

impl GeminiTransport for GeminiHttpTransport {
    fn generate<'a>(
        &'a self,
        request: GeminiRequest,
        api_key: SecretString,
    ) -> ProviderFuture<'a, Result<GeminiResponse, ProviderError>> {
        Box::pin(async move {
            let url = self.endpoint(&request.model, "generateContent");
            let response = self.send(url, request, &api_key).await?;
            let parsed: GeminiApiResponse = response
                .json()
                .await
                .map_err(|err| ProviderError::decode(err.to_string()))?;

            Ok(GeminiResponse::from(parsed))
        })
    }

    fn stream_generate<'a>(
        &'a self,
        request: GeminiRequest,
        api_key: SecretString,
    ) -> ProviderFuture<'a, Result<GeminiChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            let url = format!(
                "{}?alt=sse",
                self.endpoint(&request.model, "streamGenerateContent")
            );
            let response = self.send(url, request, &api_key).await?;

            let stream = try_stream! {
                let mut chunks = response.bytes_stream();
                let mut decoder = SseDecoder::new();

                while let Some(item) = chunks.next().await {
                    let bytes = item.map_err(|err| ProviderError::transport(err.to_string()))?;
                    for event in decoder.push(&bytes) {
                        if let SseEvent::Data(payload) = event {
                            let text = response_text(&payload)?;
                            if !text.is_empty() {
                                yield text;
                            }
                        }
                    }
                }

                if let Some(SseEvent::Data(payload)) = decoder.finish() {
                    let text = response_text(&payload)?;
                    if !text.is_empty() {
                        yield text;
                    }
                }
            };

            Ok(Box::pin(stream) as GeminiChunkStream<'a>)
        })
    }
}
