//! Gemini REST payload serde models and conversion helpers.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::ProviderError;

use super::types::{GeminiContent, GeminiInlineData, GeminiPart, GeminiRequest, GeminiResponse};

pub(crate) fn build_api_request(request: GeminiRequest) -> Result<GeminiApiRequest, ProviderError> {
    if request.contents.is_empty() {
        return Err(ProviderError::invalid_request(
            "Gemini request requires at least one content entry",
        ));
    }

    let generation_config = request.speech.map(|speech| GeminiApiGenerationConfig {
        response_modalities: vec!["AUDIO".to_string()],
        speech_config: Some(GeminiApiSpeechConfig {
            voice_config: GeminiApiVoiceConfig {
                prebuilt_voice_config: GeminiApiPrebuiltVoiceConfig {
                    voice_name: speech.voice,
                },
            },
        }),
    });

    Ok(GeminiApiRequest {
        contents: request
            .contents
            .into_iter()
            .map(GeminiApiContent::from)
            .collect(),
        system_instruction: request.system_instruction.map(|text| GeminiApiContent {
            role: None,
            parts: vec![GeminiApiPart::text(text)],
        }),
        generation_config,
    })
}

/// Maps an HTTP failure to an error class. Gemini reports an invalid key as a
/// 400, so the body is inspected before the status.
pub(crate) fn classify_error(status: StatusCode, body: &str) -> ProviderError {
    let envelope = serde_json::from_str::<GeminiApiErrorEnvelope>(body).ok();
    let api_status = envelope
        .as_ref()
        .and_then(|envelope| envelope.error.status.clone())
        .unwrap_or_default();
    let message = envelope
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("Gemini request failed with status {status}"));

    if body.contains("API_KEY") {
        return ProviderError::authentication(message);
    }

    match (status, api_status.as_str()) {
        (StatusCode::NOT_FOUND, _) | (_, "NOT_FOUND") => ProviderError::not_found(message),
        (StatusCode::TOO_MANY_REQUESTS, _) | (_, "RESOURCE_EXHAUSTED") => {
            ProviderError::rate_limited(message)
        }
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _)
        | (_, "UNAUTHENTICATED" | "PERMISSION_DENIED") => ProviderError::authentication(message),
        (StatusCode::BAD_REQUEST, _) | (_, "INVALID_ARGUMENT" | "FAILED_PRECONDITION") => {
            ProviderError::invalid_request(message)
        }
        (StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT, _) => {
            ProviderError::timeout(message)
        }
        (status, _) if status.is_server_error() => ProviderError::unavailable(message),
        _ => ProviderError::transport(message),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiApiErrorEnvelope {
    pub error: GeminiApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiApiError {
    #[serde(default)]
    pub message: String,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiRequest {
    pub contents: Vec<GeminiApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<GeminiApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GeminiApiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GeminiApiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<GeminiApiPart>,
}

impl From<GeminiContent> for GeminiApiContent {
    fn from(value: GeminiContent) -> Self {
        Self {
            role: Some(value.role.as_str().to_string()),
            parts: value.parts.into_iter().map(GeminiApiPart::from).collect(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<GeminiApiInlineData>,
}

impl GeminiApiPart {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            inline_data: None,
        }
    }
}

impl From<GeminiPart> for GeminiApiPart {
    fn from(value: GeminiPart) -> Self {
        match value {
            GeminiPart::Text(text) => Self::text(text),
            GeminiPart::InlineData { mime_type, data } => Self {
                text: None,
                inline_data: Some(GeminiApiInlineData {
                    mime_type,
                    data: STANDARD.encode(data),
                }),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiInlineData {
    #[serde(default)]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiGenerationConfig {
    pub response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<GeminiApiSpeechConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiSpeechConfig {
    pub voice_config: GeminiApiVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiVoiceConfig {
    pub prebuilt_voice_config: GeminiApiPrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiApiPrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GeminiApiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiApiCandidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeminiApiCandidate {
    pub content: Option<GeminiApiContent>,
}

impl From<GeminiApiResponse> for GeminiResponse {
    fn from(value: GeminiApiResponse) -> Self {
        let mut response = GeminiResponse::default();
        let parts = value
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        for part in parts {
            if let Some(inline) = part.inline_data {
                response.inline_data.push(GeminiInlineData {
                    mime_type: inline.mime_type,
                    data: inline.data,
                });
            } else if let Some(text) = part.text {
                response.text.push_str(&text);
            }
        }

        response
    }
}
