//! Focused unit tests for Gemini adapter internals.

#![cfg(test)]

use std::sync::Arc;

use reqwest::StatusCode;

use crate::{
    Attachment, ChatMode, GenerationRequest, Message, ProviderError, ProviderErrorKind,
    ProviderFuture, Role, SecretString, SecureCredentialManager,
};

use super::provider::GeminiProvider;
use super::serde_api::{GeminiApiResponse, build_api_request, classify_error};
use super::transport::{GeminiChunkStream, GeminiTransport};
use super::types::{
    GeminiContent, GeminiPart, GeminiRequest, GeminiResponse, GeminiRole, GeminiSpeechConfig,
};

#[derive(Debug)]
struct NoopTransport;

impl GeminiTransport for NoopTransport {
    fn generate<'a>(
        &'a self,
        _request: GeminiRequest,
        _api_key: SecretString,
    ) -> ProviderFuture<'a, Result<GeminiResponse, ProviderError>> {
        Box::pin(async { Err(ProviderError::other("not used")) })
    }

    fn stream_generate<'a>(
        &'a self,
        _request: GeminiRequest,
        _api_key: SecretString,
    ) -> ProviderFuture<'a, Result<GeminiChunkStream<'a>, ProviderError>> {
        Box::pin(async { Err(ProviderError::other("not used")) })
    }
}

fn provider() -> GeminiProvider {
    GeminiProvider::new(
        Arc::new(SecureCredentialManager::new()),
        Arc::new(NoopTransport),
    )
}

#[test]
fn build_contents_drops_trailing_user_turn_and_appends_input() {
    let mut failed = Message::new(Role::Model, "**Error:** quota");
    failed.is_error = true;
    let history = vec![
        Message::new(Role::User, "first question"),
        Message::new(Role::Model, "first answer"),
        Message::new(Role::User, "unanswered"),
        failed,
    ];
    let request = GenerationRequest::new(history, "second question", ChatMode::Assistant);

    let contents = provider().build_contents(&request);
    let roles = contents
        .iter()
        .map(|content| content.role)
        .collect::<Vec<_>>();

    assert_eq!(
        roles,
        vec![GeminiRole::User, GeminiRole::Model, GeminiRole::User]
    );
    assert_eq!(
        contents[2].parts,
        vec![GeminiPart::Text("second question".to_string())]
    );
}

#[test]
fn build_contents_sends_attachments_as_inline_parts() {
    let request = GenerationRequest::new(Vec::new(), "", ChatMode::FileAnalyzer)
        .with_attachments(vec![Attachment::new("a.pdf", "application/pdf", vec![7])]);

    let contents = provider().build_contents(&request);
    assert_eq!(contents.len(), 1);
    assert_eq!(
        contents[0].parts,
        vec![GeminiPart::InlineData {
            mime_type: "application/pdf".to_string(),
            data: vec![7],
        }]
    );
}

#[test]
fn api_request_encodes_inline_data_and_speech_config() {
    let request = GeminiRequest {
        model: "gemini-2.5-flash-preview-tts".to_string(),
        system_instruction: Some("be kind".to_string()),
        contents: vec![GeminiContent::user(vec![
            GeminiPart::Text("hi".to_string()),
            GeminiPart::InlineData {
                mime_type: "image/png".to_string(),
                data: b"png".to_vec(),
            },
        ])],
        speech: Some(GeminiSpeechConfig {
            voice: "Kore".to_string(),
        }),
    };

    let encoded =
        serde_json::to_value(build_api_request(request).expect("request should build"))
            .expect("request should serialize");

    assert_eq!(encoded["systemInstruction"]["parts"][0]["text"], "be kind");
    assert_eq!(encoded["contents"][0]["role"], "user");
    assert_eq!(encoded["contents"][0]["parts"][1]["inlineData"]["data"], "cG5n");
    assert_eq!(encoded["generationConfig"]["responseModalities"][0], "AUDIO");
    assert_eq!(
        encoded["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
            ["voiceName"],
        "Kore"
    );
}

#[test]
fn api_request_without_contents_is_rejected() {
    let request = GeminiRequest {
        model: "gemini-pro".to_string(),
        system_instruction: None,
        contents: Vec::new(),
        speech: None,
    };

    let error = build_api_request(request).expect_err("empty contents must fail");
    assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
}

#[test]
fn classify_error_maps_status_and_body() {
    let not_found = classify_error(
        StatusCode::NOT_FOUND,
        r#"{"error":{"code":404,"message":"models/gemini-x is not found","status":"NOT_FOUND"}}"#,
    );
    assert_eq!(not_found.kind, ProviderErrorKind::NotFound);
    assert_eq!(not_found.message, "models/gemini-x is not found");

    let bad_key = classify_error(
        StatusCode::BAD_REQUEST,
        r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#,
    );
    assert_eq!(bad_key.kind, ProviderErrorKind::Authentication);

    let bad_request = classify_error(StatusCode::BAD_REQUEST, "not json");
    assert_eq!(bad_request.kind, ProviderErrorKind::InvalidRequest);
    assert_eq!(
        bad_request.message,
        "Gemini request failed with status 400 Bad Request"
    );

    let quota = classify_error(
        StatusCode::TOO_MANY_REQUESTS,
        r#"{"error":{"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#,
    );
    assert_eq!(quota.kind, ProviderErrorKind::RateLimited);

    let down = classify_error(StatusCode::SERVICE_UNAVAILABLE, "");
    assert_eq!(down.kind, ProviderErrorKind::Unavailable);
}

#[test]
fn response_conversion_splits_text_and_inline_data() {
    let parsed: GeminiApiResponse = serde_json::from_value(serde_json::json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    {"text": "A red "},
                    {"inlineData": {"mimeType": "image/jpeg", "data": "AAAA"}},
                    {"text": "fox."}
                ]
            }
        }]
    }))
    .expect("response should parse");

    let response = GeminiResponse::from(parsed);
    assert_eq!(response.text, "A red fox.");
    assert_eq!(
        response.image_data_url().as_deref(),
        Some("data:image/jpeg;base64,AAAA")
    );
    assert_eq!(response.audio_base64().as_deref(), Some("AAAA"));
}

#[test]
fn response_without_candidates_is_empty() {
    let parsed: GeminiApiResponse =
        serde_json::from_str(r#"{"promptFeedback":{}}"#).expect("response should parse");
    let response = GeminiResponse::from(parsed);

    assert!(response.text.is_empty());
    assert_eq!(response.image_data_url(), None);
}
