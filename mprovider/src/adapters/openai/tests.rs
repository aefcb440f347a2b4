//! Focused unit tests for OpenAI adapter internals.

#![cfg(test)]

use std::sync::Arc;

use crate::{
    ChatMode, GenerationRequest, Message, ProviderError, ProviderErrorKind, ProviderFuture, Role,
    SecretString, SecureCredentialManager,
};

use super::provider::OpenAiProvider;
use super::serde_api::{build_api_request, extract_error_message, parse_stream_delta};
use super::transport::{OpenAiChunkStream, OpenAiTransport};
use super::types::{OpenAiRequest, OpenAiRole};

#[derive(Debug)]
struct NoopTransport;

impl OpenAiTransport for NoopTransport {
    fn stream<'a>(
        &'a self,
        _request: OpenAiRequest,
        _api_key: SecretString,
    ) -> ProviderFuture<'a, Result<OpenAiChunkStream<'a>, ProviderError>> {
        Box::pin(async { Err(ProviderError::other("not used")) })
    }
}

#[test]
fn build_openai_request_wraps_history_with_system_and_input() {
    let provider = OpenAiProvider::new(
        Arc::new(SecureCredentialManager::new()),
        Arc::new(NoopTransport),
    );
    let history = vec![
        Message::new(Role::User, "earlier"),
        Message::new(Role::Model, "reply"),
        Message::new(Role::Model, ""),
    ];
    let request = GenerationRequest::new(history, "now", ChatMode::Code);

    let built = provider.build_openai_request(&request);
    let roles = built
        .messages
        .iter()
        .map(|message| message.role)
        .collect::<Vec<_>>();

    assert_eq!(built.model, "gpt-4o-mini");
    assert_eq!(
        roles,
        vec![
            OpenAiRole::System,
            OpenAiRole::User,
            OpenAiRole::Assistant,
            OpenAiRole::User
        ]
    );
    assert!(built.messages[0].content.ends_with("Mode: Code. Provide robust code, explanations, and fixes."));
    assert_eq!(built.messages[3].content, "now");
}

#[test]
fn api_request_always_streams() {
    let provider = OpenAiProvider::new(
        Arc::new(SecureCredentialManager::new()),
        Arc::new(NoopTransport),
    )
    .with_model("gpt-4o");
    let built = provider.build_openai_request(&GenerationRequest::new(
        Vec::new(),
        "hi",
        ChatMode::Assistant,
    ));

    let encoded = serde_json::to_value(build_api_request(built).expect("request should build"))
        .expect("request should serialize");
    assert_eq!(encoded["model"], "gpt-4o");
    assert_eq!(encoded["stream"], true);
    assert_eq!(encoded["messages"][1]["role"], "user");
}

#[test]
fn api_request_without_messages_is_rejected() {
    let error = build_api_request(OpenAiRequest {
        model: "gpt-4o-mini".to_string(),
        messages: Vec::new(),
    })
    .expect_err("empty messages must fail");
    assert_eq!(error.kind, ProviderErrorKind::InvalidRequest);
}

#[test]
fn parse_stream_delta_reads_first_choice_content() {
    assert_eq!(
        parse_stream_delta(r#"{"choices":[{"delta":{"content":"Hel"}}]}"#)
            .expect("delta should parse"),
        Some("Hel".to_string())
    );
    assert_eq!(
        parse_stream_delta(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#)
            .expect("delta should parse"),
        None
    );
    assert_eq!(
        parse_stream_delta(r#"{"choices":[]}"#).expect("delta should parse"),
        None
    );

    let error = parse_stream_delta("{not json").expect_err("garbage must fail");
    assert_eq!(error.kind, ProviderErrorKind::Decode);
}

#[test]
fn extract_error_message_reads_envelope() {
    assert_eq!(
        extract_error_message(r#"{"error":{"message":"Incorrect API key provided"}}"#),
        Some("Incorrect API key provided".to_string())
    );
    assert_eq!(extract_error_message("<html>"), None);
}
