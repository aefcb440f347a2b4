#![cfg(feature = "provider-openai")]

use std::sync::{Arc, Mutex};

use futures_util::{StreamExt, stream};
use mprovider::adapters::openai::{
    OpenAiChunkStream, OpenAiProvider, OpenAiRequest, OpenAiRole, OpenAiStreamChunk,
    OpenAiTransport,
};
use mprovider::{
    ChatMode, Fragment, GenerationRequest, Message, ProviderError, ProviderErrorKind,
    ProviderFuture, ResponseStreamer, Role, SecretString, SecureCredentialManager,
};

#[derive(Debug)]
enum Script {
    OpenFails(ProviderError),
    Streams(Vec<Result<OpenAiStreamChunk, ProviderError>>),
}

#[derive(Debug)]
struct FakeTransport {
    script: Mutex<Option<Script>>,
    captured_request: Mutex<Option<OpenAiRequest>>,
    captured_key: Mutex<Option<String>>,
}

impl FakeTransport {
    fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(Some(script)),
            captured_request: Mutex::new(None),
            captured_key: Mutex::new(None),
        }
    }
}

impl OpenAiTransport for FakeTransport {
    fn stream<'a>(
        &'a self,
        request: OpenAiRequest,
        api_key: SecretString,
    ) -> ProviderFuture<'a, Result<OpenAiChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            *self.captured_request.lock().expect("request lock") = Some(request);
            *self.captured_key.lock().expect("key lock") = Some(api_key.expose().to_string());

            match self.script.lock().expect("script lock").take() {
                Some(Script::OpenFails(error)) => Err(error),
                Some(Script::Streams(items)) => Ok(Box::pin(stream::iter(items)) as OpenAiChunkStream<'a>),
                None => Err(ProviderError::other("script already consumed")),
            }
        })
    }
}

fn provider(transport: Arc<FakeTransport>) -> OpenAiProvider {
    let credentials = Arc::new(SecureCredentialManager::new());
    credentials
        .set_openai_api_key("sk-live-123")
        .expect("key should set");
    OpenAiProvider::new(credentials, transport)
}

fn request() -> GenerationRequest {
    GenerationRequest::new(
        vec![
            Message::new(Role::User, "hi"),
            Message::new(Role::Model, "hello"),
        ],
        "tell me more",
        ChatMode::Assistant,
    )
}

#[tokio::test]
async fn deltas_become_fragments_and_stream_ends_with_done() {
    let transport = Arc::new(FakeTransport::new(Script::Streams(vec![
        Ok(OpenAiStreamChunk::TextDelta("Hel".to_string())),
        Ok(OpenAiStreamChunk::TextDelta("lo".to_string())),
    ])));
    let provider = provider(transport.clone());

    let fragments = provider
        .stream_response(request())
        .await
        .expect("stream should open")
        .collect::<Vec<_>>()
        .await;

    assert_eq!(
        fragments,
        vec![Fragment::text("Hel"), Fragment::text("lo"), Fragment::done()]
    );

    let captured = transport
        .captured_request
        .lock()
        .expect("request lock")
        .clone()
        .expect("request should be captured");
    assert_eq!(captured.model, "gpt-4o-mini");
    assert_eq!(captured.messages.len(), 4);
    assert_eq!(captured.messages[0].role, OpenAiRole::System);
    assert_eq!(captured.messages[3].content, "tell me more");
    assert_eq!(
        transport.captured_key.lock().expect("key lock").as_deref(),
        Some("sk-live-123")
    );
}

#[tokio::test]
async fn http_error_becomes_terminal_error_fragment() {
    let transport = Arc::new(FakeTransport::new(Script::OpenFails(
        ProviderError::authentication("Incorrect API key provided"),
    )));
    let provider = provider(transport);

    let fragments = provider
        .stream_response(request())
        .await
        .expect("stream should open")
        .collect::<Vec<_>>()
        .await;

    assert_eq!(
        fragments,
        vec![Fragment::error(
            "**OpenAI Error:** Incorrect API key provided"
        )]
    );
}

#[tokio::test]
async fn decode_error_mid_stream_stops_after_error_fragment() {
    let transport = Arc::new(FakeTransport::new(Script::Streams(vec![
        Ok(OpenAiStreamChunk::TextDelta("partial".to_string())),
        Err(ProviderError::decode("expected value at line 1 column 1")),
        Ok(OpenAiStreamChunk::TextDelta("ignored".to_string())),
    ])));
    let provider = provider(transport);

    let fragments = provider
        .stream_response(request())
        .await
        .expect("stream should open")
        .collect::<Vec<_>>()
        .await;

    assert_eq!(
        fragments,
        vec![
            Fragment::text("partial"),
            Fragment::error("**OpenAI Error:** expected value at line 1 column 1"),
        ]
    );
}

#[tokio::test]
async fn request_is_not_sent_until_stream_is_polled() {
    let transport = Arc::new(FakeTransport::new(Script::Streams(Vec::new())));
    let provider = provider(transport.clone());

    let mut stream = provider
        .stream_response(request())
        .await
        .expect("stream should open");
    assert!(transport.captured_request.lock().expect("request lock").is_none());

    assert_eq!(stream.next().await, Some(Fragment::done()));
    assert_eq!(stream.next().await, None);
    assert!(transport.captured_request.lock().expect("request lock").is_some());
}

#[tokio::test]
async fn missing_openai_credentials_returns_auth_error() {
    let transport = Arc::new(FakeTransport::new(Script::Streams(Vec::new())));
    let provider = OpenAiProvider::new(Arc::new(SecureCredentialManager::new()), transport);

    let error = match provider.stream_response(request()).await {
        Ok(_) => panic!("missing key must fail"),
        Err(error) => error,
    };
    assert_eq!(error.kind, ProviderErrorKind::Authentication);
    assert_eq!(error.message, "no openai API key configured");
}
