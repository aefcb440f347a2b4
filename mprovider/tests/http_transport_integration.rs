#![cfg(all(feature = "provider-gemini", feature = "provider-openai"))]

use futures_util::StreamExt;
use mprovider::adapters::gemini::{
    GeminiContent, GeminiHttpTransport, GeminiPart, GeminiRequest, GeminiTransport,
};
use mprovider::adapters::openai::{
    OpenAiHttpTransport, OpenAiMessage, OpenAiRequest, OpenAiRole, OpenAiStreamChunk,
    OpenAiTransport,
};
use mprovider::{ProviderErrorKind, SecretString};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accepts one connection, records the raw request, and replies with `body`.
async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let address = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("client should connect");
        let mut raw = Vec::new();
        let mut buffer = [0_u8; 4096];

        loop {
            let read = socket.read(&mut buffer).await.expect("request should read");
            if read == 0 {
                break;
            }
            raw.extend_from_slice(&buffer[..read]);

            let text = String::from_utf8_lossy(&raw);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if raw.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("response should write");
        socket.shutdown().await.ok();

        String::from_utf8_lossy(&raw).into_owned()
    });

    (format!("http://{address}"), handle)
}

fn openai_request() -> OpenAiRequest {
    OpenAiRequest {
        model: "gpt-4o-mini".to_string(),
        messages: vec![OpenAiMessage::new(OpenAiRole::User, "hi")],
    }
}

fn gemini_request() -> GeminiRequest {
    GeminiRequest {
        model: "gemini-1.5-flash".to_string(),
        system_instruction: Some("be brief".to_string()),
        contents: vec![GeminiContent::user(vec![GeminiPart::Text("hi".to_string())])],
        speech: None,
    }
}

#[tokio::test]
async fn openai_transport_decodes_sse_deltas_until_done() {
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
        "data: [DONE]\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"after done\"}}]}\n\n",
    )
    .to_string();
    let (base_url, server) = serve_once("200 OK", body).await;
    let transport = OpenAiHttpTransport::new(reqwest::Client::new()).with_base_url(base_url);

    let chunks = transport
        .stream(openai_request(), SecretString::new("sk-test"))
        .await
        .expect("stream should open")
        .collect::<Vec<_>>()
        .await;

    let deltas = chunks
        .into_iter()
        .map(|chunk| chunk.expect("chunk should decode"))
        .collect::<Vec<_>>();
    assert_eq!(
        deltas,
        vec![
            OpenAiStreamChunk::TextDelta("Hel".to_string()),
            OpenAiStreamChunk::TextDelta("lo".to_string()),
        ]
    );

    let raw_request = server.await.expect("server task");
    assert!(raw_request.starts_with("POST /chat/completions"));
    assert!(raw_request.to_ascii_lowercase().contains("authorization: bearer sk-test"));
    assert!(raw_request.contains("\"stream\":true"));
}

#[tokio::test]
async fn openai_transport_maps_http_errors() {
    let body = "{\"error\":{\"message\":\"Rate limit reached\"}}".to_string();
    let (base_url, _server) = serve_once("429 Too Many Requests", body).await;
    let transport = OpenAiHttpTransport::new(reqwest::Client::new()).with_base_url(base_url);

    let error = match transport
        .stream(openai_request(), SecretString::new("sk-test"))
        .await
    {
        Ok(_) => panic!("429 must fail"),
        Err(error) => error,
    };
    assert_eq!(error.kind, ProviderErrorKind::RateLimited);
    assert_eq!(error.message, "Rate limit reached");
}

#[tokio::test]
async fn gemini_transport_streams_text_from_sse_payloads() {
    let body = concat!(
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Hi \"}]}}]}\r\n\r\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"there\"}]}}]}\r\n\r\n",
    )
    .to_string();
    let (base_url, server) = serve_once("200 OK", body).await;
    let transport = GeminiHttpTransport::new(reqwest::Client::new()).with_base_url(base_url);

    let texts = transport
        .stream_generate(gemini_request(), SecretString::new("AIza-test"))
        .await
        .expect("stream should open")
        .map(|item| item.expect("chunk should decode"))
        .collect::<Vec<_>>()
        .await;

    assert_eq!(texts, vec!["Hi ".to_string(), "there".to_string()]);

    let raw_request = server.await.expect("server task");
    assert!(raw_request.starts_with("POST /models/gemini-1.5-flash:streamGenerateContent?alt=sse"));
    assert!(raw_request.to_ascii_lowercase().contains("x-goog-api-key: aiza-test"));
    assert!(raw_request.contains("\"systemInstruction\""));
}

#[tokio::test]
async fn gemini_transport_classifies_missing_model() {
    let body = "{\"error\":{\"code\":404,\"message\":\"models/gemini-1.5-flash is not found\",\"status\":\"NOT_FOUND\"}}".to_string();
    let (base_url, _server) = serve_once("404 Not Found", body).await;
    let transport = GeminiHttpTransport::new(reqwest::Client::new()).with_base_url(base_url);

    let error = match transport
        .stream_generate(gemini_request(), SecretString::new("AIza-test"))
        .await
    {
        Ok(_) => panic!("404 must fail"),
        Err(error) => error,
    };
    assert_eq!(error.kind, ProviderErrorKind::NotFound);
    assert!(error.falls_back());
}
