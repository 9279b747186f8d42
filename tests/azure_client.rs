//! Azure OpenAI client tests against a loopback HTTP server.
//!
//! The server accepts one connection, captures the raw request and answers
//! with a canned status and body, which is enough to check the wire format
//! without reaching the real service.

use edgequake_pdf2json::pipeline::encode::PNG_MIME;
use edgequake_pdf2json::prompts::EXTRACTION_PROMPT;
use edgequake_pdf2json::{
    extract, AccountSummary, AzureOpenAiConfig, AzureOpenAiExtractor, ExtractError, ImageData,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

struct CapturedRequest {
    head: String,
    body: Value,
}

/// Serve exactly one request with `status` and `body`, returning what was sent.
async fn serve_once(status: u16, body: String) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut raw = Vec::new();
        let mut buf = [0u8; 8192];
        let (head_len, content_length) = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before headers were complete");
            raw.extend_from_slice(&buf[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&raw[..pos]).to_string();
                let len = head
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                break (pos + 4, len);
            }
        };
        while raw.len() < head_len + content_length {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "connection closed before body was complete");
            raw.extend_from_slice(&buf[..n]);
        }

        let reason = match status {
            200 => "OK",
            401 => "Unauthorized",
            _ => "Internal Server Error",
        };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        CapturedRequest {
            head: String::from_utf8_lossy(&raw[..head_len]).to_string(),
            body: serde_json::from_slice(&raw[head_len..head_len + content_length]).unwrap(),
        }
    });

    (endpoint, handle)
}

fn extractor_for(endpoint: &str) -> AzureOpenAiExtractor {
    let config = AzureOpenAiConfig::new(endpoint, "secret-key", "gpt-4o");
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    AzureOpenAiExtractor::with_client(config, client)
}

fn page_image() -> ImageData {
    ImageData::from_bytes(b"\x89PNG\r\n\x1a\n fake page", PNG_MIME)
}

fn completion_body(content: &Value) -> String {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "finish_reason": "stop",
            "message": { "role": "assistant", "content": content.to_string(), "refusal": null }
        }],
        "usage": { "prompt_tokens": 812, "completion_tokens": 24, "total_tokens": 836 }
    })
    .to_string()
}

#[tokio::test]
async fn successful_call_sends_schema_and_image() {
    let answer = json!({
        "customerName": "Jane Doe",
        "accountNumber": "123456789",
        "balanceUSD": "4200.00"
    });
    let (endpoint, server) = serve_once(200, completion_body(&answer)).await;
    let image = page_image();

    let summary: AccountSummary = extract(&extractor_for(&endpoint), EXTRACTION_PROMPT, &image)
        .await
        .unwrap();
    assert_eq!(summary.customer_name, "Jane Doe");
    assert_eq!(summary.account_number, "123456789");
    assert_eq!(summary.balance_usd, "4200.00");

    let req = server.await.unwrap();
    let request_line = req.head.lines().next().unwrap();
    assert_eq!(
        request_line,
        "POST /openai/deployments/gpt-4o/chat/completions?api-version=2024-08-01-preview HTTP/1.1"
    );
    assert!(
        req.head
            .lines()
            .any(|l| l.to_ascii_lowercase() == "api-key: secret-key"),
        "missing api-key header in:\n{}",
        req.head
    );

    assert_eq!(req.body["response_format"]["type"], "json_schema");
    assert_eq!(req.body["response_format"]["json_schema"]["strict"], true);
    assert_eq!(req.body["max_tokens"], 2000);
    assert_eq!(
        req.body["messages"][1]["content"][1]["image_url"]["url"],
        image.to_data_uri()
    );
    assert!(image.to_data_uri().starts_with("data:image/png;base64,"));
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let body = json!({
        "error": { "code": "401", "message": "Access denied due to invalid subscription key." }
    })
    .to_string();
    let (endpoint, server) = serve_once(401, body).await;

    let err = extract::<AccountSummary>(&extractor_for(&endpoint), "q", &page_image())
        .await
        .unwrap_err();
    server.await.unwrap();

    match err {
        ExtractError::Auth { status, detail } => {
            assert_eq!(status, 401);
            assert_eq!(detail, "Access denied due to invalid subscription key.");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn server_error_maps_to_api_error() {
    let (endpoint, server) = serve_once(500, "upstream exploded".to_string()).await;

    let err = extract::<AccountSummary>(&extractor_for(&endpoint), "q", &page_image())
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(
        matches!(&err, ExtractError::Api { status: 500, detail } if detail == "upstream exploded"),
        "got: {err}"
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = extract::<AccountSummary>(&extractor_for(&endpoint), "q", &page_image())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::Transport(_)), "got: {err}");
}
