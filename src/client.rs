//! Grok chat completion API client
//!
//! One client drives both operations: image analysis (text + image content
//! parts) and the follow-up simplification (plain text content). Request
//! construction and response extraction are shared between the two.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::prompts;
use crate::upload::ImageUpload;

/// Detail hint attached to image content parts
const IMAGE_DETAIL: &str = "high";

/// Client for the x.ai chat completion endpoint
pub struct GrokClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl GrokClient {
    /// Create a client with the default endpoint and model
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(&ApiConfig::default(), api_key)
    }

    /// Create a client from an API configuration section
    pub fn with_config(config: &ApiConfig, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.url.clone(),
            api_key: api_key.into(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }

    /// Get the model identifier sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Analyze an uploaded image. `instruction` falls back to the fixed
    /// clinical analysis prompt. The image travels inline as a base64 data
    /// URI; the whole upload is encoded before the request is sent.
    pub async fn analyze_image(
        &self,
        image: &ImageUpload,
        instruction: Option<&str>,
    ) -> Result<String> {
        let prompt = instruction.unwrap_or(prompts::ANALYSIS_PROMPT);
        let content = MessageContent::Parts(vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_uri(),
                    detail: IMAGE_DETAIL.to_string(),
                },
            },
        ]);
        self.send(&self.chat_request(content)).await
    }

    /// Re-explain a prior result in terms a five-year-old would follow.
    /// Text only; no image part is attached.
    pub async fn simplify(&self, text: &str) -> Result<String> {
        let content = MessageContent::Text(format!("{}{}", prompts::ELI5_PREFIX, text));
        self.send(&self.chat_request(content)).await
    }

    fn chat_request(&self, content: MessageContent) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content,
            }],
            max_tokens: self.max_tokens,
        }
    }

    /// POST the request and extract `choices[0].message.content`. A
    /// non-success status becomes [`Error::Api`] carrying the raw body.
    async fn send(&self, request: &ChatRequest) -> Result<String> {
        debug!(model = %request.model, "sending chat completion request");

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Api { status, body });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| Error::MalformedResponse(format!("{e}; raw response: {body}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(Error::MalformedResponse(body))
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: MessageContent,
}

/// The API accepts either a bare string or a list of typed parts
#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
    detail: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::ImageFormat;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// One-shot HTTP server answering with a canned response. Resolves to
    /// the raw request text once a full request has arrived.
    async fn spawn_endpoint(
        status: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before a full request arrived");
                raw.extend_from_slice(&buf[..n]);
                if let Some(request) = full_request(&raw) {
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    stream.write_all(response.as_bytes()).await.unwrap();
                    stream.shutdown().await.unwrap();
                    return request;
                }
            }
        });
        (format!("http://{addr}/v1/chat/completions"), handle)
    }

    /// Returns the request text once headers and body have fully arrived
    fn full_request(raw: &[u8]) -> Option<String> {
        let text = String::from_utf8_lossy(raw);
        let header_end = text.find("\r\n\r\n")? + 4;
        let mut content_length = None;
        for line in text[..header_end].lines() {
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse::<usize>().ok();
                }
            }
        }
        (raw.len() >= header_end + content_length?).then(|| text.into_owned())
    }

    fn request_payload(request: &str) -> serde_json::Value {
        let body = request.split("\r\n\r\n").nth(1).unwrap();
        serde_json::from_str(body).unwrap()
    }

    fn test_client(url: String) -> GrokClient {
        GrokClient::with_config(
            &ApiConfig {
                url,
                ..ApiConfig::default()
            },
            "test-key",
        )
    }

    const OK_BODY: &str = r#"{"choices":[{"message":{"role":"assistant","content":"X"}}]}"#;

    #[tokio::test]
    async fn test_analysis_returns_message_content() {
        let (url, server) = spawn_endpoint("200 OK", OK_BODY).await;
        let client = test_client(url);
        let image = ImageUpload::new("scan.png", ImageFormat::Png, vec![1, 2, 3]);

        let result = client.analyze_image(&image, None).await.unwrap();
        assert_eq!(result, "X");

        let request = server.await.unwrap();
        assert!(request.contains("Bearer test-key"));

        let payload = request_payload(&request);
        assert_eq!(payload["model"], "grok-1.5");
        assert_eq!(payload["max_tokens"], 1500);
        assert_eq!(payload["messages"][0]["role"], "user");

        let parts = payload["messages"][0]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert!(
            parts[0]["text"]
                .as_str()
                .unwrap()
                .contains("medical practitioner")
        );
        assert_eq!(parts[1]["type"], "image_url");
        let data_uri = parts[1]["image_url"]["url"].as_str().unwrap();
        assert!(data_uri.starts_with("data:image/png;base64,"));
        assert_eq!(parts[1]["image_url"]["detail"], "high");
    }

    #[tokio::test]
    async fn test_api_error_carries_status_and_body() {
        let (url, _server) = spawn_endpoint("404 Not Found", "not found").await;
        let client = test_client(url);

        let err = client.simplify("anything").await.unwrap_err();
        match &err {
            Error::Api { status, body } => {
                assert_eq!(status.as_u16(), 404);
                assert_eq!(body, "not found");
            }
            other => panic!("expected Api error, got {other:?}"),
        }

        let rendered = err.to_string();
        assert!(rendered.contains("404"));
        assert!(rendered.contains("not found"));
    }

    #[tokio::test]
    async fn test_simplify_sends_text_only_content() {
        let (url, server) = spawn_endpoint("200 OK", OK_BODY).await;
        let client = test_client(url);

        client.simplify("T").await.unwrap();

        let request = server.await.unwrap();
        assert!(!request.contains("image_url"));

        let payload = request_payload(&request);
        let content = payload["messages"][0]["content"]
            .as_str()
            .expect("simplify content should be a plain string");
        assert!(content.starts_with(prompts::ELI5_PREFIX));
        assert!(content.ends_with("T"));
    }

    #[tokio::test]
    async fn test_missing_choices_is_malformed_response() {
        let (url, _server) = spawn_endpoint("200 OK", r#"{"choices":[]}"#).await;
        let client = test_client(url);

        let err = client.simplify("anything").await.unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unexpected_shape_is_malformed_response() {
        let (url, _server) = spawn_endpoint("200 OK", r#"{"detail":"quota exceeded"}"#).await;
        let client = test_client(url);

        let err = client.simplify("anything").await.unwrap_err();
        match err {
            Error::MalformedResponse(raw) => assert!(raw.contains("quota exceeded")),
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }
}
