//! Chat-completion client for conversation analysis

use crate::error::AnalysisError;
use crate::prompt::{build_user_message, system_prompt};
use crate::types::{AnalysisKind, AnalysisResult, Interaction};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const NANO_MODEL: &str = "gpt-4.1-nano";
pub const DEFAULT_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Sends a window of interactions to an LLM and returns its analysis
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        interactions: &[Interaction],
        kind: AnalysisKind,
    ) -> Result<AnalysisResult, AnalysisError>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Chat-completion URL
    pub endpoint: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Environment variable holding the API key, read on every call
    pub api_key_var: String,

    /// Hard limit for the whole request/response exchange
    pub timeout: Duration,

    pub temperature: f32,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_var: DEFAULT_API_KEY_VAR.to_string(),
            timeout: DEFAULT_TIMEOUT,
            temperature: 0.3,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u64,
}

/// OpenAI-compatible chat-completion client
pub struct ChatClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ChatClient {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_http(config, reqwest::Client::new())
    }

    pub fn with_http(config: ClientConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn api_key(&self) -> Result<String, AnalysisError> {
        match std::env::var(&self.config.api_key_var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(AnalysisError::CredentialMissing {
                var: self.config.api_key_var.clone(),
            }),
        }
    }

    pub fn build_request(&self, kind: AnalysisKind, interactions: &[Interaction]) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(kind).to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_user_message(kind, interactions),
                },
            ],
            temperature: self.config.temperature,
            max_tokens: kind.max_tokens(),
        }
    }

    async fn send(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<AnalysisResult, AnalysisError> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::from_status(status.as_u16(), &body));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AnalysisError::MalformedResponse("no message content".to_string()))?;

        Ok(AnalysisResult {
            text,
            tokens_used: body.usage.map(|u| u.total_tokens).unwrap_or(0),
            model: self.config.model.clone(),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> AnalysisError {
        if err.is_timeout() {
            AnalysisError::Timeout(self.config.timeout)
        } else {
            AnalysisError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl Analyzer for ChatClient {
    async fn analyze(
        &self,
        interactions: &[Interaction],
        kind: AnalysisKind,
    ) -> Result<AnalysisResult, AnalysisError> {
        if interactions.is_empty() {
            return Err(AnalysisError::EmptyWindow);
        }
        let api_key = self.api_key()?;
        let request = self.build_request(kind, interactions);

        tracing::debug!(
            model = %self.config.model,
            %kind,
            interactions = interactions.len(),
            "sending analysis request"
        );

        let result = match tokio::time::timeout(self.config.timeout, self.send(&api_key, &request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(AnalysisError::Timeout(self.config.timeout)),
        };

        match &result {
            Ok(done) => tracing::info!(%kind, tokens = done.tokens_used, "analysis complete"),
            Err(err) => tracing::warn!(%kind, error = %err, "analysis failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCall;
    use serial_test::serial;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const TEST_KEY_VAR: &str = "CCSPY_TEST_API_KEY";

    fn window() -> Vec<Interaction> {
        vec![Interaction {
            user: "add a login form".to_string(),
            assistant: "Added.\n".to_string(),
            tools: vec![ToolCall {
                name: "Write".to_string(),
                input: serde_json::json!({"file_path": "login.html"}),
            }],
        }]
    }

    fn client_for(endpoint: String, timeout: Duration) -> ChatClient {
        let config = ClientConfig {
            endpoint,
            api_key_var: TEST_KEY_VAR.to_string(),
            timeout,
            ..ClientConfig::new()
        };
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        ChatClient::with_http(config, http)
    }

    async fn read_request(socket: &mut TcpStream) {
        let mut data = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            data.extend_from_slice(&chunk[..n]);
            let Some(end) = data.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&data[..end]).to_lowercase();
            let body_len = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= end + 4 + body_len {
                return;
            }
        }
    }

    /// Serve one request with a canned response; `stall` holds the socket open instead
    async fn serve_once(response: String, stall: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            if stall {
                tokio::time::sleep(Duration::from_secs(10)).await;
                return;
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/v1/chat/completions", addr)
    }

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    #[test]
    fn test_build_request_per_kind() {
        let client = ChatClient::new(ClientConfig::new());

        let summary = serde_json::to_value(client.build_request(AnalysisKind::Summary, &window()))
            .unwrap();
        assert_eq!(summary["model"], DEFAULT_MODEL);
        assert_eq!(summary["max_tokens"], 1000);
        assert!((summary["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert_eq!(summary["messages"][0]["role"], "system");
        assert_eq!(summary["messages"][1]["role"], "user");
        assert!(summary["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("add a login form"));

        let security =
            serde_json::to_value(client.build_request(AnalysisKind::Security, &window())).unwrap();
        assert_eq!(security["max_tokens"], 1200);
    }

    #[tokio::test]
    async fn test_empty_window_rejected_before_credential() {
        let client = ChatClient::new(ClientConfig {
            api_key_var: "CCSPY_TEST_NEVER_SET".to_string(),
            ..ClientConfig::new()
        });
        let err = client.analyze(&[], AnalysisKind::Summary).await.unwrap_err();
        assert_eq!(err, AnalysisError::EmptyWindow);
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_credential() {
        std::env::remove_var(TEST_KEY_VAR);
        let client = client_for("http://127.0.0.1:9/".to_string(), DEFAULT_TIMEOUT);
        let err = client
            .analyze(&window(), AnalysisKind::Summary)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::CredentialMissing {
                var: TEST_KEY_VAR.to_string()
            }
        );
    }

    #[tokio::test]
    #[serial]
    async fn test_successful_analysis() {
        std::env::set_var(TEST_KEY_VAR, "sk-test");
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Intent: login form"}}],"usage":{"total_tokens":321}}"#;
        let endpoint = serve_once(http_response("200 OK", body), false).await;

        let result = client_for(endpoint, DEFAULT_TIMEOUT)
            .analyze(&window(), AnalysisKind::Summary)
            .await
            .unwrap();
        assert_eq!(result.text, "Intent: login form");
        assert_eq!(result.tokens_used, 321);
        assert_eq!(result.model, DEFAULT_MODEL);
    }

    #[tokio::test]
    #[serial]
    async fn test_unauthorized() {
        std::env::set_var(TEST_KEY_VAR, "sk-bad");
        let endpoint = serve_once(http_response("401 Unauthorized", "{}"), false).await;
        let err = client_for(endpoint, DEFAULT_TIMEOUT)
            .analyze(&window(), AnalysisKind::Security)
            .await
            .unwrap_err();
        assert_eq!(err, AnalysisError::Unauthorized { status: 401 });
    }

    #[tokio::test]
    #[serial]
    async fn test_rate_limited() {
        std::env::set_var(TEST_KEY_VAR, "sk-test");
        let endpoint = serve_once(http_response("429 Too Many Requests", "{}"), false).await;
        let err = client_for(endpoint, DEFAULT_TIMEOUT)
            .analyze(&window(), AnalysisKind::Summary)
            .await
            .unwrap_err();
        assert_eq!(err, AnalysisError::RateLimited);
    }

    #[tokio::test]
    #[serial]
    async fn test_malformed_response() {
        std::env::set_var(TEST_KEY_VAR, "sk-test");
        let endpoint = serve_once(http_response("200 OK", r#"{"choices":[]}"#), false).await;
        let err = client_for(endpoint, DEFAULT_TIMEOUT)
            .analyze(&window(), AnalysisKind::Summary)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedResponse(_)));
    }

    #[tokio::test]
    #[serial]
    async fn test_timeout() {
        std::env::set_var(TEST_KEY_VAR, "sk-test");
        let endpoint = serve_once(String::new(), true).await;
        let timeout = Duration::from_millis(200);
        let err = client_for(endpoint, timeout)
            .analyze(&window(), AnalysisKind::Summary)
            .await
            .unwrap_err();
        assert_eq!(err, AnalysisError::Timeout(timeout));
    }

    #[tokio::test]
    #[serial]
    async fn test_transport_error() {
        std::env::set_var(TEST_KEY_VAR, "sk-test");
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(format!("http://{}/", addr), DEFAULT_TIMEOUT)
            .analyze(&window(), AnalysisKind::Summary)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Transport(_)), "got {:?}", err);
    }
}
