//! Gemini Backend Implementation
//!
//! Advisory backend for Google's Generative Language API.
//!
//! # Gemini API
//!
//! - `POST /models/{model}:generateContent` - buffered completion
//! - `POST /models/{model}:streamGenerateContent?alt=sse` - server-sent events,
//!   one `data: {json}` line per chunk
//!
//! The API is stateless: every request carries the system instruction and
//! the full turn history.

use std::time::Instant;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::traits::{BackendConfig, LlmBackend, LlmRequest, LlmResponse, StreamingToken, TurnRole};
use crate::error::AdvisorError;

/// Gemini backend client
#[derive(Clone)]
pub struct GeminiBackend {
    /// API credential
    api_key: String,
    /// Base URL, no trailing slash
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    /// Create from `BackendConfig`
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::Configuration`] when no credential is set or
    /// the HTTP client cannot be built.
    pub fn from_config(config: &BackendConfig) -> Result<Self, AdvisorError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                AdvisorError::Configuration("GEMINI_API_KEY environment variable not set".into())
            })?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AdvisorError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Buffered endpoint URL
    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    /// Streaming endpoint URL
    fn stream_url(&self, model: &str) -> String {
        format!("{}/models/{model}:streamGenerateContent?alt=sse", self.base_url)
    }

    async fn post(&self, url: &str, request: &LlmRequest) -> anyhow::Result<reqwest::Response> {
        let body = GenerateRequest::from_request(request);

        let response = self
            .http_client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini returned {status}: {body}");
        }

        Ok(response)
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "Gemini"
    }

    async fn send_streaming(
        &self,
        request: &LlmRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamingToken>> {
        let (tx, rx) = mpsc::channel(100);

        let response = self.post(&self.stream_url(&request.model), request).await?;
        let mut stream = response.bytes_stream();

        tokio::spawn(async move {
            let mut lines = LineDecoder::default();
            let mut full_response = String::new();

            while let Some(chunk) = stream.next().await {
                let decoded = match chunk {
                    Ok(bytes) => lines.push(&bytes),
                    Err(e) => {
                        let _ = tx.send(StreamingToken::Error(e.to_string())).await;
                        return;
                    }
                };
                for line in decoded {
                    if !forward_line(&tx, line, &mut full_response).await {
                        return;
                    }
                }
            }

            // Last event may arrive without a trailing newline
            if let Some(line) = lines.finish() {
                if !forward_line(&tx, line, &mut full_response).await {
                    return;
                }
            }

            let _ = tx
                .send(StreamingToken::Complete {
                    message: full_response,
                })
                .await;
        });

        Ok(rx)
    }

    async fn send(&self, request: &LlmRequest) -> anyhow::Result<LlmResponse> {
        let start = Instant::now();
        let response = self.post(&self.generate_url(&request.model), request).await?;
        let data: GenerateResponse = response.json().await?;

        if let Some(error) = data.error {
            anyhow::bail!("Gemini error: {}", error.message);
        }

        let tokens_used = data
            .usage_metadata
            .as_ref()
            .and_then(|u| u.candidates_token_count);

        Ok(LlmResponse {
            content: data.text(),
            model: request.model.clone(),
            tokens_used,
            duration_ms: Some(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)),
        })
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateRequest {
    fn from_request(request: &LlmRequest) -> Self {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .map(|turn| Content::text(turn.role, &turn.text))
            .collect();
        contents.push(Content::text(TurnRole::User, &request.prompt));

        let generation_config = if request.temperature.is_some() || request.max_tokens > 0 {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: (request.max_tokens > 0).then_some(request.max_tokens),
            })
        } else {
            None
        };

        Self {
            contents,
            system_instruction: request.system.as_ref().map(|s| SystemInstruction {
                parts: vec![Part { text: s.clone() }],
            }),
            generation_config,
        }
    }
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: TurnRole, text: &str) -> Self {
        Self {
            role: match role {
                TurnRole::User => "user",
                TurnRole::Model => "model",
            },
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    error: Option<ApiError>,
}

impl GenerateResponse {
    /// Text of the first candidate
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    candidates_token_count: Option<u32>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Splits a byte stream into lines
///
/// Bytes are buffered until a newline arrives, so a multi-byte character
/// split across network chunks is decoded whole.
#[derive(Debug, Default)]
struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Feed a chunk, returning every line it completes
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<String, String>> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Whatever is left once the stream ends
    fn finish(&mut self) -> Option<Result<String, String>> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            self.buffer.clear();
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> Result<String, String> {
    std::str::from_utf8(bytes)
        .map(|line| line.trim().to_string())
        .map_err(|e| format!("Invalid UTF-8 in stream: {e}"))
}

/// Send the token for one decoded line; `false` once streaming must stop
async fn forward_line(
    tx: &mpsc::Sender<StreamingToken>,
    line: Result<String, String>,
    full_response: &mut String,
) -> bool {
    let token = match line.map(|line| parse_sse_line(&line)) {
        Ok(Some(Ok(text))) => {
            full_response.push_str(&text);
            StreamingToken::Token(text)
        }
        Ok(Some(Err(message))) | Err(message) => StreamingToken::Error(message),
        Ok(None) => return true,
    };
    let is_error = matches!(token, StreamingToken::Error(_));
    // A dropped receiver also stops the stream
    tx.send(token).await.is_ok() && !is_error
}

/// Parse one SSE line
///
/// Returns `None` for blank lines, comments, non-data fields, and chunks
/// without text (e.g. a final usage-only chunk).
fn parse_sse_line(line: &str) -> Option<Result<String, String>> {
    let json = line.strip_prefix("data:")?.trim_start();
    if json.is_empty() {
        return None;
    }

    let chunk: GenerateResponse = match serde_json::from_str(json) {
        Ok(chunk) => chunk,
        Err(e) => return Some(Err(format!("Malformed stream chunk: {e}"))),
    };

    if let Some(error) = chunk.error {
        return Some(Err(error.message));
    }

    let text = chunk.text();
    (!text.is_empty()).then_some(Ok(text))
}
