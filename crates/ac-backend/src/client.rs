//! HTTP client for the platform chat streaming endpoint.

use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use reqwest::Client;
use thiserror::Error;

use ac_protocol::{ChatRequest, StreamEvent};

use crate::event::interpret_line;
use crate::sse::decode_lines;

const STREAM_PATH: &str = "/api/chatbot/stream";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {0}")]
    Api(String),
}

/// Client for the consulting platform's chat API.
pub struct ChatClient {
    base_url: String,
    bearer_token: Option<String>,
    http: Client,
}

/// Build an HTTP client with appropriate timeouts and connection limits.
fn build_http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(120))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(2)
        .build()
        .expect("failed to build HTTP client")
}

impl ChatClient {
    /// Create a client for anonymous (unauthenticated) chat.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            bearer_token: None,
            http: build_http_client(),
        }
    }

    /// Create a client that sends a bearer token on every request.
    pub fn with_token(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            bearer_token: Some(token.into()),
            http: build_http_client(),
        }
    }

    /// Send a chat message and return the event stream for the reply.
    ///
    /// Transport failures surface as a single `StreamEvent::Error`; a
    /// non-success HTTP status is reported without parsing the body as an
    /// event stream. The stream ends after the first terminal event.
    pub fn send(&self, request: &ChatRequest) -> impl Stream<Item = StreamEvent> + Send + 'static {
        let base_url = self.base_url.clone();
        let bearer_token = self.bearer_token.clone();
        let http = self.http.clone();
        let request = request.clone();

        stream! {
            match open_stream(&http, &base_url, bearer_token.as_deref(), &request).await {
                Ok(response) => {
                    let mut lines = decode_lines(response.bytes_stream());

                    use futures::StreamExt;

                    while let Some(result) = lines.next().await {
                        match result {
                            Ok(line) => {
                                if let Some(event) = interpret_line(&line) {
                                    let terminal = event.is_terminal();
                                    yield event;
                                    if terminal {
                                        return;
                                    }
                                }
                            }
                            Err(e) => {
                                yield StreamEvent::Error(format!("stream error: {e}"));
                                return;
                            }
                        }
                    }
                    // Source ended without a terminal record; the turn
                    // runner closes the turn on end-of-stream.
                }
                Err(e) => {
                    yield StreamEvent::Error(e.to_string());
                }
            }
        }
    }
}

fn normalize_base_url(mut base_url: String) -> String {
    while base_url.ends_with('/') {
        base_url.pop();
    }
    base_url
}

async fn open_stream(
    http: &Client,
    base_url: &str,
    bearer_token: Option<&str>,
    request: &ChatRequest,
) -> Result<reqwest::Response, ChatError> {
    let url = format!("{base_url}{STREAM_PATH}");
    tracing::debug!(%url, session = %request.chat_session_id, "opening chat stream");

    let mut builder = http
        .post(&url)
        .header("content-type", "application/json")
        .json(request);
    if let Some(token) = bearer_token {
        builder = builder.bearer_auth(token);
    }

    let response = builder.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ChatError::Api(format!("{status}: {body}")));
    }

    Ok(response)
}
