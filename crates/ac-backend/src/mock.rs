//! Mock provider for testing.
//!
//! Produces the exact same `StreamEvent` sequence as the real HTTP client,
//! allowing tests at every layer to use the mock instead of real HTTP.

use std::time::Duration;

use async_stream::stream;
use futures::Stream;
use tokio::time::sleep;

use ac_protocol::StreamEvent;

/// Configurable mock responses for testing.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Emit a content delta.
    Text { content: String },
    /// Emit the terminal record.
    Done { show_lead_form: bool },
    /// Emit an error.
    Error { message: String },
    /// Delay before the next event (for timing and cancellation tests).
    Delay { ms: u64 },
}

/// Configuration for a mock stream.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Sequence of responses to emit.
    pub responses: Vec<MockResponse>,
    /// Optional delay between each event (ms).
    pub chunk_delay_ms: Option<u64>,
}

impl MockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(mut self, responses: Vec<MockResponse>) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_chunk_delay(mut self, ms: u64) -> Self {
        self.chunk_delay_ms = Some(ms);
        self
    }
}

/// Create a stream of StreamEvents from mock config.
///
/// Unlike the fixtures, this emits exactly what is scripted: a config
/// without a terminal response models a connection that drops mid-reply.
pub fn mock_stream(config: MockConfig) -> impl Stream<Item = StreamEvent> {
    stream! {
        for response in config.responses {
            if let Some(delay_ms) = config.chunk_delay_ms {
                sleep(Duration::from_millis(delay_ms)).await;
            }

            match response {
                MockResponse::Text { content } => {
                    yield StreamEvent::ContentDelta(content);
                }
                MockResponse::Done { show_lead_form } => {
                    yield StreamEvent::Done { show_lead_form };
                    return;
                }
                MockResponse::Error { message } => {
                    yield StreamEvent::Error(message);
                    return;
                }
                MockResponse::Delay { ms } => {
                    sleep(Duration::from_millis(ms)).await;
                    // Delay doesn't emit an event
                }
            }
        }
    }
}

/// Built-in test fixtures for common scenarios.
pub mod fixtures {
    use super::*;

    /// Stream text in chunks, then complete without the lead flag.
    pub fn streaming_text(chunks: &[&str]) -> MockConfig {
        let mut responses: Vec<MockResponse> = chunks
            .iter()
            .map(|chunk| MockResponse::Text {
                content: (*chunk).to_string(),
            })
            .collect();
        responses.push(MockResponse::Done {
            show_lead_form: false,
        });

        MockConfig::new().with_responses(responses)
    }

    /// Stream text in chunks, then complete with the lead flag set.
    pub fn streaming_text_with_lead(chunks: &[&str]) -> MockConfig {
        let mut config = streaming_text(chunks);
        if let Some(MockResponse::Done { show_lead_form }) = config.responses.last_mut() {
            *show_lead_form = true;
        }
        config
    }

    /// Stream a fragment, then redeliver it, as a producer may do at a
    /// chunk boundary.
    pub fn duplicated_tail(first: &str, redelivered: &str) -> MockConfig {
        MockConfig::new().with_responses(vec![
            MockResponse::Text {
                content: first.to_string(),
            },
            MockResponse::Text {
                content: redelivered.to_string(),
            },
            MockResponse::Text {
                content: redelivered.to_string(),
            },
            MockResponse::Done {
                show_lead_form: false,
            },
        ])
    }

    /// Stream some text, then fail mid-reply.
    pub fn error_mid_stream(text_before: &str, error: &str) -> MockConfig {
        MockConfig::new().with_responses(vec![
            MockResponse::Text {
                content: text_before.to_string(),
            },
            MockResponse::Error {
                message: error.to_string(),
            },
        ])
    }

    /// A connection that drops after some text, with no terminal record.
    pub fn dropped_connection(chunks: &[&str]) -> MockConfig {
        MockConfig::new().with_responses(
            chunks
                .iter()
                .map(|chunk| MockResponse::Text {
                    content: (*chunk).to_string(),
                })
                .collect(),
        )
    }
}
