//! Drives one chat turn from submission to completion.
//!
//! A turn appends the user message and an empty assistant placeholder, then
//! applies stream events to the placeholder slot until a terminal record
//! arrives or the stream ends. The conversation has a single writer for the
//! duration of the turn.

use async_stream::stream;
use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};

use ac_protocol::{ChatMessage, Conversation, StreamEvent};

use crate::assembler::{ReplyAssembler, TurnPhase};

/// Result of one completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub phase: TurnPhase,
    /// Final content of the assistant message (partial text on failure).
    pub content: String,
    /// Terminal-record request to surface the lead-capture prompt.
    pub show_lead_form: bool,
    /// Failure description when the turn did not complete.
    pub error: Option<String>,
}

/// Run one turn against an event stream.
///
/// `on_delta` observes each committed fragment as it lands, for progressive
/// rendering. On failure the committed partial text stays in place and a
/// synthetic assistant message describing the failure is appended after it.
pub async fn run_turn<S>(
    conversation: &mut Conversation,
    user_message: &str,
    events: S,
    mut on_delta: impl FnMut(&str),
) -> TurnOutcome
where
    S: Stream<Item = StreamEvent>,
{
    conversation.append(ChatMessage::user(user_message));
    let slot = conversation.append(ChatMessage::assistant(""));

    let mut assembler = ReplyAssembler::new();
    let mut show_lead_form = false;

    let mut events = std::pin::pin!(events);
    while let Some(event) = events.next().await {
        match event {
            StreamEvent::ContentDelta(delta) => {
                if assembler.push_delta(&delta) {
                    conversation.update_at(slot, assembler.content());
                    on_delta(&delta);
                }
            }
            StreamEvent::Done {
                show_lead_form: flag,
            } => {
                conversation.update_at(slot, assembler.finalize());
                show_lead_form = flag;
                break;
            }
            StreamEvent::Error(message) => {
                assembler.fail();
                let partial = assembler.content().to_string();
                // Partial text stays committed; the failure is a new
                // message, never a replacement.
                conversation.append(ChatMessage::assistant(failure_notice(&message)));
                return TurnOutcome {
                    phase: TurnPhase::Failed,
                    content: partial,
                    show_lead_form: false,
                    error: Some(message),
                };
            }
        }
    }

    if assembler.phase() != TurnPhase::Done {
        // Stream ended (or was cancelled) without a terminal record;
        // close the turn with what was committed.
        conversation.update_at(slot, assembler.finalize());
    }

    TurnOutcome {
        phase: TurnPhase::Done,
        content: assembler.content().to_string(),
        show_lead_form,
        error: None,
    }
}

fn failure_notice(message: &str) -> String {
    format!("Sorry, something went wrong: {message}. Please try sending your message again.")
}

/// Handle that aborts an in-flight turn's event stream.
pub struct CancelHandle(oneshot::Sender<()>);

impl CancelHandle {
    /// Stop forwarding events. The wrapped stream ends, and the turn
    /// finalizes with whatever content was already committed.
    pub fn cancel(self) {
        let _ = self.0.send(());
    }
}

/// Wrap an event stream so it can be aborted from outside the turn.
///
/// Events are forwarded from a spawned task that races a oneshot cancel
/// signal; firing the handle ends the returned stream early. Dropping the
/// returned stream also stops the forwarder, so no stale write can reach a
/// superseded message slot.
pub fn cancellable<S>(events: S) -> (CancelHandle, impl Stream<Item = StreamEvent>)
where
    S: Stream<Item = StreamEvent> + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let mut events = std::pin::pin!(events);
        tokio::select! {
            _ = async {
                while let Some(event) = events.next().await {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            } => {}
            _ = cancel_rx => {
                // Cancelled — stop streaming
            }
        }
    });

    let forwarded = stream! {
        while let Some(event) = rx.recv().await {
            yield event;
        }
    };

    (CancelHandle(cancel_tx), forwarded)
}
