//! Stream event types for assistant replies.

/// Events emitted while streaming an assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// An incremental fragment of reply text.
    ContentDelta(String),

    /// Stream has completed; no more content will follow.
    Done {
        /// The server asked the client to surface the lead-capture prompt.
        show_lead_form: bool,
    },

    /// The server delivered an error, or transport failed mid-stream.
    Error(String),
}

impl StreamEvent {
    /// Terminal events end the turn; only content deltas may follow a
    /// non-terminal event.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::ContentDelta(_))
    }
}
