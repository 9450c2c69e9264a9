//! Incremental assembly of a streamed assistant reply.
//!
//! One assembler owns the text buffer for one turn. Content deltas are
//! appended in arrival order, with one defensive check: a producer may
//! redeliver an already-sent fragment at a chunk boundary, so a delta that
//! exactly matches the buffer's current tail is dropped. The terminal
//! cleanup pass collapses consecutive duplicate paragraphs.

/// Phase of one assistant turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// No content received yet.
    Idle,
    /// Content deltas are being applied.
    Streaming,
    /// Terminal cleanup has run; the buffer is final.
    Done,
    /// The turn ended with an error. Whatever was committed stays.
    Failed,
}

/// Accumulates one assistant reply from content deltas.
#[derive(Debug)]
pub struct ReplyAssembler {
    buffer: String,
    phase: TurnPhase,
}

impl Default for ReplyAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyAssembler {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            phase: TurnPhase::Idle,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// The accumulated reply text so far.
    pub fn content(&self) -> &str {
        &self.buffer
    }

    /// Apply one content delta. Returns true if the buffer changed.
    ///
    /// The duplicate check is an exact match of the entire delta against the
    /// buffer's tail of equal length. A delta that overlaps only partially
    /// is appended whole; the non-overlapping remainder is not reconstructed.
    pub fn push_delta(&mut self, delta: &str) -> bool {
        self.phase = TurnPhase::Streaming;
        if delta.is_empty() {
            return false;
        }
        if self.buffer.ends_with(delta) {
            tracing::debug!(len = delta.len(), "dropping redelivered tail fragment");
            return false;
        }
        self.buffer.push_str(delta);
        true
    }

    /// Terminal cleanup: trim paragraphs, collapse consecutive duplicates,
    /// and freeze the buffer. Idempotent over its own output.
    pub fn finalize(&mut self) -> &str {
        self.buffer = dedupe_consecutive_paragraphs(&self.buffer);
        self.phase = TurnPhase::Done;
        &self.buffer
    }

    /// Mark the turn failed. Committed content is retained as-is.
    pub fn fail(&mut self) {
        self.phase = TurnPhase::Failed;
    }
}

/// Split on the paragraph separator, trim each paragraph, and drop any
/// paragraph byte-identical to the immediately preceding kept one. Repeats
/// that are not consecutive are preserved.
pub fn dedupe_consecutive_paragraphs(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if kept.last() == Some(&paragraph) {
            continue;
        }
        kept.push(paragraph);
    }
    kept.join("\n\n")
}
