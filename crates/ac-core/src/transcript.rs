//! Append-only session transcript backed by a JSONL file.
//!
//! Each session writes one JSON object per line under
//! `<data_dir>/sessions/<session_id>.jsonl`: user submissions, completed
//! assistant replies, turn failures, and captured lead details. The server
//! owns conversational context; the transcript is a local record only.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::session::epoch_secs;

/// A single entry in the session transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum TranscriptEntry {
    /// User submitted a message.
    #[serde(rename = "user")]
    User { ts: u64, text: String },
    /// Assistant reply reached its final content.
    #[serde(rename = "assistant")]
    Assistant { ts: u64, text: String },
    /// The turn failed; text is the failure description.
    #[serde(rename = "error")]
    Error { ts: u64, text: String },
    /// Contact details the user shared at the lead prompt.
    #[serde(rename = "lead")]
    Lead { ts: u64, name: String, email: String },
}

impl TranscriptEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self::User {
            ts: epoch_secs(),
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant {
            ts: epoch_secs(),
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Error {
            ts: epoch_secs(),
            text: text.into(),
        }
    }
}

/// Append-only transcript for one chat session.
pub struct Transcript {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl Transcript {
    /// Create/open the transcript file for a session. Creates the sessions
    /// directory.
    pub fn create(data_dir: &Path, session_id: &str) -> io::Result<Self> {
        let sessions_dir = data_dir.join("sessions");
        fs::create_dir_all(&sessions_dir)?;
        let path = sessions_dir.join(format!("{session_id}.jsonl"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Append one entry, flush immediately.
    pub fn append(&mut self, entry: &TranscriptEntry) {
        if let Ok(line) = serde_json::to_string(entry) {
            let _ = writeln!(self.writer, "{line}");
            let _ = self.writer.flush();
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read all entries from a transcript file, skipping unreadable lines.
pub fn read_transcript(path: &Path) -> Vec<TranscriptEntry> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return Vec::new(),
    };
    let reader = BufReader::new(file);
    reader
        .lines()
        .filter_map(|line| {
            let line = line.ok()?;
            if line.trim().is_empty() {
                return None;
            }
            serde_json::from_str(&line).ok()
        })
        .collect()
}

/// List transcript files under the data directory, most recent name last.
pub fn list_sessions(data_dir: &Path) -> Vec<PathBuf> {
    let sessions_dir = data_dir.join("sessions");
    let mut paths: Vec<PathBuf> = match fs::read_dir(&sessions_dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().map(|e| e == "jsonl").unwrap_or(false))
            .collect(),
        Err(_) => Vec::new(),
    };
    paths.sort();
    paths
}
