//! Lead-capture prompt gating.
//!
//! Two triggers can surface the prompt: an explicit server request carried
//! on the terminal stream record, and a local heuristic that fires after a
//! configured number of user turns. Both run through one show/suppress
//! state, and both read the persisted `lead_submitted` / `lead_dismissed`
//! flags through an injected store so the gate stays independently testable.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const LEAD_SUBMITTED: &str = "lead_submitted";
pub const LEAD_DISMISSED: &str = "lead_dismissed";

/// Persisted boolean client flags.
pub trait FlagStore {
    /// Unset keys read as false.
    fn get(&self, key: &str) -> bool;
    fn set(&mut self, key: &str, value: bool);
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: HashMap<String, bool>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryFlagStore {
    fn get(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    fn set(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_string(), value);
    }
}

/// JSON-file-backed store, write-through on every set.
#[derive(Debug)]
pub struct FileFlagStore {
    path: PathBuf,
    flags: HashMap<String, bool>,
}

impl FileFlagStore {
    /// Open the store at `path`, loading existing flags if present.
    /// Creates parent directories.
    pub fn open(path: PathBuf) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let flags = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), %e, "unreadable flag file, starting fresh");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };
        Ok(Self { path, flags })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) {
        match serde_json::to_string_pretty(&self.flags) {
            Ok(contents) => {
                if let Err(e) = fs::write(&self.path, contents) {
                    tracing::warn!(path = %self.path.display(), %e, "failed to persist flags");
                }
            }
            Err(e) => tracing::warn!(%e, "failed to serialize flags"),
        }
    }
}

impl FlagStore for FileFlagStore {
    fn get(&self, key: &str) -> bool {
        self.flags.get(key).copied().unwrap_or(false)
    }

    fn set(&mut self, key: &str, value: bool) {
        self.flags.insert(key.to_string(), value);
        self.persist();
    }
}

/// Show/suppress state shared by the explicit and heuristic triggers.
///
/// Once either trigger shows the prompt, further evaluation is suppressed
/// until the prompt is closed by `dismiss` or `submit`.
#[derive(Debug, Default)]
pub struct LeadGate {
    visible: bool,
}

impl LeadGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Explicit server-driven trigger, evaluated at end of turn with the
    /// terminal record's flag.
    ///
    /// A prior dismissal does not suppress an explicit request; dismissal
    /// only silences the heuristic trigger, so the stored dismissal is
    /// cleared here.
    pub fn on_turn_end(&mut self, store: &mut dyn FlagStore, requested: bool) {
        if self.visible || store.get(LEAD_SUBMITTED) {
            return;
        }
        if requested {
            self.visible = true;
            store.set(LEAD_DISMISSED, false);
        }
    }

    /// Local heuristic trigger: prompt once the user-turn count reaches the
    /// threshold. Suppressed by either persisted flag.
    pub fn on_user_turn(&mut self, store: &mut dyn FlagStore, user_turns: usize, threshold: usize) {
        if self.visible || store.get(LEAD_SUBMITTED) || store.get(LEAD_DISMISSED) {
            return;
        }
        if threshold > 0 && user_turns >= threshold {
            self.visible = true;
        }
    }

    /// Close the prompt without details; silences the heuristic trigger.
    pub fn dismiss(&mut self, store: &mut dyn FlagStore) {
        self.visible = false;
        store.set(LEAD_DISMISSED, true);
    }

    /// Close the prompt with details captured; never prompt again.
    pub fn submit(&mut self, store: &mut dyn FlagStore) {
        self.visible = false;
        store.set(LEAD_SUBMITTED, true);
    }
}
