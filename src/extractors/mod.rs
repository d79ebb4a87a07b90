//! Source extractors for agent histories.
//!
//! Each supported agent gets one extractor implementing [`SourceExtractor`]:
//! discovery enumerates reachable sessions as lightweight handles, and
//! `parse` materializes one session into the unified schema. Extractors are
//! looked up by name through [`registry`].

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::model::{ParsedSession, SessionHandle};
use crate::redact::{NoopRedactor, Redactor};

pub mod claude;
pub mod content;
pub mod cursor;
pub mod registry;
pub mod timestamp;

/// Contract implemented by every session source.
///
/// Both operations are synchronous and degrade unit-by-unit: a corrupt or
/// locked storage unit is logged and skipped, and partial results are always
/// preferred over total failure.
pub trait SourceExtractor: Send + Sync {
    /// Stable identifier for the agent this extractor reads.
    fn agent_name(&self) -> &'static str;

    /// Storage units this extractor will look at. Diagnostic only.
    fn storage_locations(&self) -> Vec<PathBuf>;

    /// Enumerate every reachable session, newest first; handles without a
    /// timestamp sort last.
    fn discover(&self) -> Vec<SessionHandle>;

    /// Parse one session by id, searching all known storage units.
    /// `Ok(None)` means no unit knows the session; it is a normal outcome,
    /// distinct from a found-but-empty session.
    fn parse(&self, session_id: &str) -> Result<Option<ParsedSession>>;
}

/// Configuration shared by extractor constructors.
#[derive(Clone)]
pub struct ExtractorConfig {
    /// Override for the agent's default storage root. Mainly for tests and
    /// non-standard installs; `None` means the platform default.
    pub data_dir: Option<PathBuf>,
    /// Redaction capability applied to all free text. Defaults to
    /// pass-through.
    pub redactor: Arc<dyn Redactor>,
    /// When false, reasoning segments are omitted from the output entirely.
    /// Defaults to true.
    pub include_thinking: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            redactor: Arc::new(NoopRedactor),
            include_thinking: true,
        }
    }
}

impl fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorConfig")
            .field("data_dir", &self.data_dir)
            .field("include_thinking", &self.include_thinking)
            .finish_non_exhaustive()
    }
}

/// Sort discovery output newest first. Handles without a timestamp go last;
/// ties keep their input order (the sort is stable).
pub fn sort_handles_newest_first(handles: &mut [SessionHandle]) {
    handles.sort_by(|a, b| match (&a.timestamp, &b.timestamp) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
