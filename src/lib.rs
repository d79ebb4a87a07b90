//! # agent-sessions
//!
//! Normalized ingestion of local coding agent conversation histories.
//!
//! Different assistants persist their transcripts in incompatible ways:
//! Claude Code appends line-delimited JSON under `~/.claude/projects/`,
//! Cursor keeps JSON blobs in lockable SQLite key/value stores. This crate
//! converts either into one versioned session schema
//! ([`model::ParsedSession`]) that downstream consumers (enrichment,
//! search indexing) can rely on.
//!
//! ## Architecture
//!
//! - [`extractors`]: one [`SourceExtractor`] per agent, looked up by name
//!   through [`extractors::registry`]; `discover()` lists session handles
//!   newest-first, `parse()` materializes one session.
//! - [`assemble`]: folds raw entries into the unified record while
//!   accumulating metadata and statistics.
//! - [`redact`]: the injected text-to-text hook applied to all free text.
//!
//! Parsing degrades unit-by-unit: malformed entries are counted and
//! skipped, unreadable storage units are logged and bypassed, and partial
//! results always beat total failure.
//!
//! ## Example
//!
//! ```rust,no_run
//! use agent_sessions::extractors::registry;
//! use agent_sessions::ExtractorConfig;
//!
//! let config = ExtractorConfig::default();
//! let extractor = registry::create_extractor("claude", &config).expect("built-in extractor");
//! for handle in extractor.discover() {
//!     if let Ok(Some(session)) = extractor.parse(&handle.session_id) {
//!         println!("{}: {} messages", session.session_id, session.messages.len());
//!     }
//! }
//! ```

pub use error::{Error, Result};
pub use extractors::{ExtractorConfig, SourceExtractor};
pub use model::{
    Message, ParsedSession, Role, SessionHandle, SessionMeta, SessionStats, ToolCall,
    SCHEMA_VERSION,
};
pub use redact::{NoopRedactor, Redactor};

pub mod assemble;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod model;
pub mod redact;
