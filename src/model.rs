//! Unified session schema emitted by every extractor.
//!
//! This is the contract downstream consumers (enrichment, search indexing)
//! depend on: field changes must be additive only, and any breaking change
//! increments [`SCHEMA_VERSION`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Version tag identifying the field contract of [`ParsedSession`].
pub const SCHEMA_VERSION: &str = "1.0";

/// Message author role. Anything a source cannot map onto these two is
/// dropped during extraction rather than passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A tool invocation recorded on an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name as reported by the agent (e.g. "Read", "Bash").
    pub tool: String,
    /// Flattened human-readable argument summary, never the raw payload.
    pub input: String,
}

/// A single normalized conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Chain-of-thought reasoning, assistant messages only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_uses: Vec<ToolCall>,
    /// ISO-8601 timestamp when the message was sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Monotonic per-session counters. Missing source data leaves a counter at
/// zero; counters are never decremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(default)]
    pub user_messages: u64,
    #[serde(default)]
    pub assistant_messages: u64,
    #[serde(default)]
    pub tool_uses: u64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    /// Malformed entries tolerated while scanning the session.
    #[serde(default)]
    pub skipped_entries: u64,
}

/// Session metadata accumulated while scanning entries. Every field is
/// first-non-empty-wins except the time bounds, which track min/max.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMeta {
    pub session_id: String,
    pub project: Option<String>,
    pub model: Option<String>,
    pub git_branch: Option<String>,
    pub cwd: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub agent_version: Option<String>,
}

/// A complete parsed session in the unified schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSession {
    pub schema_version: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Messages in source order.
    pub messages: Vec<Message>,
    pub stats: SessionStats,
}

/// Lightweight descriptor produced by discovery, one per reachable session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub session_id: String,
    /// Best-known ISO-8601 timestamp, used for newest-first ordering;
    /// handles without one sort last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Storage unit the session was found in. Diagnostic only.
    pub source_path: PathBuf,
    /// Raw store key, for embedded-store sessions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_key: Option<String>,
    /// Name of the extractor that produced this handle.
    pub agent: String,
}
