//! Embedded-store extractor for Cursor IDE chat history.
//!
//! Cursor keeps conversations as JSON blobs inside SQLite `state.vscdb`
//! files, one global store plus one per workspace:
//! - macOS: `~/Library/Application Support/Cursor/User/`
//! - Linux: `~/.config/Cursor/User/`
//! - Windows: `%APPDATA%/Cursor/User/`
//!
//! The `cursorDiskKV` table maps keys to blobs; `composerData:{id}` denotes
//! a composed session and `bubbleId:{id}` a message thread. A running
//! Cursor process may hold the store open and locked, so every read goes
//! through a private disposable copy of the file, removed on all exit
//! paths.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use serde_json::Value;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::assemble::SessionAssembler;
use crate::error::{Error, Result};
use crate::extractors::content::{extract_content, summarize_tool_input};
use crate::extractors::timestamp::probe_timestamp;
use crate::extractors::{sort_handles_newest_first, ExtractorConfig, SourceExtractor};
use crate::model::{Message, ParsedSession, Role, SessionHandle, ToolCall};
use crate::redact::Redactor;

/// Key prefix for composed session records.
const COMPOSER_PREFIX: &str = "composerData:";
/// Key prefix for message thread records.
const BUBBLE_PREFIX: &str = "bubbleId:";

/// Candidate fields probed for a discovery timestamp, in priority order.
const DISCOVERY_TS_FIELDS: &[&str] =
    &["timestamp", "createdAt", "created_at", "startTime", "start_time"];
/// Alternative names producer versions have used for the message list.
/// The first field that yields a list wins.
const MESSAGE_LIST_FIELDS: &[&str] = &["messages", "chatHistory", "history", "conversations"];
const MODEL_FIELDS: &[&str] = &["model", "modelId", "model_id", "modelName"];
const BRANCH_FIELDS: &[&str] = &["gitBranch", "git_branch", "branch", "currentBranch"];
const START_FIELDS: &[&str] = &["startTime", "start_time", "createdAt", "timestamp"];
const END_FIELDS: &[&str] = &["endTime", "end_time", "lastActiveAt"];
/// Candidate fields for a per-message timestamp.
const MESSAGE_TS_FIELDS: &[&str] = &["timestamp", "createdAt"];

pub struct CursorExtractor {
    user_dir: PathBuf,
    redactor: Arc<dyn Redactor>,
    include_thinking: bool,
}

impl Default for CursorExtractor {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}

impl CursorExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        let user_dir = config
            .data_dir
            .clone()
            .or_else(Self::default_user_dir)
            .unwrap_or_default();
        Self {
            user_dir,
            redactor: config.redactor.clone(),
            include_thinking: config.include_thinking,
        }
    }

    /// Platform base for Cursor's user storage.
    fn default_user_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            dirs::home_dir().map(|h| h.join("Library/Application Support/Cursor/User"))
        }
        #[cfg(target_os = "linux")]
        {
            dirs::home_dir().map(|h| h.join(".config/Cursor/User"))
        }
        #[cfg(target_os = "windows")]
        {
            dirs::data_dir().map(|d| d.join("Cursor/User"))
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }

    /// Every storage unit: the global store plus one per workspace.
    fn db_paths(&self) -> Vec<PathBuf> {
        let mut dbs = Vec::new();

        let global = self.user_dir.join("globalStorage/state.vscdb");
        if global.is_file() {
            dbs.push(global);
        }

        let workspace_storage = self.user_dir.join("workspaceStorage");
        if workspace_storage.is_dir() {
            for entry in WalkDir::new(&workspace_storage)
                .max_depth(2)
                .into_iter()
                .flatten()
            {
                if entry.file_type().is_file()
                    && entry.file_name().to_str() == Some("state.vscdb")
                {
                    dbs.push(entry.path().to_path_buf());
                }
            }
        }

        dbs
    }

    fn discover_unit(&self, db_path: &Path) -> Result<Vec<SessionHandle>> {
        let (_copy, conn) = open_unit_copy(db_path)?;
        let mut stmt = conn.prepare(
            "SELECT key, value FROM cursorDiskKV \
             WHERE key LIKE 'composerData:%' OR key LIKE 'bubbleId:%'",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut handles = Vec::new();
        for row in rows {
            let (key, value) = match row {
                Ok(kv) => kv,
                Err(e) => {
                    tracing::debug!(path = %db_path.display(), error = %e, "skipping unreadable row");
                    continue;
                }
            };
            let Some(session_id) = key
                .strip_prefix(COMPOSER_PREFIX)
                .or_else(|| key.strip_prefix(BUBBLE_PREFIX))
            else {
                continue;
            };
            let timestamp = serde_json::from_str::<Value>(&value)
                .ok()
                .and_then(|data| probe_timestamp(&data, DISCOVERY_TS_FIELDS));
            handles.push(SessionHandle {
                session_id: session_id.to_string(),
                timestamp,
                source_path: db_path.to_path_buf(),
                raw_key: Some(key),
                agent: "cursor".to_string(),
            });
        }
        Ok(handles)
    }

    fn parse_unit(&self, db_path: &Path, session_id: &str) -> Result<Option<ParsedSession>> {
        let (_copy, conn) = open_unit_copy(db_path)?;
        for prefix in [COMPOSER_PREFIX, BUBBLE_PREFIX] {
            let key = format!("{prefix}{session_id}");
            let blob: Option<String> = conn
                .query_row(
                    "SELECT value FROM cursorDiskKV WHERE key = ?1",
                    rusqlite::params![key],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(blob) = blob
                && let Some(session) = self.parse_session_blob(session_id, &blob)
            {
                return Ok(Some(session));
            }
        }
        Ok(None)
    }

    fn parse_session_blob(&self, session_id: &str, blob: &str) -> Option<ParsedSession> {
        let data: Value = match serde_json::from_str(blob) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(session_id, error = %e, "session blob is not valid JSON");
                return None;
            }
        };
        if !data.is_object() {
            tracing::warn!(session_id, "session blob is not an object");
            return None;
        }

        let mut assembler = SessionAssembler::new(session_id);
        assembler.note_model(probe_str(&data, MODEL_FIELDS));
        assembler.note_git_branch(probe_str(&data, BRANCH_FIELDS));
        if let Some(ts) = probe_timestamp(&data, START_FIELDS) {
            assembler.observe_timestamp(&ts);
        }
        if let Some(ts) = probe_timestamp(&data, END_FIELDS) {
            assembler.observe_timestamp(&ts);
        }

        if let Some(list) = MESSAGE_LIST_FIELDS
            .iter()
            .find_map(|field| data.get(*field).and_then(|v| v.as_array()))
        {
            for raw in list {
                if let Some(message) = self.parse_store_message(raw) {
                    assembler.push(message);
                }
            }
        }

        // A session with zero surviving messages is still a session.
        Some(assembler.finish())
    }

    fn parse_store_message(&self, raw: &Value) -> Option<Message> {
        let raw_role = raw
            .get("role")
            .or_else(|| raw.get("type"))
            .and_then(|v| v.as_str())?;
        let role = normalize_role(raw_role)?;

        let content_val = raw
            .get("content")
            .or_else(|| raw.get("text"))
            .or_else(|| raw.get("message").and_then(|m| m.get("content")));

        let mut content = String::new();
        let mut thinking = None;
        let mut tool_uses = Vec::new();
        if let Some(raw_content) = content_val
            && let Some(extracted) =
                extract_content(raw_content, self.redactor.as_ref(), self.include_thinking)
        {
            content = extracted.content;
            thinking = extracted.thinking;
            tool_uses = extracted.tool_uses;
        }

        // Message-level reasoning: `thinking` wins over `reasoning` when
        // both appear.
        if thinking.is_none() && self.include_thinking {
            if let Some(t) = raw
                .get("thinking")
                .or_else(|| raw.get("reasoning"))
                .and_then(|v| v.as_str())
                && !t.is_empty()
            {
                thinking = Some(self.redactor.redact(t));
            }
        }

        tool_uses.extend(self.message_level_tool_calls(raw));

        if content.is_empty() && tool_uses.is_empty() {
            return None;
        }

        Some(Message {
            role,
            content,
            thinking,
            tool_uses,
            timestamp: probe_timestamp(raw, MESSAGE_TS_FIELDS),
        })
    }

    /// Tool invocations recorded beside the content rather than inside it.
    /// `tool_calls` entries may nest under an OpenAI-style `function`
    /// envelope; `tools` is the flat legacy shape.
    fn message_level_tool_calls(&self, raw: &Value) -> Vec<ToolCall> {
        let mut calls = Vec::new();
        if let Some(list) = raw.get("tool_calls").and_then(|v| v.as_array()) {
            for tc in list {
                let name = tc
                    .get("name")
                    .and_then(|v| v.as_str())
                    .or_else(|| {
                        tc.get("function")
                            .and_then(|f| f.get("name"))
                            .and_then(|v| v.as_str())
                    })
                    .unwrap_or("unknown");
                let input = tc
                    .get("input")
                    .cloned()
                    .or_else(|| tc.get("function").and_then(|f| f.get("arguments")).cloned())
                    .unwrap_or(Value::Null);
                calls.push(ToolCall {
                    tool: name.to_string(),
                    input: summarize_tool_input(name, &input, self.redactor.as_ref()),
                });
            }
        } else if let Some(list) = raw.get("tools").and_then(|v| v.as_array()) {
            for tool in list {
                let name = tool.get("name").and_then(|v| v.as_str()).unwrap_or("unknown");
                let input = tool.get("input").cloned().unwrap_or(Value::Null);
                calls.push(ToolCall {
                    tool: name.to_string(),
                    input: summarize_tool_input(name, &input, self.redactor.as_ref()),
                });
            }
        }
        calls
    }
}

impl SourceExtractor for CursorExtractor {
    fn agent_name(&self) -> &'static str {
        "cursor"
    }

    fn storage_locations(&self) -> Vec<PathBuf> {
        self.db_paths()
    }

    fn discover(&self) -> Vec<SessionHandle> {
        let mut handles = Vec::new();
        for db_path in self.db_paths() {
            match self.discover_unit(&db_path) {
                Ok(found) => handles.extend(found),
                Err(e) => {
                    tracing::warn!(path = %db_path.display(), error = %e, "skipping unreadable cursor store");
                }
            }
        }
        sort_handles_newest_first(&mut handles);
        handles
    }

    fn parse(&self, session_id: &str) -> Result<Option<ParsedSession>> {
        for db_path in self.db_paths() {
            match self.parse_unit(&db_path, session_id) {
                Ok(Some(session)) => return Ok(Some(session)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(path = %db_path.display(), error = %e, "skipping cursor store during parse");
                }
            }
        }
        tracing::debug!(session_id, "session not found in any cursor store");
        Ok(None)
    }
}

/// Copy a storage unit to a private temp file and open the copy read-only.
/// The copy is deleted when the returned guard drops, on every exit path,
/// so the live store's lock is never contended.
fn open_unit_copy(db_path: &Path) -> Result<(NamedTempFile, Connection)> {
    let copy = tempfile::Builder::new()
        .prefix(".agent-sessions-")
        .suffix(".vscdb")
        .tempfile()?;
    fs::copy(db_path, copy.path()).map_err(|e| Error::StoreCopy {
        path: db_path.to_path_buf(),
        source: e,
    })?;
    let conn = Connection::open_with_flags(
        copy.path(),
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok((copy, conn))
}

fn probe_str<'a>(data: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .find_map(|field| data.get(*field).and_then(|v| v.as_str()))
}

fn normalize_role(raw: &str) -> Option<Role> {
    match raw.to_ascii_lowercase().as_str() {
        "user" | "human" | "prompt" => Some(Role::User),
        "assistant" | "ai" | "bot" | "cursor" => Some(Role::Assistant),
        _ => None,
    }
}
