//! File-log extractor for Claude Code session transcripts.
//!
//! Claude Code stores one session per file at
//! `~/.claude/projects/{project-slug}/{session-id}.jsonl`, one JSON entry
//! per line. Entries carry a `type` discriminator; only `user` and
//! `assistant` entries contribute messages, and a line that fails to decode
//! never invalidates the session, it is counted and skipped.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::assemble::SessionAssembler;
use crate::error::Result;
use crate::extractors::content::extract_content;
use crate::extractors::timestamp::normalize_timestamp;
use crate::extractors::{sort_handles_newest_first, ExtractorConfig, SourceExtractor};
use crate::model::{Message, ParsedSession, Role, SessionHandle};
use crate::redact::Redactor;

/// How many leading lines discovery inspects for a session timestamp.
const DISCOVERY_PROBE_LINES: usize = 8;

pub struct ClaudeExtractor {
    claude_dir: PathBuf,
    redactor: Arc<dyn Redactor>,
    include_thinking: bool,
}

impl Default for ClaudeExtractor {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}

impl ClaudeExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        let claude_dir = config.data_dir.clone().unwrap_or_else(Self::default_dir);
        Self {
            claude_dir,
            redactor: config.redactor.clone(),
            include_thinking: config.include_thinking,
        }
    }

    fn default_dir() -> PathBuf {
        dirs::home_dir().unwrap_or_default().join(".claude")
    }

    fn projects_dir(&self) -> PathBuf {
        self.claude_dir.join("projects")
    }

    /// Probe the first few lines of a session file for a timestamp, so
    /// discovery can order sessions by conversation time. Sessions whose
    /// head carries no timestamp stay unordered (sorted last).
    fn peek_session_timestamp(path: &Path) -> Option<String> {
        let file = fs::File::open(path).ok()?;
        for line in BufReader::new(file)
            .lines()
            .take(DISCOVERY_PROBE_LINES)
            .map_while(|l| l.ok())
        {
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str::<Value>(&line)
                && let Some(ts) = normalize_timestamp(entry.get("timestamp"))
            {
                return Some(ts);
            }
        }
        None
    }

    fn parse_session_file(
        &self,
        path: &Path,
        session_id: &str,
        project: Option<&str>,
    ) -> Result<Option<ParsedSession>> {
        let file = match fs::File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to open session file");
                return Ok(None);
            }
        };

        let mut assembler = SessionAssembler::new(session_id);
        assembler.note_project(project);
        let mut well_formed = 0usize;

        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "unreadable line");
                    assembler.skip_entry();
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let entry: Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(_) => {
                    assembler.skip_entry();
                    continue;
                }
            };
            well_formed += 1;
            self.process_entry(&entry, &mut assembler);
        }

        if well_formed == 0 {
            // Empty or entirely unparseable file: no session, not an empty one.
            return Ok(None);
        }
        Ok(Some(assembler.finish()))
    }

    fn process_entry(&self, entry: &Value, assembler: &mut SessionAssembler) {
        // Metadata is captured opportunistically from whichever entry first
        // exposes it, message-bearing or not.
        assembler.note_cwd(entry.get("cwd").and_then(|v| v.as_str()));
        assembler.note_git_branch(entry.get("gitBranch").and_then(|v| v.as_str()));
        assembler.note_agent_version(entry.get("version").and_then(|v| v.as_str()));

        let timestamp = normalize_timestamp(entry.get("timestamp"));
        if let Some(ts) = &timestamp {
            assembler.observe_timestamp(ts);
        }

        match entry.get("type").and_then(|v| v.as_str()) {
            Some("user") => self.process_user_entry(entry, timestamp, assembler),
            Some("assistant") => self.process_assistant_entry(entry, timestamp, assembler),
            // Summaries, file snapshots, and future entry types are ignored.
            _ => {}
        }
    }

    fn process_user_entry(
        &self,
        entry: &Value,
        timestamp: Option<String>,
        assembler: &mut SessionAssembler,
    ) {
        // Content lives under the message envelope or directly on the entry.
        let Some(raw) = entry
            .get("message")
            .and_then(|m| m.get("content"))
            .or_else(|| entry.get("content"))
        else {
            return;
        };
        let Some(extracted) = extract_content(raw, self.redactor.as_ref(), self.include_thinking)
        else {
            return;
        };
        assembler.push(Message {
            role: Role::User,
            content: extracted.content,
            thinking: extracted.thinking,
            tool_uses: extracted.tool_uses,
            timestamp,
        });
    }

    fn process_assistant_entry(
        &self,
        entry: &Value,
        timestamp: Option<String>,
        assembler: &mut SessionAssembler,
    ) {
        let Some(message) = entry.get("message") else { return };
        assembler.note_model(message.get("model").and_then(|v| v.as_str()));

        // Token spend belongs to the entry, not to the surviving message:
        // usage counts even when the message itself is dropped as empty.
        if let Some(usage) = message.get("usage") {
            let input = usage.get("input_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
            let output = usage.get("output_tokens").and_then(|v| v.as_u64()).unwrap_or(0);
            assembler.add_usage(input, output);
        }

        let Some(raw) = message.get("content") else { return };
        if let Some(extracted) = extract_content(raw, self.redactor.as_ref(), self.include_thinking)
        {
            assembler.push(Message {
                role: Role::Assistant,
                content: extracted.content,
                thinking: extracted.thinking,
                tool_uses: extracted.tool_uses,
                timestamp,
            });
        }
    }
}

impl SourceExtractor for ClaudeExtractor {
    fn agent_name(&self) -> &'static str {
        "claude"
    }

    fn storage_locations(&self) -> Vec<PathBuf> {
        vec![self.projects_dir()]
    }

    fn discover(&self) -> Vec<SessionHandle> {
        let pattern = self.projects_dir().join("*/*.jsonl");
        let pattern = pattern.to_string_lossy();
        let mut handles = Vec::new();

        let entries = match glob::glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "invalid discovery pattern");
                return handles;
            }
        };
        for entry in entries {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable session file");
                    continue;
                }
            };
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            handles.push(SessionHandle {
                session_id: stem.to_string(),
                timestamp: Self::peek_session_timestamp(&path),
                source_path: path,
                raw_key: None,
                agent: self.agent_name().to_string(),
            });
        }

        sort_handles_newest_first(&mut handles);
        handles
    }

    fn parse(&self, session_id: &str) -> Result<Option<ParsedSession>> {
        let projects = self.projects_dir();
        let dir = match fs::read_dir(&projects) {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(path = %projects.display(), error = %e, "projects dir unavailable");
                return Ok(None);
            }
        };

        for entry in dir.flatten() {
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let candidate = entry.path().join(format!("{session_id}.jsonl"));
            if !candidate.is_file() {
                continue;
            }
            let project = entry
                .file_name()
                .to_str()
                .map(project_name_from_slug);
            return self.parse_session_file(&candidate, session_id, project.as_deref());
        }

        Ok(None)
    }
}

/// Derive a display name from a project storage slug. Claude Code encodes
/// the working directory as a dash slug (`-Users-alice-Documents-myproject`);
/// the last segment is the directory name. Names that are not path slugs are
/// used as-is.
fn project_name_from_slug(slug: &str) -> String {
    if slug.starts_with('-') {
        slug.rsplit('-')
            .find(|segment| !segment.is_empty())
            .unwrap_or(slug)
            .to_string()
    } else {
        slug.to_string()
    }
}
