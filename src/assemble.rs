//! Session assembly.
//!
//! Extractors fold their raw entries through a [`SessionAssembler`], which
//! accumulates messages in source order, opportunistic metadata
//! (first-non-empty-wins), monotonic statistics, and the session time
//! bounds, then emits the final [`ParsedSession`].

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

use crate::model::{Message, ParsedSession, Role, SessionMeta, SessionStats, SCHEMA_VERSION};

pub struct SessionAssembler {
    meta: SessionMeta,
    stats: SessionStats,
    messages: Vec<Message>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl SessionAssembler {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            meta: SessionMeta { session_id: session_id.into(), ..Default::default() },
            stats: SessionStats::default(),
            messages: Vec::new(),
            start: None,
            end: None,
        }
    }

    /// Append a normalized message, bumping the role counter, the tool-use
    /// counter, and the session time bounds.
    pub fn push(&mut self, message: Message) {
        match message.role {
            Role::User => self.stats.user_messages += 1,
            Role::Assistant => self.stats.assistant_messages += 1,
        }
        self.stats.tool_uses += message.tool_uses.len() as u64;
        if let Some(ts) = &message.timestamp {
            self.observe_timestamp(ts);
        }
        self.messages.push(message);
    }

    /// Record one malformed entry that was tolerated and skipped.
    pub fn skip_entry(&mut self) {
        self.stats.skipped_entries += 1;
    }

    pub fn add_usage(&mut self, input_tokens: u64, output_tokens: u64) {
        self.stats.input_tokens += input_tokens;
        self.stats.output_tokens += output_tokens;
    }

    pub fn note_project(&mut self, value: Option<&str>) {
        fill(&mut self.meta.project, value);
    }

    pub fn note_model(&mut self, value: Option<&str>) {
        fill(&mut self.meta.model, value);
    }

    pub fn note_git_branch(&mut self, value: Option<&str>) {
        fill(&mut self.meta.git_branch, value);
    }

    pub fn note_cwd(&mut self, value: Option<&str>) {
        fill(&mut self.meta.cwd, value);
    }

    pub fn note_agent_version(&mut self, value: Option<&str>) {
        fill(&mut self.meta.agent_version, value);
    }

    /// Widen the session time bounds with an ISO-8601 timestamp. Strings
    /// that fail to parse are ignored; bounds track min/max regardless of
    /// the order entries arrive in.
    pub fn observe_timestamp(&mut self, iso: &str) {
        let Some(parsed) = parse_iso(iso) else { return };
        if self.start.is_none_or(|cur| parsed < cur) {
            self.start = Some(parsed);
        }
        if self.end.is_none_or(|cur| parsed > cur) {
            self.end = Some(parsed);
        }
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Emit the final session. A session with zero messages is still valid;
    /// absence of content is not a parse failure.
    pub fn finish(self) -> ParsedSession {
        ParsedSession {
            schema_version: SCHEMA_VERSION.to_string(),
            session_id: self.meta.session_id,
            project: self.meta.project,
            model: self.meta.model,
            git_branch: self.meta.git_branch,
            cwd: self.meta.cwd,
            agent_version: self.meta.agent_version,
            start_time: self.start.map(format_bound),
            end_time: self.end.map(format_bound),
            messages: self.messages,
            stats: self.stats,
        }
    }
}

fn fill(slot: &mut Option<String>, value: Option<&str>) {
    if slot.is_none()
        && let Some(v) = value
        && !v.is_empty()
    {
        *slot = Some(v.to_string());
    }
}

fn format_bound(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_iso(iso: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offset-less strings some producers emit; treated as UTC.
    NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
