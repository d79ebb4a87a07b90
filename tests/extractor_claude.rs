use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agent_sessions::extractors::claude::ClaudeExtractor;
use agent_sessions::extractors::registry;
use agent_sessions::{ExtractorConfig, Role, SourceExtractor};
use serde_json::json;
use tempfile::TempDir;

/// Build an extractor rooted at a temp Claude directory.
fn extractor_for(dir: &TempDir) -> ClaudeExtractor {
    agent_sessions::logging::init_test();
    let config = ExtractorConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    ClaudeExtractor::new(&config)
}

fn project_dir(dir: &TempDir, slug: &str) -> PathBuf {
    let path = dir.path().join("projects").join(slug);
    fs::create_dir_all(&path).unwrap();
    path
}

fn write_session(project: &Path, session_id: &str, lines: &[String]) {
    fs::write(
        project.join(format!("{session_id}.jsonl")),
        lines.join("\n"),
    )
    .unwrap();
}

fn user_line(text: &str, timestamp: i64) -> String {
    json!({
        "type": "user",
        "timestamp": timestamp,
        "message": {"content": text},
    })
    .to_string()
}

fn assistant_line(text: &str, timestamp: i64) -> String {
    json!({
        "type": "assistant",
        "timestamp": timestamp,
        "message": {
            "model": "claude-sonnet-4-20250514",
            "content": [{"type": "text", "text": text}],
            "usage": {"input_tokens": 10, "output_tokens": 5},
        },
    })
    .to_string()
}

#[test]
fn parses_two_entry_session() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "-home-user-myapp");
    write_session(
        &project,
        "sess-1",
        &[
            r#"{"type":"user","message":{"content":"Fix bug"}}"#.to_string(),
            json!({
                "type": "assistant",
                "message": {
                    "content": [{"type": "text", "text": "Fixed"}],
                    "usage": {"input_tokens": 1, "output_tokens": 1},
                },
            })
            .to_string(),
        ],
    );

    let session = extractor_for(&dir).parse("sess-1").unwrap().unwrap();
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.messages[0].role, Role::User);
    assert_eq!(session.messages[0].content, "Fix bug");
    assert_eq!(session.messages[1].role, Role::Assistant);
    assert_eq!(session.stats.user_messages, 1);
    assert_eq!(session.stats.assistant_messages, 1);
    assert_eq!(session.stats.input_tokens, 1);
    assert_eq!(session.stats.output_tokens, 1);
    assert_eq!(session.project.as_deref(), Some("myapp"));
}

#[test]
fn malformed_lines_are_counted_not_fatal() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "proj");
    write_session(
        &project,
        "sess-bad",
        &[
            user_line("Hello", 1706000000000),
            "not valid json".to_string(),
            "{broken".to_string(),
            assistant_line("Hi there!", 1706000001000),
        ],
    );

    let session = extractor_for(&dir).parse("sess-bad").unwrap().unwrap();
    assert_eq!(session.messages.len(), 2);
    assert_eq!(session.stats.skipped_entries, 2);
}

#[test]
fn empty_file_yields_no_session() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "proj");
    fs::write(project.join("empty.jsonl"), "").unwrap();

    assert!(extractor_for(&dir).parse("empty").unwrap().is_none());
}

#[test]
fn entirely_unparseable_file_yields_no_session() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "proj");
    fs::write(project.join("junk.jsonl"), "garbage\nmore garbage\n").unwrap();

    assert!(extractor_for(&dir).parse("junk").unwrap().is_none());
}

#[test]
fn unknown_session_is_not_found() {
    let dir = TempDir::new().unwrap();
    project_dir(&dir, "proj");

    assert!(extractor_for(&dir).parse("missing").unwrap().is_none());
}

#[test]
fn metadata_captured_from_entries() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "-Users-dev-Documents-webapp");
    write_session(
        &project,
        "sess-meta",
        &[
            json!({
                "type": "user",
                "timestamp": 1706000000000_i64,
                "cwd": "/Users/dev/Documents/webapp",
                "gitBranch": "main",
                "version": "1.0.30",
                "message": {"content": "Start"},
            })
            .to_string(),
            assistant_line("Working on it.", 1706000001000),
        ],
    );

    let session = extractor_for(&dir).parse("sess-meta").unwrap().unwrap();
    assert_eq!(session.project.as_deref(), Some("webapp"));
    assert_eq!(session.cwd.as_deref(), Some("/Users/dev/Documents/webapp"));
    assert_eq!(session.git_branch.as_deref(), Some("main"));
    assert_eq!(session.agent_version.as_deref(), Some("1.0.30"));
    assert_eq!(session.model.as_deref(), Some("claude-sonnet-4-20250514"));
    let start = session.start_time.unwrap();
    let end = session.end_time.unwrap();
    assert!(start.starts_with("2024-01-23T"));
    assert!(end >= start);
}

#[test]
fn thinking_and_tool_use_segments_flatten() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "proj");
    write_session(
        &project,
        "sess-blocks",
        &[
            user_line("Fix the login bug in src/auth.py", 1706000000000),
            json!({
                "type": "assistant",
                "timestamp": 1706000001000_i64,
                "message": {
                    "model": "claude-sonnet-4-20250514",
                    "content": [
                        {"type": "thinking", "thinking": "Let me look at the auth file."},
                        {"type": "text", "text": "I'll fix the login bug."},
                        {"type": "tool_use", "name": "Read",
                         "input": {"file_path": "src/auth.py"}},
                    ],
                    "usage": {"input_tokens": 500, "output_tokens": 100},
                },
            })
            .to_string(),
        ],
    );

    let session = extractor_for(&dir).parse("sess-blocks").unwrap().unwrap();
    let reply = &session.messages[1];
    assert_eq!(reply.content, "I'll fix the login bug.");
    assert_eq!(reply.thinking.as_deref(), Some("Let me look at the auth file."));
    assert_eq!(reply.tool_uses.len(), 1);
    assert_eq!(reply.tool_uses[0].tool, "Read");
    assert_eq!(reply.tool_uses[0].input, "src/auth.py");
    assert_eq!(session.stats.tool_uses, 1);
    assert_eq!(session.stats.input_tokens, 500);
}

#[test]
fn write_tool_summary_never_embeds_payload() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "proj");
    write_session(
        &project,
        "sess-write",
        &[json!({
            "type": "assistant",
            "message": {
                "content": [
                    {"type": "tool_use", "name": "Write",
                     "input": {"file_path": "main.py", "content": "hi"}},
                ],
            },
        })
        .to_string()],
    );

    let session = extractor_for(&dir).parse("sess-write").unwrap().unwrap();
    let call = &session.messages[0].tool_uses[0];
    assert_eq!(call.tool, "Write");
    assert!(call.input.contains("main.py"));
    assert!(call.input.contains("2 chars"));
    assert!(!call.input.contains("hi"));
}

#[test]
fn empty_user_content_is_dropped() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "proj");
    write_session(
        &project,
        "sess-empty-msg",
        &[
            user_line("", 1706000000000),
            user_line("   ", 1706000001000),
            user_line("Real question", 1706000002000),
        ],
    );

    let session = extractor_for(&dir).parse("sess-empty-msg").unwrap().unwrap();
    assert_eq!(session.messages.len(), 1);
    assert_eq!(session.stats.user_messages, 1);
    assert_eq!(session.stats.skipped_entries, 0);
}

#[test]
fn non_message_entry_types_are_ignored() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "proj");
    write_session(
        &project,
        "sess-types",
        &[
            json!({"type": "summary", "summary": "Earlier work"}).to_string(),
            user_line("Continue", 1706000000000),
        ],
    );

    let session = extractor_for(&dir).parse("sess-types").unwrap().unwrap();
    assert_eq!(session.messages.len(), 1);
    assert_eq!(session.stats.skipped_entries, 0);
}

#[test]
fn usage_counts_even_when_message_is_dropped() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "proj");
    write_session(
        &project,
        "sess-usage",
        &[json!({
            "type": "assistant",
            "message": {
                "content": [],
                "usage": {"input_tokens": 42, "output_tokens": 7},
            },
        })
        .to_string()],
    );

    let session = extractor_for(&dir).parse("sess-usage").unwrap().unwrap();
    assert!(session.messages.is_empty());
    assert_eq!(session.stats.input_tokens, 42);
    assert_eq!(session.stats.output_tokens, 7);
}

#[test]
fn discover_orders_newest_first_absent_last() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "proj");
    write_session(&project, "older", &[user_line("a", 1705708800000)]); // 2024-01-20
    write_session(
        &project,
        "undated",
        &[r#"{"type":"user","message":{"content":"b"}}"#.to_string()],
    );
    write_session(&project, "newer", &[user_line("c", 1709251200000)]); // 2024-03-01

    let handles = extractor_for(&dir).discover();
    let order: Vec<&str> = handles.iter().map(|h| h.session_id.as_str()).collect();
    assert_eq!(order, ["newer", "older", "undated"]);
    assert_eq!(handles[0].agent, "claude");
    assert!(handles[0].timestamp.as_deref().unwrap().starts_with("2024-03-01"));
    assert!(handles[2].timestamp.is_none());
}

#[test]
fn discover_survives_unreadable_project_dir() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "proj");
    write_session(&project, "good", &[user_line("a", 1706000000000)]);
    // A stray file where a project directory is expected.
    fs::write(dir.path().join("projects").join("stray.txt"), "junk").unwrap();

    let handles = extractor_for(&dir).discover();
    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].session_id, "good");
}

#[test]
fn discover_with_missing_root_is_empty() {
    let dir = TempDir::new().unwrap();
    let handles = extractor_for(&dir).discover();
    assert!(handles.is_empty());
}

#[test]
fn redaction_hook_applies_to_all_free_text() {
    let dir = TempDir::new().unwrap();
    let project = project_dir(&dir, "proj");
    write_session(
        &project,
        "sess-redact",
        &[json!({
            "type": "assistant",
            "message": {
                "content": [
                    {"type": "thinking", "thinking": "secret plan"},
                    {"type": "text", "text": "the secret is out"},
                    {"type": "tool_use", "name": "Bash",
                     "input": {"command": "echo secret"}},
                ],
            },
        })
        .to_string()],
    );

    let config = ExtractorConfig {
        data_dir: Some(dir.path().to_path_buf()),
        redactor: Arc::new(|text: &str| text.replace("secret", "[redacted]")),
        ..Default::default()
    };
    let session = ClaudeExtractor::new(&config)
        .parse("sess-redact")
        .unwrap()
        .unwrap();
    let msg = &session.messages[0];
    assert_eq!(msg.content, "the [redacted] is out");
    assert_eq!(msg.thinking.as_deref(), Some("[redacted] plan"));
    assert_eq!(msg.tool_uses[0].input, "echo [redacted]");
}

#[test]
fn registry_builds_working_claude_extractor() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let project = project_dir(&dir, "proj");
    write_session(&project, "via-registry", &[user_line("hi", 1706000000000)]);

    let config = ExtractorConfig {
        data_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let extractor = registry::create_extractor("claude", &config).expect("built-in extractor");
    assert_eq!(extractor.agent_name(), "claude");
    assert_eq!(extractor.storage_locations(), vec![dir.path().join("projects")]);
    let session = extractor.parse("via-registry")?.expect("session found");
    assert_eq!(session.messages.len(), 1);
    Ok(())
}
