//! Flattening of variably-shaped message content into canonical form.
//!
//! Sources encode message bodies either as a flat string or as a list of
//! typed blocks (text, reasoning, tool invocation). [`extract_content`]
//! folds both shapes into one `(content, thinking, tool_uses)` triple and
//! applies the redaction hook to every piece of free text on the way out.

use serde_json::Value;

use crate::model::ToolCall;
use crate::redact::Redactor;

/// Longest tool-argument summary we will emit.
const MAX_SUMMARY_CHARS: usize = 200;

/// One typed unit inside a content list.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentSegment {
    Text(String),
    Thinking(String),
    ToolUse { name: String, input: Value },
}

impl ContentSegment {
    /// Decode a raw content block. Blocks with an unrecognized `type` tag
    /// yield `None` and are ignored by callers.
    pub fn from_value(block: &Value) -> Option<Self> {
        match block.get("type").and_then(|v| v.as_str())? {
            "text" => block
                .get("text")
                .and_then(|v| v.as_str())
                .map(|s| Self::Text(s.to_string())),
            "thinking" | "reasoning" => block
                .get("thinking")
                .or_else(|| block.get("text"))
                .and_then(|v| v.as_str())
                .map(|s| Self::Thinking(s.to_string())),
            "tool_use" | "tool_use_in_progress" => {
                let name = block.get("name").and_then(|v| v.as_str()).unwrap_or("tool");
                Some(Self::ToolUse {
                    name: name.to_string(),
                    input: block.get("input").cloned().unwrap_or(Value::Null),
                })
            }
            _ => None,
        }
    }
}

/// Canonical output of content extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContent {
    pub content: String,
    pub thinking: Option<String>,
    pub tool_uses: Vec<ToolCall>,
}

/// Flatten a raw content value (flat string or block list) into
/// [`ExtractedContent`].
///
/// Text blocks are joined with newlines; reasoning blocks are concatenated
/// in order with a blank line between them; tool blocks become summarized
/// [`ToolCall`]s. Returns `None` when the redacted content is empty after
/// trimming and no tool use survives, which callers treat as "drop this
/// message".
pub fn extract_content(
    raw: &Value,
    redactor: &dyn Redactor,
    include_thinking: bool,
) -> Option<ExtractedContent> {
    let mut text_parts: Vec<String> = Vec::new();
    let mut thinking_parts: Vec<String> = Vec::new();
    let mut tool_uses: Vec<ToolCall> = Vec::new();

    match raw {
        Value::String(s) => text_parts.push(s.clone()),
        Value::Array(blocks) => {
            for block in blocks {
                match ContentSegment::from_value(block) {
                    Some(ContentSegment::Text(text)) => text_parts.push(text),
                    Some(ContentSegment::Thinking(text)) => {
                        if include_thinking {
                            thinking_parts.push(text);
                        }
                    }
                    Some(ContentSegment::ToolUse { name, input }) => {
                        let summary = summarize_tool_input(&name, &input, redactor);
                        tool_uses.push(ToolCall { tool: name, input: summary });
                    }
                    None => {}
                }
            }
        }
        _ => return None,
    }

    let content = redactor.redact(&text_parts.join("\n")).trim().to_string();
    if content.is_empty() && tool_uses.is_empty() {
        return None;
    }

    let thinking = if thinking_parts.is_empty() {
        None
    } else {
        Some(redactor.redact(&thinking_parts.join("\n\n")))
    };

    Some(ExtractedContent { content, thinking, tool_uses })
}

/// Produce a short human-readable summary of a tool invocation's arguments.
///
/// Known tools surface their most telling argument; file writes surface the
/// target path and a character count instead of the payload, so summaries
/// stay bounded and never embed file contents. Unknown tools fall back to
/// truncated compact JSON.
pub fn summarize_tool_input(tool: &str, input: &Value, redactor: &dyn Redactor) -> String {
    let summary = match tool {
        "Read" | "Edit" | "MultiEdit" | "NotebookRead" => input
            .get("file_path")
            .and_then(|v| v.as_str())
            .map(String::from),
        "Write" | "NotebookEdit" => input.get("file_path").and_then(|v| v.as_str()).map(|path| {
            let chars = input
                .get("content")
                .and_then(|v| v.as_str())
                .map(|c| c.chars().count())
                .unwrap_or(0);
            format!("{path} ({chars} chars)")
        }),
        "Bash" => input.get("command").and_then(|v| v.as_str()).map(String::from),
        "Grep" => input.get("pattern").and_then(|v| v.as_str()).map(|pattern| {
            match input.get("path").and_then(|v| v.as_str()) {
                Some(path) => format!("{pattern} in {path}"),
                None => pattern.to_string(),
            }
        }),
        "Glob" => input.get("pattern").and_then(|v| v.as_str()).map(String::from),
        "WebFetch" => input.get("url").and_then(|v| v.as_str()).map(String::from),
        "WebSearch" => input.get("query").and_then(|v| v.as_str()).map(String::from),
        "Task" => input
            .get("description")
            .or_else(|| input.get("prompt"))
            .and_then(|v| v.as_str())
            .map(String::from),
        _ => None,
    };

    let summary = summary.unwrap_or_else(|| match input {
        Value::Null => String::new(),
        other => other.to_string(),
    });

    redactor.redact(&truncate_chars(&summary, MAX_SUMMARY_CHARS))
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push_str("...");
        out
    }
}
