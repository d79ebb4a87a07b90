//! Redaction hook applied to free text before it enters normalized output.
//!
//! The matching logic itself lives outside this crate; extractors only call
//! an injected [`Redactor`] at every point where free text (message content,
//! reasoning, tool-argument summaries) is emitted.

/// Text-to-text transform applied to all free text.
pub trait Redactor: Send + Sync {
    fn redact(&self, text: &str) -> String;
}

/// Pass-through used when no redaction capability is injected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRedactor;

impl Redactor for NoopRedactor {
    fn redact(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Closures double as redactors, so callers and tests can inject one inline.
impl<F> Redactor for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn redact(&self, text: &str) -> String {
        self(text)
    }
}
