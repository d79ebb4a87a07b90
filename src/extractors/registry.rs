//! Name-keyed lookup of source extractors.
//!
//! The process-wide registry is built once, on first use, with the built-in
//! extractors, and stays read-mostly afterwards. Registration may overwrite
//! an existing entry; that is warned about, never an error, so tests can
//! install doubles.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::claude::ClaudeExtractor;
use super::cursor::CursorExtractor;
use super::{ExtractorConfig, SourceExtractor};

/// Constructor for a configured extractor instance.
pub type ExtractorFactory = fn(&ExtractorConfig) -> Box<dyn SourceExtractor>;

pub struct ParserRegistry {
    entries: RwLock<BTreeMap<String, ExtractorFactory>>,
}

impl ParserRegistry {
    pub fn empty() -> Self {
        Self { entries: RwLock::new(BTreeMap::new()) }
    }

    /// A registry populated with the built-in extractors.
    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        registry.register("claude", |config| Box::new(ClaudeExtractor::new(config)));
        registry.register("cursor", |config| Box::new(CursorExtractor::new(config)));
        registry
    }

    /// Add or overwrite an entry. Overwriting logs a warning and succeeds.
    pub fn register(&self, name: &str, factory: ExtractorFactory) {
        let mut entries = self.entries.write();
        if entries.insert(name.to_string(), factory).is_some() {
            tracing::warn!(name, "overwriting existing extractor registration");
        } else {
            tracing::debug!(name, "registered extractor");
        }
    }

    pub fn get(&self, name: &str) -> Option<ExtractorFactory> {
        self.entries.read().get(name).copied()
    }

    /// Construct a configured extractor, or `None` for an unknown name.
    pub fn create(
        &self,
        name: &str,
        config: &ExtractorConfig,
    ) -> Option<Box<dyn SourceExtractor>> {
        self.get(name).map(|factory| factory(config))
    }

    /// All registered names, sorted.
    pub fn list(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }
}

static REGISTRY: Lazy<ParserRegistry> = Lazy::new(ParserRegistry::with_builtins);

/// The process-wide registry holding the built-in extractors.
pub fn global() -> &'static ParserRegistry {
    &REGISTRY
}

/// Convenience wrapper over [`global`]: construct an extractor by name.
pub fn create_extractor(name: &str, config: &ExtractorConfig) -> Option<Box<dyn SourceExtractor>> {
    global().create(name, config)
}
