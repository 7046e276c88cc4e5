use super::runtime::{GoRuntime, NodeRuntime, PythonRuntime, RubyRuntime, Runtime};
use super::LanguageId;
use std::collections::HashMap;
use std::sync::Arc;

/// Runtime capabilities keyed by language
pub struct RuntimeRegistry {
    runtimes: HashMap<LanguageId, Arc<dyn Runtime>>,
}

impl RuntimeRegistry {
    pub fn new() -> Self {
        Self {
            runtimes: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        for id in LanguageId::all_variants() {
            let runtime: Arc<dyn Runtime> = match id {
                LanguageId::Python => Arc::new(PythonRuntime),
                LanguageId::JavaScript => Arc::new(NodeRuntime),
                LanguageId::Ruby => Arc::new(RubyRuntime),
                LanguageId::Go => Arc::new(GoRuntime),
            };
            registry.register(runtime);
        }

        registry
    }

    /// Registers a runtime, replacing any previous one for the same language
    pub fn register(&mut self, runtime: Arc<dyn Runtime>) {
        self.runtimes.insert(runtime.language(), runtime);
    }

    pub fn get(&self, language: LanguageId) -> Option<&dyn Runtime> {
        self.runtimes.get(&language).map(|r| r.as_ref())
    }

    pub fn languages(&self) -> Vec<LanguageId> {
        let mut languages: Vec<_> = self.runtimes.keys().copied().collect();
        languages.sort_by_key(|l| l.key());
        languages
    }
}

impl Default for RuntimeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
