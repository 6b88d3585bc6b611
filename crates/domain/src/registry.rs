//! Process-wide task handler registry.
//!
//! Handlers are registered once at startup; validation of a definition's
//! handler name is a membership check, and resolution happens fresh at
//! dispatch time.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reportd_core::{ReportdError, ReportdResult};

/// An invocable unit of work. Parameters are the scheduled task's stored
/// JSON object; a handler interprets its own named arguments and owns its
/// success/failure semantics.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn run(&self, params: &serde_json::Value) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<S: Into<String>>(&mut self, name: S, handler: Arc<dyn TaskHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn validate(&self, name: &str) -> ReportdResult<()> {
        if self.handlers.contains_key(name) {
            Ok(())
        } else {
            Err(ReportdError::unknown_handler(name))
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopHandler;

    #[async_trait]
    impl TaskHandler for NoopHandler {
        async fn run(&self, _params: &serde_json::Value) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn validate_is_a_membership_check() {
        let mut registry = HandlerRegistry::new();
        registry.register("run_report", Arc::new(NoopHandler));

        assert!(registry.validate("run_report").is_ok());
        let err = registry.validate("scrape_html").unwrap_err();
        assert!(matches!(err, ReportdError::UnknownHandler { ref name } if name == "scrape_html"));
    }

    #[test]
    fn resolve_returns_registered_handler() {
        let mut registry = HandlerRegistry::new();
        assert!(registry.resolve("run_report").is_none());

        registry.register("run_report", Arc::new(NoopHandler));
        assert!(registry.resolve("run_report").is_some());
        assert_eq!(registry.len(), 1);
    }
}
