//! Write-side service for task definitions.
//!
//! The single invariant: a definition's handler name must resolve in
//! the registry before anything is persisted.

use std::sync::Arc;

use reportd_core::ReportdResult;
use reportd_domain::{
    HandlerRegistry, NewTaskDefinition, TaskDefinition, TaskDefinitionRepository,
};
use tracing::info;

pub struct DefinitionService {
    registry: Arc<HandlerRegistry>,
    definitions: Arc<dyn TaskDefinitionRepository>,
}

impl DefinitionService {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        definitions: Arc<dyn TaskDefinitionRepository>,
    ) -> Self {
        Self {
            registry,
            definitions,
        }
    }

    pub async fn create(&self, definition: NewTaskDefinition) -> ReportdResult<TaskDefinition> {
        self.registry.validate(&definition.handler)?;

        let created = self.definitions.create(&definition).await?;
        info!(
            name = %created.name,
            handler = %created.handler,
            "task definition created"
        );
        Ok(created)
    }

    pub async fn update(&self, definition: &TaskDefinition) -> ReportdResult<()> {
        self.registry.validate(&definition.handler)?;
        self.definitions.update(definition).await
    }
}
