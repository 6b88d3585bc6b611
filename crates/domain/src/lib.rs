pub mod entities;
pub mod locking;
pub mod ports;
pub mod registry;
pub mod repositories;

pub use entities::{NewTaskDefinition, Recurrence, ReportRecord, ScheduledTask, TaskDefinition};
pub use locking::TaskLock;
pub use ports::{LockStore, ReportSource};
pub use registry::{HandlerRegistry, TaskHandler};
pub use repositories::{ReportRepository, ScheduledTaskRepository, TaskDefinitionRepository};
