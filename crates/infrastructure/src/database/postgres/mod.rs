mod definition_repository;
mod report_repository;
mod scheduled_task_repository;

pub use definition_repository::PostgresDefinitionRepository;
pub use report_repository::PostgresReportRepository;
pub use scheduled_task_repository::PostgresScheduledTaskRepository;
