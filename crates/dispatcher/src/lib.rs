pub mod definitions;
pub mod dispatcher;
pub mod recurrence;
pub mod report;
pub mod scheduler;

pub use definitions::DefinitionService;
pub use dispatcher::{DispatchOutcome, TaskDispatcher};
pub use recurrence::RecurrenceSchedule;
pub use report::{ReportPipeline, ReportRunHandler, RunOutcome};
pub use scheduler::ScheduleRunner;
