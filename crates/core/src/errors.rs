use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportdError {
    #[error("scheduled task not found: id={id}")]
    TaskNotFound { id: i64 },
    #[error("report not found: name={name}")]
    ReportNotFound { name: String },
    #[error("unknown task handler: {name}")]
    UnknownHandler { name: String },
    #[error("invalid recurrence '{expr}': {message}")]
    InvalidRecurrence { expr: String, message: String },
    #[error("database operation failed: {0}")]
    Database(String),
    #[error("lock backend operation failed: {0}")]
    LockBackend(String),
    #[error("upstream fetch failed: {0}")]
    Upstream(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("task execution failed: {0}")]
    Execution(String),
}

pub type ReportdResult<T> = Result<T, ReportdError>;

impl ReportdError {
    pub fn task_not_found(id: i64) -> Self {
        Self::TaskNotFound { id }
    }
    pub fn report_not_found<S: Into<String>>(name: S) -> Self {
        Self::ReportNotFound { name: name.into() }
    }
    pub fn unknown_handler<S: Into<String>>(name: S) -> Self {
        Self::UnknownHandler { name: name.into() }
    }
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::Database(msg.into())
    }
    pub fn lock_error<S: Into<String>>(msg: S) -> Self {
        Self::LockBackend(msg.into())
    }
    pub fn upstream_error<S: Into<String>>(msg: S) -> Self {
        Self::Upstream(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn execution_error<S: Into<String>>(msg: S) -> Self {
        Self::Execution(msg.into())
    }

    /// Transient failures that the next scheduled run may clear on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReportdError::Database(_) | ReportdError::LockBackend(_) | ReportdError::Upstream(_)
        )
    }
}

impl From<sqlx::Error> for ReportdError {
    fn from(err: sqlx::Error) -> Self {
        ReportdError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for ReportdError {
    fn from(err: redis::RedisError) -> Self {
        ReportdError::LockBackend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ReportdError::upstream_error("timeout").is_retryable());
        assert!(ReportdError::database_error("pool exhausted").is_retryable());
        assert!(!ReportdError::unknown_handler("nope").is_retryable());
        assert!(!ReportdError::task_not_found(42).is_retryable());
    }

    #[test]
    fn error_messages_carry_identity() {
        let err = ReportdError::task_not_found(7);
        assert!(err.to_string().contains("id=7"));

        let err = ReportdError::report_not_found("supplier_balance");
        assert!(err.to_string().contains("supplier_balance"));
    }
}
