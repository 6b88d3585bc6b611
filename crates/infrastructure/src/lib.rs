pub mod database;
pub mod http_source;
pub mod memory_lock;
pub mod redis_lock;

pub use database::create_pool;
pub use database::postgres::{
    PostgresDefinitionRepository, PostgresReportRepository, PostgresScheduledTaskRepository,
};
pub use http_source::HttpReportSource;
pub use memory_lock::InMemoryLockStore;
pub use redis_lock::RedisLockStore;
