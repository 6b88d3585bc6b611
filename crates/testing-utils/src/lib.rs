//! In-memory test doubles shared across the workspace's test suites.

pub mod builders;
pub mod mocks;
