//! Property-based tests for task draining and teardown

mod task_drain;
mod teardown_once;
