//! HTTP-level integration tests driving the router in-process.

mod active_task_test;
mod health_test;
mod helpers;
mod history_test;
