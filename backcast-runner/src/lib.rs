//! Backcast Runner — replay orchestration, run results, and performance
//! analytics.
//!
//! The [`engine::Engine`] merges the caller's pre-materialized bar and
//! signal streams, drives the `backcast-core` broker bar by bar, and
//! returns a [`result::RunResult`]. [`metrics::compute_metrics`] turns
//! that result into return, risk, and trade-quality statistics, with a
//! per-strategy breakdown. [`batch::run_batch`] parallelizes independent
//! runs; within a run everything is single-threaded and deterministic.

pub mod batch;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod result;

pub use config::RunConfig;
pub use engine::Engine;
pub use metrics::{compute_metrics, PerformanceMetrics};
pub use result::{EquityPoint, RunResult};
