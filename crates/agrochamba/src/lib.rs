//! Core library for the AgroChamba job marketplace backend.
//!
//! The `marketplace` module carries the application-status workflow: the
//! state machine governing how a worker's application progresses and the
//! dual-write store keeping the worker-side and job-side copies aligned.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;
