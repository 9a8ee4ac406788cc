//! Job-board service library: application lifecycle tracking and saved-job bookmarks.
//!
//! The binary in `main.rs` wires the HTTP surface; everything behavioral lives here so
//! the integration suites can drive the service facades directly.

pub mod applications;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod saved_jobs;
pub mod storage;
pub mod telemetry;
