//! `igams-core` — measurement and control feedback engine.
//!
//! Converts daily execution records into normalized performance signals,
//! detects issue events, and derives process-improvement suggestions under a
//! fixed policy: reduce effort and waste, never add pressure, never blame the
//! actor.
//!
//! ```text
//! LogStore ──► metrics::compute ─┐
//!          └─► issues::detect ───┴─► RecommendationEngine ──► caller
//!                                                         └─► AdvisoryBridge (optional)
//! ```

pub mod advisory;
pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod issues;
pub mod metrics;
pub mod policy;
pub mod rules;
pub mod sqlite;
pub mod store;
pub mod types;

pub use error::{ControlError, Result};
