//! Foundation module - Core utilities and types
//!
//! - Math aliases
//! - Wall-clock sources and the fixed-timestep accumulator
//! - Logging setup
//! - Background worker pool

pub mod logging;
pub mod math;
pub mod time;
pub mod worker_pool;
