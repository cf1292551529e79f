//! Transparency module for the login behavior sensor.
//!
//! Exposes counts of what was captured so hosts can audit the sensor
//! without inspecting raw telemetry.

pub mod log;

// Re-export commonly used types
pub use log::{create_shared_log, SharedTransparencyLog, TransparencyLog, TransparencyStats};
