//! Core functionality of the login behavior sensor.
//!
//! This module contains:
//! - The session activity clock (first/last action, idle time, pauses)
//! - Per-channel capture buffers and the handlers that fill them
//! - Feature computation over the buffers
//! - Snapshot assembly into the feature vector
//! - The host environment abstraction

pub mod buffers;
pub mod clock;
pub mod environment;
pub mod features;
pub mod snapshot;

// Re-export commonly used types
pub use buffers::{CaptureBuffers, EventCapture};
pub use clock::ActivityClock;
pub use environment::{EnvironmentProvider, ManualEnvironment, SharedEnvironment, SystemEnvironment};
pub use features::{
    compute_keyboard_features, compute_mouse_features, entropy, extrema, mean, std_dev,
    KeyboardFeatures, MouseFeatures,
};
pub use snapshot::{
    EnvironmentFeatures, FeatureVector, InteractionFeatures, SnapshotAssembler, TimingFeatures,
    FEATURE_ORDER,
};
