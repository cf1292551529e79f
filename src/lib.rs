//! Login Behavior Sensor - interaction telemetry for bot detection.
//!
//! This library captures raw interaction events on a login form (pointer
//! movement, key presses, focus changes, clicks, scrolls, pastes) and reduces
//! them to a fixed-shape feature vector for an external risk-scoring service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Login Behavior Sensor                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  EventHub   │──▶│   Session   │──▶│  Snapshot   │       │
//! │  │ (host glue) │   │ clock+bufs  │   │  (features) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                           │                  │              │
//! │                           ▼                  ▼              │
//! │                    ┌─────────────┐   ┌─────────────┐       │
//! │                    │Transparency │   │  Transport  │       │
//! │                    │    Log      │   │ (optional)  │       │
//! │                    └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use login_behavior_sensor::{
//!     BehaviorSession, Config, EventHub, InteractionEvent, ManualEnvironment,
//! };
//!
//! let env = Arc::new(ManualEnvironment::new());
//! let hub = EventHub::new(env.clone(), 1024);
//! let mut session = BehaviorSession::new(&Config::default(), env.clone());
//! session.start_with(&hub).expect("hub is open");
//!
//! env.set_ms(120.0);
//! hub.emit(InteractionEvent::pointer_move(10.0, 20.0));
//! session.pump();
//!
//! let features = session.snapshot();
//! assert_eq!(features.mouse.total_moves, 1);
//! ```

pub mod capture;
pub mod config;
pub mod core;
pub mod replay;
pub mod session;
pub mod transparency;

#[cfg(feature = "transport")]
pub mod transport;

// Re-export key types at crate root for convenience
pub use capture::{
    CaptureError, CapturedEvent, EventEmitter, EventHub, EventSource, InteractionEvent,
    MouseSample, NoopSource, Subscription,
};
pub use config::{Config, ConfigError, EnvironmentConfig, Thresholds};
pub use core::{
    EnvironmentProvider, FeatureVector, ManualEnvironment, SharedEnvironment, SystemEnvironment,
    FEATURE_ORDER,
};
pub use replay::{parse_records, replay_records, ReplayError};
pub use session::BehaviorSession;
pub use transparency::{SharedTransparencyLog, TransparencyLog, TransparencyStats};

// Transport re-exports (when enabled)
#[cfg(feature = "transport")]
pub use transport::{
    AuthClient, BlockingAuthClient, Decision, LoginRequest, LoginResponse, TransportError,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Capture declaration that can be displayed to users.
pub const CAPTURE_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║          LOGIN BEHAVIOR SENSOR - CAPTURE DECLARATION             ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This sensor summarizes how a login form is used, to tell        ║
║  people apart from automated submissions.                        ║
║                                                                  ║
║  ✓ WHAT WE CAPTURE (for this login attempt only):                ║
║    • Pointer positions and timing inside the page                ║
║    • When keys are pressed, and whether a key was Backspace      ║
║    • Counts of clicks, scrolls, focus changes and pastes         ║
║    • Viewport size, pixel ratio and timezone offset              ║
║                                                                  ║
║  ✗ WHAT WE NEVER CAPTURE:                                        ║
║    • Which characters you type (no passwords or usernames)       ║
║    • Clipboard contents                                          ║
║    • Anything outside the current session                        ║
║                                                                  ║
║  Only the derived feature summary leaves this process.           ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
