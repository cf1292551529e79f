//! Host environment access: monotonic clock and display metrics.
//!
//! Everything the capture engine reads from the host goes through
//! [`EnvironmentProvider`], so sessions can run against a live host or a
//! fully scripted one.

use crate::config::EnvironmentConfig;
use chrono::{Local, Offset, Utc};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Source of time and host display metrics.
pub trait EnvironmentProvider: Send + Sync {
    /// Monotonic timestamp in milliseconds. Must never decrease.
    fn now_ms(&self) -> f64;

    /// Viewport width and height in CSS pixels, if known.
    fn viewport(&self) -> Option<(u32, u32)>;

    /// Minutes to add to local time to get UTC (positive west of UTC).
    fn timezone_offset_minutes(&self) -> i32;

    /// Ratio of physical to logical pixels, if known.
    fn device_pixel_ratio(&self) -> Option<f64>;
}

/// Shared handle to an environment provider.
pub type SharedEnvironment = Arc<dyn EnvironmentProvider>;

/// Environment backed by the real process clock and local timezone.
///
/// Viewport and pixel ratio come from configuration since a headless process
/// has no window to ask.
#[derive(Debug, Clone)]
pub struct SystemEnvironment {
    origin: Instant,
    config: EnvironmentConfig,
    timezone: Option<Tz>,
}

impl SystemEnvironment {
    pub fn new(config: EnvironmentConfig) -> Self {
        let timezone = config.timezone.as_deref().and_then(|name| match name.parse::<Tz>() {
            Ok(tz) => Some(tz),
            Err(e) => {
                tracing::warn!(timezone = name, "Ignoring invalid timezone override: {e}");
                None
            }
        });

        Self {
            origin: Instant::now(),
            config,
            timezone,
        }
    }
}

impl Default for SystemEnvironment {
    fn default() -> Self {
        Self::new(EnvironmentConfig::default())
    }
}

impl EnvironmentProvider for SystemEnvironment {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn viewport(&self) -> Option<(u32, u32)> {
        match (self.config.viewport_width, self.config.viewport_height) {
            (Some(w), Some(h)) => Some((w, h)),
            (Some(w), None) => Some((w, 0)),
            (None, Some(h)) => Some((0, h)),
            (None, None) => None,
        }
    }

    fn timezone_offset_minutes(&self) -> i32 {
        let local_minus_utc = match self.timezone {
            Some(tz) => Utc::now().with_timezone(&tz).offset().fix().local_minus_utc(),
            None => Local::now().offset().local_minus_utc(),
        };
        -local_minus_utc / 60
    }

    fn device_pixel_ratio(&self) -> Option<f64> {
        self.config.device_pixel_ratio
    }
}

/// Scripted environment with a manually driven clock.
///
/// The clock only moves when told to; `set_ms` refuses to go backwards.
#[derive(Debug)]
pub struct ManualEnvironment {
    now_bits: AtomicU64,
    viewport: Option<(u32, u32)>,
    timezone_offset_minutes: i32,
    device_pixel_ratio: Option<f64>,
}

impl ManualEnvironment {
    /// Clock at zero, 1280x720 viewport, UTC, pixel ratio 1.
    pub fn new() -> Self {
        Self {
            now_bits: AtomicU64::new(0f64.to_bits()),
            viewport: Some((1280, 720)),
            timezone_offset_minutes: 0,
            device_pixel_ratio: Some(1.0),
        }
    }

    pub fn with_viewport(mut self, viewport: Option<(u32, u32)>) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_timezone_offset(mut self, minutes: i32) -> Self {
        self.timezone_offset_minutes = minutes;
        self
    }

    pub fn with_device_pixel_ratio(mut self, ratio: Option<f64>) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    /// Move the clock to `t` milliseconds. Earlier instants are ignored.
    pub fn set_ms(&self, t: f64) {
        if t.is_finite() && t > self.now_ms() {
            self.now_bits.store(t.to_bits(), Ordering::SeqCst);
        }
    }

    /// Advance the clock by `delta` milliseconds.
    pub fn advance_ms(&self, delta: f64) {
        self.set_ms(self.now_ms() + delta);
    }
}

impl Default for ManualEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentProvider for ManualEnvironment {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.now_bits.load(Ordering::SeqCst))
    }

    fn viewport(&self) -> Option<(u32, u32)> {
        self.viewport
    }

    fn timezone_offset_minutes(&self) -> i32 {
        self.timezone_offset_minutes
    }

    fn device_pixel_ratio(&self) -> Option<f64> {
        self.device_pixel_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_monotonic() {
        let env = ManualEnvironment::new();
        env.set_ms(100.0);
        env.set_ms(50.0);
        assert_eq!(env.now_ms(), 100.0);

        env.advance_ms(25.0);
        assert_eq!(env.now_ms(), 125.0);
    }

    #[test]
    fn test_system_clock_does_not_decrease() {
        let env = SystemEnvironment::default();
        let a = env.now_ms();
        let b = env.now_ms();
        assert!(b >= a);
    }

    #[test]
    fn test_timezone_override() {
        let env = SystemEnvironment::new(EnvironmentConfig {
            timezone: Some("Etc/GMT+5".to_string()),
            ..EnvironmentConfig::default()
        });
        // Etc/GMT+5 is UTC-05:00, i.e. 300 minutes west
        assert_eq!(env.timezone_offset_minutes(), 300);
    }

    #[test]
    fn test_invalid_timezone_falls_back_to_local() {
        let env = SystemEnvironment::new(EnvironmentConfig {
            timezone: Some("Not/AZone".to_string()),
            ..EnvironmentConfig::default()
        });
        assert_eq!(
            env.timezone_offset_minutes(),
            -Local::now().offset().local_minus_utc() / 60
        );
    }

    #[test]
    fn test_viewport_from_config() {
        let env = SystemEnvironment::new(EnvironmentConfig {
            viewport_width: Some(1024),
            ..EnvironmentConfig::default()
        });
        assert_eq!(env.viewport(), Some((1024, 0)));
        assert_eq!(SystemEnvironment::default().viewport(), None);
    }
}
