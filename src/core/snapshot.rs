//! Feature vector snapshots.
//!
//! A snapshot is a point-in-time reduction of the session's clock and
//! buffers. Taking one never changes session state, but two snapshots of the
//! same buffers differ in their timing fields because time has passed.

use crate::core::buffers::CaptureBuffers;
use crate::core::clock::ActivityClock;
use crate::core::environment::EnvironmentProvider;
use crate::core::features::{
    compute_mouse_features, keyboard_features_from, KeyboardFeatures, MouseFeatures,
};
use serde::{Deserialize, Serialize};

/// Discrete interaction counts and rates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionFeatures {
    pub click_count: u32,
    pub scroll_count: u32,
    pub focus_changes: u32,
    /// Pointer samples per keystroke (raw sample count without keystrokes)
    pub mouse_keyboard_ratio: f64,
    /// Clicks, scrolls and focus changes per millisecond
    pub interaction_rate: f64,
}

/// Session timing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingFeatures {
    pub session_duration_ms: f64,
    pub time_to_first_action_ms: f64,
    /// Share of the session spent in idle gaps
    pub idle_time_ratio: f64,
}

/// Host display metrics read at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentFeatures {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Minutes, UTC minus local time
    pub timezone_offset: i32,
    pub device_pixel_ratio: f64,
}

impl Default for EnvironmentFeatures {
    fn default() -> Self {
        Self {
            viewport_width: 0,
            viewport_height: 0,
            timezone_offset: 0,
            device_pixel_ratio: 1.0,
        }
    }
}

impl EnvironmentFeatures {
    /// Read the current host metrics, substituting defaults for anything unknown.
    pub fn capture(env: &dyn EnvironmentProvider) -> Self {
        let (viewport_width, viewport_height) = env.viewport().unwrap_or((0, 0));
        let device_pixel_ratio = env
            .device_pixel_ratio()
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(1.0);

        Self {
            viewport_width,
            viewport_height,
            timezone_offset: env.timezone_offset_minutes(),
            device_pixel_ratio,
        }
    }
}

/// The complete feature vector handed to the risk-scoring collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub mouse: MouseFeatures,
    pub keyboard: KeyboardFeatures,
    pub interaction: InteractionFeatures,
    pub timing: TimingFeatures,
    pub environment: EnvironmentFeatures,
}

/// Dotted field names in the order used by [`FeatureVector::to_ordered_values`].
pub const FEATURE_ORDER: [&str; 28] = [
    "mouse.total_moves",
    "mouse.total_distance",
    "mouse.normalized_distance",
    "mouse.mean_speed",
    "mouse.speed_std",
    "mouse.max_speed",
    "mouse.direction_changes",
    "mouse.pause_count",
    "mouse.movement_entropy",
    "keyboard.total_keystrokes",
    "keyboard.mean_interval_ms",
    "keyboard.interval_std_ms",
    "keyboard.min_interval_ms",
    "keyboard.max_interval_ms",
    "keyboard.backspace_ratio",
    "keyboard.paste_detected",
    "interaction.click_count",
    "interaction.scroll_count",
    "interaction.focus_changes",
    "interaction.mouse_keyboard_ratio",
    "interaction.interaction_rate",
    "timing.session_duration_ms",
    "timing.time_to_first_action_ms",
    "timing.idle_time_ratio",
    "environment.viewport_width",
    "environment.viewport_height",
    "environment.timezone_offset",
    "environment.device_pixel_ratio",
];

impl FeatureVector {
    /// Flatten into a fixed-length numeric vector, booleans as 1.0/0.0.
    pub fn to_ordered_values(&self) -> Vec<f64> {
        let m = &self.mouse;
        let k = &self.keyboard;
        let i = &self.interaction;
        let t = &self.timing;
        let e = &self.environment;

        vec![
            m.total_moves as f64,
            m.total_distance,
            m.normalized_distance,
            m.mean_speed,
            m.speed_std,
            m.max_speed,
            m.direction_changes as f64,
            m.pause_count as f64,
            m.movement_entropy,
            k.total_keystrokes as f64,
            k.mean_interval_ms,
            k.interval_std_ms,
            k.min_interval_ms,
            k.max_interval_ms,
            k.backspace_ratio,
            if k.paste_detected { 1.0 } else { 0.0 },
            i.click_count as f64,
            i.scroll_count as f64,
            i.focus_changes as f64,
            i.mouse_keyboard_ratio,
            i.interaction_rate,
            t.session_duration_ms,
            t.time_to_first_action_ms,
            t.idle_time_ratio,
            e.viewport_width as f64,
            e.viewport_height as f64,
            e.timezone_offset as f64,
            e.device_pixel_ratio,
        ]
    }

    /// Serialize to the nested JSON object the transport embeds as `behavior`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Composes clock state and buffer reductions into a [`FeatureVector`].
pub struct SnapshotAssembler;

impl SnapshotAssembler {
    /// Build a snapshot as of `env.now_ms()`.
    pub fn assemble(
        clock: &ActivityClock,
        buffers: &CaptureBuffers,
        env: &dyn EnvironmentProvider,
    ) -> FeatureVector {
        let now = env.now_ms();
        let environment = EnvironmentFeatures::capture(env);

        let viewport_width = Some(environment.viewport_width as f64);
        let mouse = compute_mouse_features(&buffers.mouse_moves, clock.pause_count, viewport_width);
        let keyboard = keyboard_features_from(buffers);

        let session_duration_ms = clock.session_duration_ms(now);
        let timing = TimingFeatures {
            session_duration_ms,
            time_to_first_action_ms: clock.time_to_first_action_ms(),
            idle_time_ratio: ratio(clock.idle_time_ms, session_duration_ms),
        };

        let mouse_keyboard_ratio = if keyboard.total_keystrokes > 0 {
            mouse.total_moves as f64 / keyboard.total_keystrokes as f64
        } else {
            mouse.total_moves as f64
        };
        let discrete = buffers.click_count + buffers.scroll_count + buffers.focus_changes;
        let interaction = InteractionFeatures {
            click_count: buffers.click_count,
            scroll_count: buffers.scroll_count,
            focus_changes: buffers.focus_changes,
            mouse_keyboard_ratio,
            interaction_rate: ratio(discrete as f64, session_duration_ms),
        };

        FeatureVector {
            mouse,
            keyboard,
            interaction,
            timing,
            environment,
        }
    }
}

fn ratio(numerator: f64, duration_ms: f64) -> f64 {
    if duration_ms > 0.0 {
        numerator / duration_ms
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::InteractionEvent;
    use crate::core::buffers::EventCapture;
    use crate::core::environment::ManualEnvironment;

    #[test]
    fn test_feature_order_matches_values() {
        let vector = FeatureVector::default();
        assert_eq!(vector.to_ordered_values().len(), FEATURE_ORDER.len());
    }

    #[test]
    fn test_json_shape() {
        let json = FeatureVector::default().to_json();
        for name in FEATURE_ORDER {
            let (group, field) = name.split_once('.').unwrap();
            assert!(json[group].get(field).is_some(), "missing {name}");
        }
        assert_eq!(json["keyboard"]["paste_detected"], serde_json::json!(false));
    }

    #[test]
    fn test_unstarted_snapshot_is_zero() {
        let env = ManualEnvironment::new();
        env.set_ms(5000.0);
        let clock = ActivityClock::new(300.0, 250.0);
        let vector = SnapshotAssembler::assemble(&clock, &CaptureBuffers::default(), &env);

        assert_eq!(vector.timing, TimingFeatures::default());
        assert_eq!(vector.mouse, MouseFeatures::default());
        assert_eq!(vector.interaction, InteractionFeatures::default());
        assert_eq!(vector.environment.viewport_width, 1280);
    }

    #[test]
    fn test_timing_and_interaction() {
        let env = ManualEnvironment::new();
        let capture = EventCapture::default();
        let mut clock = ActivityClock::new(300.0, 250.0);
        let mut buffers = CaptureBuffers::default();
        clock.start(0.0);

        capture.apply(&mut clock, &mut buffers, &InteractionEvent::FocusIn, 500.0);
        capture.apply(&mut clock, &mut buffers, &InteractionEvent::pointer_move(1.0, 1.0), 600.0);
        capture.apply(&mut clock, &mut buffers, &InteractionEvent::pointer_move(2.0, 2.0), 700.0);
        capture.apply(&mut clock, &mut buffers, &InteractionEvent::Click, 800.0);
        env.set_ms(1000.0);

        let vector = SnapshotAssembler::assemble(&clock, &buffers, &env);
        assert_eq!(vector.timing.session_duration_ms, 1000.0);
        assert_eq!(vector.timing.time_to_first_action_ms, 500.0);
        assert_eq!(vector.timing.idle_time_ratio, 0.5);
        assert_eq!(vector.interaction.mouse_keyboard_ratio, 2.0);
        assert_eq!(vector.interaction.interaction_rate, 2.0 / 1000.0);
    }

    #[test]
    fn test_unknown_host_metrics() {
        let env = ManualEnvironment::new()
            .with_viewport(None)
            .with_device_pixel_ratio(None);
        let environment = EnvironmentFeatures::capture(&env);

        assert_eq!(environment, EnvironmentFeatures::default());
    }
}
