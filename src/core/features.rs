//! Feature computation from capture buffers.
//!
//! All reducers are total: empty or degenerate input yields documented
//! fallback values (usually 0) instead of NaN or an error.

use crate::capture::types::MouseSample;
use crate::core::buffers::CaptureBuffers;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Pointer kinematics for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MouseFeatures {
    /// Number of pointer samples
    pub total_moves: u64,
    /// Path length in pixels
    pub total_distance: f64,
    /// Path length in viewport widths (raw length if the width is unknown)
    pub normalized_distance: f64,
    /// Mean speed in pixels per millisecond
    pub mean_speed: f64,
    /// Population standard deviation of speed
    pub speed_std: f64,
    pub max_speed: f64,
    /// Sign changes of the horizontal or vertical displacement
    pub direction_changes: u32,
    /// Gaps between pointer samples longer than the pause threshold
    pub pause_count: u32,
    /// Shannon entropy (bits) of the speed series
    pub movement_entropy: f64,
}

/// Keystroke timing for a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyboardFeatures {
    pub total_keystrokes: u64,
    /// Mean inter-key interval
    pub mean_interval_ms: f64,
    /// Population standard deviation of inter-key intervals
    pub interval_std_ms: f64,
    pub min_interval_ms: f64,
    pub max_interval_ms: f64,
    /// Share of keystrokes that were the backward-delete key
    pub backspace_ratio: f64,
    pub paste_detected: bool,
}

/// Arithmetic mean; 0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    Statistics::mean(values.iter())
}

/// Population standard deviation (divides by N); 0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    Statistics::population_std_dev(values.iter())
}

/// Shannon entropy in bits, treating values as unnormalized weights.
///
/// Non-positive probabilities are skipped. Returns 0 for empty input or a
/// zero sum.
pub fn entropy(values: &[f64]) -> f64 {
    let total: f64 = values.iter().sum();
    if values.is_empty() || total == 0.0 {
        return 0.0;
    }

    values
        .iter()
        .map(|&v| v / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum()
}

/// Minimum and maximum; `(0, 0)` for empty input.
pub fn extrema(values: &[f64]) -> (f64, f64) {
    let mut iter = values.iter().copied();
    let Some(first) = iter.next() else {
        return (0.0, 0.0);
    };
    iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Compute pointer kinematics over an ordered sample buffer.
///
/// Pairs with a non-positive time delta still add to the distance but are
/// left out of the speed series.
pub fn compute_mouse_features(
    samples: &[MouseSample],
    pause_count: u32,
    viewport_width: Option<f64>,
) -> MouseFeatures {
    let mut total_distance = 0.0;
    let mut speeds = Vec::with_capacity(samples.len().saturating_sub(1));
    let mut direction_changes = 0;
    let mut prev_delta: Option<(f64, f64)> = None;

    for pair in samples.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let dt = b.t - a.t;

        let distance = (dx * dx + dy * dy).sqrt();
        total_distance += distance;

        if dt > 0.0 {
            speeds.push(distance / dt);
        }

        if let Some((prev_dx, prev_dy)) = prev_delta {
            if sign(dx) != sign(prev_dx) || sign(dy) != sign(prev_dy) {
                direction_changes += 1;
            }
        }
        prev_delta = Some((dx, dy));
    }

    let normalized_distance = match viewport_width {
        Some(width) if width > 0.0 => total_distance / width,
        _ => total_distance,
    };

    MouseFeatures {
        total_moves: samples.len() as u64,
        total_distance,
        normalized_distance,
        mean_speed: mean(&speeds),
        speed_std: std_dev(&speeds),
        max_speed: extrema(&speeds).1,
        direction_changes,
        pause_count,
        movement_entropy: entropy(&speeds),
    }
}

/// Compute keystroke timing features.
pub fn compute_keyboard_features(
    key_times: &[f64],
    backspace_count: u32,
    paste_detected: bool,
) -> KeyboardFeatures {
    let intervals: Vec<f64> = key_times.windows(2).map(|pair| pair[1] - pair[0]).collect();
    let (min_interval_ms, max_interval_ms) = extrema(&intervals);

    let backspace_ratio = if key_times.is_empty() {
        0.0
    } else {
        backspace_count as f64 / key_times.len() as f64
    };

    KeyboardFeatures {
        total_keystrokes: key_times.len() as u64,
        mean_interval_ms: mean(&intervals),
        interval_std_ms: std_dev(&intervals),
        min_interval_ms,
        max_interval_ms,
        backspace_ratio,
        paste_detected,
    }
}

/// Keyboard features straight from capture buffers.
pub fn keyboard_features_from(buffers: &CaptureBuffers) -> KeyboardFeatures {
    compute_keyboard_features(
        &buffers.key_times,
        buffers.backspace_count,
        buffers.paste_detected,
    )
}

// Three-valued sign, so a move that starts or stops along an axis counts as a change.
fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}
