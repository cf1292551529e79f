//! Session activity clock.
//!
//! Tracks when the session started, when the first and last actions happened,
//! and how much time was spent idle between actions.

use serde::{Deserialize, Serialize};

/// Clock state for one session. All instants are monotonic milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivityClock {
    /// Session start instant (None before the session starts)
    pub start_time: Option<f64>,
    /// First recorded action of any kind; set at most once
    pub first_action_time: Option<f64>,
    /// Most recent recorded action
    pub last_action_time: Option<f64>,
    /// Sum of gaps longer than the idle threshold
    pub idle_time_ms: f64,
    /// Number of gaps between pointer movements longer than the pause threshold
    pub pause_count: u32,
    /// Most recent pointer movement
    pub last_mouse_time: Option<f64>,
    idle_threshold_ms: f64,
    pause_threshold_ms: f64,
}

impl ActivityClock {
    /// Create a clock that has not started yet.
    pub fn new(idle_threshold_ms: f64, pause_threshold_ms: f64) -> Self {
        Self {
            idle_threshold_ms,
            pause_threshold_ms,
            ..Self::default()
        }
    }

    /// Reset all state and start a session at `now`.
    ///
    /// The start instant doubles as the last action, so a slow first action
    /// counts towards idle time.
    pub fn start(&mut self, now: f64) {
        *self = Self::new(self.idle_threshold_ms, self.pause_threshold_ms);
        self.start_time = Some(now);
        self.last_action_time = Some(now);
    }

    /// Record an action of any kind at `now`.
    pub fn record_action(&mut self, now: f64) {
        if self.first_action_time.is_none() {
            self.first_action_time = Some(now);
        }

        if let Some(last) = self.last_action_time {
            let gap = now - last;
            if gap > self.idle_threshold_ms {
                self.idle_time_ms += gap;
            }
        }

        self.last_action_time = Some(now);
    }

    /// Record a pointer movement at `now`, counting a pause if the previous
    /// movement was long enough ago.
    ///
    /// This does not record an action; callers do that separately.
    pub fn record_mouse_move(&mut self, now: f64) {
        if let Some(last) = self.last_mouse_time {
            if now - last > self.pause_threshold_ms {
                self.pause_count += 1;
            }
        }
        self.last_mouse_time = Some(now);
    }

    /// Milliseconds since the session started, or 0 if it has not.
    pub fn session_duration_ms(&self, now: f64) -> f64 {
        match self.start_time {
            Some(start) => (now - start).max(0.0),
            None => 0.0,
        }
    }

    /// Milliseconds from session start to the first action, or 0 if none yet.
    pub fn time_to_first_action_ms(&self) -> f64 {
        match (self.start_time, self.first_action_time) {
            (Some(start), Some(first)) => first - start,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> ActivityClock {
        ActivityClock::new(300.0, 250.0)
    }

    #[test]
    fn test_first_action_set_once() {
        let mut clock = clock();
        clock.start(0.0);
        clock.record_action(10.0);
        clock.record_action(20.0);

        assert_eq!(clock.first_action_time, Some(10.0));
        assert_eq!(clock.last_action_time, Some(20.0));
        assert_eq!(clock.time_to_first_action_ms(), 10.0);
    }

    #[test]
    fn test_idle_only_counts_gaps_over_threshold() {
        let mut clock = clock();
        clock.start(0.0);
        clock.record_action(300.0); // exactly the threshold, not idle
        clock.record_action(700.0); // 400ms gap
        clock.record_action(800.0);

        assert_eq!(clock.idle_time_ms, 400.0);
    }

    #[test]
    fn test_start_counts_as_last_action() {
        let mut clock = clock();
        clock.start(1000.0);
        clock.record_action(1500.0);

        assert_eq!(clock.idle_time_ms, 500.0);
    }

    #[test]
    fn test_pause_only_counts_gaps_over_threshold() {
        let mut clock = clock();
        clock.start(0.0);
        clock.record_mouse_move(0.0);
        clock.record_mouse_move(250.0);
        clock.record_mouse_move(600.0);

        assert_eq!(clock.pause_count, 1);
        assert_eq!(clock.last_mouse_time, Some(600.0));
    }

    #[test]
    fn test_restart_discards_state() {
        let mut clock = clock();
        clock.start(0.0);
        clock.record_action(1000.0);
        clock.record_mouse_move(1000.0);

        clock.start(2000.0);
        assert_eq!(clock.first_action_time, None);
        assert_eq!(clock.idle_time_ms, 0.0);
        assert_eq!(clock.last_mouse_time, None);
        assert_eq!(clock.last_action_time, Some(2000.0));
        assert_eq!(clock.session_duration_ms(2500.0), 500.0);
    }

    #[test]
    fn test_unstarted_clock_reports_zero() {
        let clock = clock();
        assert_eq!(clock.session_duration_ms(1234.0), 0.0);
        assert_eq!(clock.time_to_first_action_ms(), 0.0);
    }
}
