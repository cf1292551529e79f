//! Deterministic replay of recorded sessions.
//!
//! A recording is one `{"t": ms, "event": {...}}` object per line. Replay
//! drives a [`ManualEnvironment`] through the record instants, so the
//! resulting snapshot depends only on the recording.

use crate::capture::types::CapturedEvent;
use crate::config::Config;
use crate::core::environment::{EnvironmentProvider, ManualEnvironment};
use crate::core::snapshot::FeatureVector;
use crate::session::BehaviorSession;
use std::sync::Arc;
use thiserror::Error;

/// Replay error types.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Snapshot instant {at_ms} ms is earlier than the replay clock ({clock_ms} ms)")]
    SnapshotInPast { at_ms: f64, clock_ms: f64 },
}

/// Parse a recording, skipping blank and unreadable lines.
pub fn parse_records(content: &str) -> Vec<CapturedEvent> {
    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CapturedEvent>(line) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(line = index + 1, "Skipping unreadable record: {e}"),
        }
    }
    records
}

/// Replay `records` through a fresh session started at `start_ms`.
///
/// Records stamped before the session start, or earlier than the record
/// before them, are skipped with a warning. The snapshot is taken at `at_ms`
/// when given, otherwise at the last applied record.
pub fn replay_records(
    config: &Config,
    environment: Arc<ManualEnvironment>,
    records: &[CapturedEvent],
    start_ms: f64,
    at_ms: Option<f64>,
) -> Result<FeatureVector, ReplayError> {
    let mut session = BehaviorSession::new(config, environment.clone());
    environment.set_ms(start_ms);
    session.start();
    let session_start = environment.now_ms();

    let mut applied = 0usize;
    let mut skipped = 0usize;
    for (index, record) in records.iter().enumerate() {
        let clock_ms = environment.now_ms();
        if !record.at_ms.is_finite() || record.at_ms < clock_ms {
            let reason = if record.at_ms < session_start {
                "stamped before session start"
            } else {
                "out of order"
            };
            tracing::warn!(
                record = index + 1,
                t = record.at_ms,
                clock_ms,
                "Skipping record {reason}"
            );
            skipped += 1;
            continue;
        }

        environment.set_ms(record.at_ms);
        session.apply(record);
        applied += 1;
    }

    if let Some(at) = at_ms {
        let clock_ms = environment.now_ms();
        if at.is_nan() || at < clock_ms {
            return Err(ReplayError::SnapshotInPast { at_ms: at, clock_ms });
        }
        environment.set_ms(at);
    }

    tracing::info!(
        applied,
        skipped,
        duration_ms = environment.now_ms() - session_start,
        "Replay finished"
    );
    Ok(session.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::InteractionEvent;

    fn records() -> Vec<CapturedEvent> {
        vec![
            CapturedEvent::new(0.0, InteractionEvent::key_down("a")),
            CapturedEvent::new(600.0, InteractionEvent::key_down("b")),
            CapturedEvent::new(700.0, InteractionEvent::Click),
        ]
    }

    fn replay(
        records: &[CapturedEvent],
        start_ms: f64,
        at_ms: Option<f64>,
    ) -> Result<FeatureVector, ReplayError> {
        let env = Arc::new(ManualEnvironment::new());
        replay_records(&Config::default(), env, records, start_ms, at_ms)
    }

    #[test]
    fn test_parse_records_skips_bad_lines() {
        let content = "{\"t\": 5, \"event\": {\"type\": \"click\"}}\n\nnot json\n{\"t\": 9, \"event\": {\"type\": \"paste\"}}\n";
        let parsed = parse_records(content);

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], CapturedEvent::new(9.0, InteractionEvent::Paste));
    }

    #[test]
    fn test_replay_defaults_to_last_record() {
        let features = replay(&records(), 0.0, None).unwrap();

        assert_eq!(features.keyboard.total_keystrokes, 2);
        assert_eq!(features.timing.session_duration_ms, 700.0);
        assert_eq!(features.timing.time_to_first_action_ms, 0.0);
    }

    #[test]
    fn test_records_before_start_are_skipped() {
        let features = replay(&records(), 500.0, None).unwrap();

        assert_eq!(features.keyboard.total_keystrokes, 1);
        assert_eq!(features.timing.time_to_first_action_ms, 100.0);
        assert_eq!(features.timing.session_duration_ms, 200.0);
    }

    #[test]
    fn test_out_of_order_records_are_skipped() {
        let mut records = records();
        records.insert(2, CapturedEvent::new(300.0, InteractionEvent::Paste));
        records.push(CapturedEvent::new(f64::NAN, InteractionEvent::Scroll));

        let features = replay(&records, 0.0, None).unwrap();
        assert!(!features.keyboard.paste_detected);
        assert_eq!(features.interaction.scroll_count, 0);
        assert_eq!(features.interaction.click_count, 1);
    }

    #[test]
    fn test_snapshot_instant() {
        let features = replay(&records(), 0.0, Some(1000.0)).unwrap();
        assert_eq!(features.timing.session_duration_ms, 1000.0);

        let err = replay(&records(), 0.0, Some(650.0)).unwrap_err();
        assert!(matches!(err, ReplayError::SnapshotInPast { clock_ms, .. } if clock_ms == 700.0));
    }
}
