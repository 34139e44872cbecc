//! Durable snapshot layout

use serde::{Deserialize, Serialize};

use crate::{
    clock::Millis,
    state::{Mode, TimeState},
};

/// One mode's persisted key group. Always written as a whole.
///
/// The stopwatch stores its accumulated time under `priorElapsed` and the
/// timer under `pauseDelta`; readers accept either (and the older
/// `priorTime`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub running: bool,
    pub reset: bool,
    pub start_time: Millis,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "priorTime")]
    pub prior_elapsed: Option<Millis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_delta: Option<Millis>,
    #[serde(default)]
    pub duration: Millis,
    /// Wall-clock time of the write, kept for clock-adjustment detection
    pub update_timestamp: Millis,
}

impl Snapshot {
    pub fn capture(state: &TimeState, saved_at: Millis) -> Self {
        let (prior_elapsed, pause_delta) = match state.mode {
            Mode::Stopwatch => (Some(state.prior_elapsed), None),
            Mode::Timer => (None, Some(state.prior_elapsed)),
        };
        Self {
            running: state.running,
            reset: state.reset,
            start_time: state.start_time,
            prior_elapsed,
            pause_delta,
            duration: state.duration,
            update_timestamp: saved_at,
        }
    }

    pub fn accumulated(&self) -> Millis {
        self.prior_elapsed.or(self.pause_delta).unwrap_or(0)
    }

    pub fn into_state(self, mode: Mode) -> TimeState {
        TimeState {
            mode,
            running: self.running,
            reset: self.reset,
            start_time: self.start_time,
            prior_elapsed: self.accumulated(),
            duration: match mode {
                Mode::Stopwatch => 0,
                Mode::Timer => self.duration,
            },
        }
        .normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_uses_pause_delta_key() {
        let mut state = TimeState::timer(60_000);
        state.start(1_000);
        state.pause(4_000);

        let json = serde_json::to_value(Snapshot::capture(&state, 5_000)).unwrap();
        assert_eq!(json["pauseDelta"], 3_000);
        assert_eq!(json["duration"], 60_000);
        assert_eq!(json["updateTimestamp"], 5_000);
        assert!(json.get("priorElapsed").is_none());
    }

    #[test]
    fn reads_legacy_prior_time_key() {
        let json = r#"{"running":false,"reset":false,"startTime":10,"priorTime":2500,"updateTimestamp":99}"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        let state = snapshot.into_state(Mode::Stopwatch);
        assert_eq!(state.prior_elapsed, 2_500);
        assert_eq!(state.duration, 0);
    }

    #[test]
    fn reset_snapshot_loads_as_clean_reset() {
        let snapshot = Snapshot {
            running: true,
            reset: true,
            start_time: 10,
            prior_elapsed: Some(55),
            pause_delta: None,
            duration: 0,
            update_timestamp: 0,
        };
        assert_eq!(snapshot.into_state(Mode::Stopwatch), TimeState::stopwatch());
    }
}
