//! Timer structure and its pause/resume arithmetic

use serde::{Deserialize, Serialize};

use crate::utils::unix_seconds;

/// A single countdown timer
///
/// While running, the live remaining time is derived from `remaining_duration`
/// and `unpaused_time`; it is only folded back into `remaining_duration` on
/// pause. The remaining time is never clamped, a negative value means the
/// countdown has overrun.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    /// Seconds since epoch at which the timer was last resumed, `None` while paused
    pub unpaused_time: Option<f64>,
    /// Seconds left as of the last pause
    pub remaining_duration: f64,
    pub is_paused: bool,
    pub name: String,
    /// Duration restored on reset
    pub full_duration: f64,
}

impl Timer {
    /// Create a paused timer holding its full duration
    pub fn new(duration: f64, name: impl Into<String>) -> Self {
        Self {
            unpaused_time: None,
            remaining_duration: duration,
            is_paused: true,
            name: name.into(),
            full_duration: duration,
        }
    }

    /// Resume the countdown. Returns false if it was already running.
    pub fn start(&mut self) -> bool {
        self.start_at(unix_seconds())
    }

    pub fn start_at(&mut self, now: f64) -> bool {
        if !self.is_paused {
            return false;
        }
        self.unpaused_time = Some(now);
        self.is_paused = false;
        true
    }

    /// Stop the countdown. Returns false if it was already paused.
    pub fn pause(&mut self) -> bool {
        self.pause_at(unix_seconds())
    }

    pub fn pause_at(&mut self, now: f64) -> bool {
        if self.is_paused {
            return false;
        }
        if let Some(unpaused) = self.unpaused_time.take() {
            self.remaining_duration -= now - unpaused;
        }
        self.is_paused = true;
        true
    }

    /// Restore the full duration and stop the countdown
    pub fn reset(&mut self) {
        self.remaining_duration = self.full_duration;
        self.is_paused = true;
        self.unpaused_time = None;
    }

    /// Shift both the target and the remaining time by `delta` seconds
    pub fn add_time(&mut self, delta: f64) {
        self.full_duration += delta;
        self.remaining_duration += delta;
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_new_timer_is_paused_at_full_duration() {
        let timer = Timer::new(60.0, "Chronometer");
        assert!(timer.is_paused);
        assert_eq!(timer.unpaused_time, None);
        assert_eq!(timer.full_duration, 60.0);
        assert_eq!(timer.remaining_duration, 60.0);
    }

    #[test]
    fn test_start_pause_subtracts_elapsed() {
        let mut timer = Timer::new(60.0, "t");
        assert!(timer.start_at(1_000.0));
        assert!(!timer.is_paused);
        assert_eq!(timer.unpaused_time, Some(1_000.0));

        assert!(timer.pause_at(1_010.0));
        assert!(timer.is_paused);
        assert_eq!(timer.unpaused_time, None);
        assert!((timer.remaining_duration - 50.0).abs() < EPSILON);
    }

    #[test]
    fn test_start_is_noop_when_running() {
        let mut timer = Timer::new(60.0, "t");
        timer.start_at(1_000.0);
        assert!(!timer.start_at(1_005.0));
        assert_eq!(timer.unpaused_time, Some(1_000.0));
    }

    #[test]
    fn test_repeated_pause_is_idempotent() {
        let mut timer = Timer::new(60.0, "t");
        timer.start_at(0.0);
        timer.pause_at(15.0);
        let snapshot = timer.clone();

        assert!(!timer.pause_at(30.0));
        assert!(!timer.pause_at(45.0));
        assert_eq!(timer, snapshot);
    }

    #[test]
    fn test_overrun_goes_negative() {
        let mut timer = Timer::new(10.0, "t");
        timer.start_at(0.0);
        timer.pause_at(25.0);
        assert!((timer.remaining_duration + 15.0).abs() < EPSILON);
    }

    #[test]
    fn test_multiple_cycles_accumulate() {
        let mut timer = Timer::new(100.0, "t");
        timer.start_at(0.0);
        timer.pause_at(10.0);
        timer.start_at(50.0);
        timer.pause_at(70.0);
        assert!((timer.remaining_duration - 70.0).abs() < EPSILON);
    }

    #[test]
    fn test_reset_after_any_sequence() {
        for duration in [0.0, 1.0, 60.0, 3_600.0] {
            let mut timer = Timer::new(duration, "t");
            timer.start_at(0.0);
            timer.add_time(30.0);
            timer.pause_at(12.5);
            timer.add_time(-7.0);
            timer.start_at(20.0);

            timer.reset();
            assert_eq!(timer.remaining_duration, timer.full_duration);
            assert!(timer.is_paused);
            assert_eq!(timer.unpaused_time, None);
        }
    }

    #[test]
    fn test_add_time_round_trip() {
        let mut timer = Timer::new(60.0, "t");
        timer.start_at(0.0);
        timer.pause_at(12.0);
        let (full, remaining) = (timer.full_duration, timer.remaining_duration);

        timer.add_time(45.0);
        assert_eq!(timer.full_duration, full + 45.0);
        assert_eq!(timer.remaining_duration, remaining + 45.0);

        timer.add_time(-45.0);
        assert_eq!(timer.full_duration, full);
        assert_eq!(timer.remaining_duration, remaining);
    }

    #[test]
    fn test_add_time_keeps_run_state() {
        let mut timer = Timer::new(60.0, "t");
        timer.start_at(5.0);
        timer.add_time(-100.0);
        assert!(!timer.is_paused);
        assert_eq!(timer.unpaused_time, Some(5.0));
        assert_eq!(timer.full_duration, -40.0);
    }

    /// Remaining time as a client displays it at `now`
    fn live_remaining(timer: &Timer, now: f64) -> f64 {
        match timer.unpaused_time {
            Some(unpaused) if !timer.is_paused => timer.remaining_duration - (now - unpaused),
            _ => timer.remaining_duration,
        }
    }

    #[test]
    fn test_live_remaining_from_wire_fields() {
        let mut timer = Timer::new(60.0, "t");
        assert_eq!(live_remaining(&timer, 500.0), 60.0);

        timer.start_at(100.0);
        assert!((live_remaining(&timer, 130.0) - 30.0).abs() < EPSILON);
        assert!((live_remaining(&timer, 190.0) + 30.0).abs() < EPSILON);
    }

    #[test]
    fn test_rename() {
        let mut timer = Timer::new(1.0, "Chronometer");
        timer.rename("Break");
        assert_eq!(timer.name, "Break");
        timer.rename("");
        assert_eq!(timer.name, "");
    }

    #[test]
    fn test_wire_format() {
        let mut timer = Timer::new(60.0, "Chronometer");
        let value = serde_json::to_value(&timer).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "unpaused_time": null,
                "remaining_duration": 60.0,
                "is_paused": true,
                "name": "Chronometer",
                "full_duration": 60.0,
            })
        );

        timer.start_at(1_700_000_000.25);
        let value = serde_json::to_value(&timer).unwrap();
        assert_eq!(value["unpaused_time"], serde_json::json!(1_700_000_000.25));
        assert_eq!(value["is_paused"], serde_json::json!(false));
    }
}
