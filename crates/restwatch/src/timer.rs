//! Countdown/stopwatch session state machine.
//!
//! A running session carries exactly one wall-clock anchor: the finish
//! instant for a countdown, the start instant for a stopwatch. Every read
//! derives the displayed value from that anchor and the caller's `now`, so
//! delayed or missed polls (the host sleeping, the terminal suspended) never
//! accumulate drift. Pausing freezes the derived value and drops the anchor.
//!
//! Rounding is asymmetric on purpose: a countdown rounds the remaining time
//! up so the display never shows zero while time is left, a stopwatch rounds
//! elapsed time down so the readout never overstates progress.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// The two timer modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Countdown,
    Stopwatch,
}

/// A stopwatch split: the elapsed seconds at capture and the delta from the
/// previous split (from zero for the first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lap {
    pub time_sec: u32,
    pub diff_sec: u32,
}

/// One timer session, countdown or stopwatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSession {
    mode: TimerMode,
    duration_sec: u32,
    remain_sec: u32,
    elapsed_sec: u32,
    running: bool,
    finish_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    /// Most recent lap first.
    laps: Vec<Lap>,
}

impl TimerSession {
    /// A fresh countdown session with the given configured duration.
    pub fn new(duration_sec: u32) -> Self {
        Self {
            mode: TimerMode::Countdown,
            duration_sec,
            remain_sec: duration_sec,
            elapsed_sec: 0,
            running: false,
            finish_at: None,
            started_at: None,
            laps: Vec::new(),
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn duration_sec(&self) -> u32 {
        self.duration_sec
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The absolute finish instant, present only while a countdown runs.
    pub fn finish_at(&self) -> Option<DateTime<Utc>> {
        self.finish_at
    }

    /// The absolute start instant, present only while a stopwatch runs.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    /// Seconds left on the countdown, rounded up.
    pub fn remaining(&self, now: DateTime<Utc>) -> u32 {
        match (self.running, self.finish_at) {
            (true, Some(finish_at)) => {
                let ms = (finish_at - now).num_milliseconds().max(0);
                (ms as u64).div_ceil(1000) as u32
            }
            _ => self.remain_sec,
        }
    }

    /// Seconds on the stopwatch, rounded down.
    pub fn elapsed(&self, now: DateTime<Utc>) -> u32 {
        match (self.running, self.started_at) {
            (true, Some(started_at)) => {
                let ms = (now - started_at).num_milliseconds().max(0);
                (ms / 1000) as u32
            }
            _ => self.elapsed_sec,
        }
    }

    /// The value the big readout shows for the current mode.
    pub fn display_sec(&self, now: DateTime<Utc>) -> u32 {
        match self.mode {
            TimerMode::Countdown => self.remaining(now),
            TimerMode::Stopwatch => self.elapsed(now),
        }
    }

    /// Countdown progress in `[0, 1]`, zero when no duration is configured.
    pub fn progress(&self, now: DateTime<Utc>) -> f64 {
        if self.mode != TimerMode::Countdown || self.duration_sec == 0 {
            return 0.0;
        }
        let remain = f64::from(self.remaining(now));
        (1.0 - remain / f64::from(self.duration_sec)).clamp(0.0, 1.0)
    }

    /// Whether a running countdown has reached its finish instant.
    pub fn finished(&self, now: DateTime<Utc>) -> bool {
        self.running
            && self.mode == TimerMode::Countdown
            && self.finish_at.is_some_and(|finish_at| finish_at <= now)
    }

    /// Starts the session. No-op while already running, or for a countdown
    /// with nothing left to count.
    pub fn start(&mut self, now: DateTime<Utc>) {
        if self.running {
            return;
        }
        match self.mode {
            TimerMode::Countdown => {
                // Resume from the frozen remainder, fall back to the full
                // configured duration after a completed run.
                let base = if self.remain_sec > 0 {
                    self.remain_sec
                } else {
                    self.duration_sec
                };
                if base == 0 {
                    return;
                }
                self.remain_sec = base;
                self.finish_at = Some(now + TimeDelta::seconds(i64::from(base)));
            }
            TimerMode::Stopwatch => {
                self.started_at = Some(now - TimeDelta::seconds(i64::from(self.elapsed_sec)));
            }
        }
        self.running = true;
    }

    /// Freezes the derived value and drops the anchor.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if !self.running {
            return;
        }
        match self.mode {
            TimerMode::Countdown => self.remain_sec = self.remaining(now),
            TimerMode::Stopwatch => self.elapsed_sec = self.elapsed(now),
        }
        self.running = false;
        self.finish_at = None;
        self.started_at = None;
    }

    /// Back to idle: full duration restored, or elapsed and laps cleared.
    pub fn reset(&mut self) {
        self.running = false;
        self.finish_at = None;
        self.started_at = None;
        match self.mode {
            TimerMode::Countdown => self.remain_sec = self.duration_sec,
            TimerMode::Stopwatch => {
                self.elapsed_sec = 0;
                self.laps.clear();
            }
        }
    }

    /// Switches modes, forcing idle and resetting the target mode's display
    /// value. No-op when already in `next`.
    pub fn switch_mode(&mut self, next: TimerMode) {
        if next == self.mode {
            return;
        }
        self.running = false;
        self.finish_at = None;
        self.started_at = None;
        self.laps.clear();
        self.mode = next;
        match next {
            TimerMode::Countdown => self.remain_sec = self.duration_sec,
            TimerMode::Stopwatch => self.elapsed_sec = 0,
        }
    }

    /// Applies an absolute second count to the current mode.
    ///
    /// A running session keeps running: the anchor is recomputed against the
    /// new target instead of stopping.
    pub fn apply_seconds(&mut self, sec: u32, now: DateTime<Utc>) {
        match self.mode {
            TimerMode::Countdown => {
                self.duration_sec = sec;
                self.remain_sec = sec;
                if self.running {
                    self.finish_at = Some(now + TimeDelta::seconds(i64::from(sec)));
                }
            }
            TimerMode::Stopwatch => {
                self.elapsed_sec = sec;
                if self.running {
                    self.started_at = Some(now - TimeDelta::seconds(i64::from(sec)));
                }
            }
        }
    }

    /// Applies a duration and goes straight to running, superseding whatever
    /// session was in progress. The preset tap and wheel confirm path.
    pub fn force_start(&mut self, mode: TimerMode, sec: u32, now: DateTime<Utc>) {
        self.switch_mode(mode);
        self.apply_seconds(sec, now);
        self.start(now);
    }

    /// Nudges the current mode's value by `delta_sec`, clamped at zero. A
    /// countdown shifts both the configured duration and the remainder.
    pub fn adjust(&mut self, delta_sec: i32, now: DateTime<Utc>) {
        match self.mode {
            TimerMode::Countdown => {
                let next_remain = self.remaining(now).saturating_add_signed(delta_sec);
                self.duration_sec = self.duration_sec.saturating_add_signed(delta_sec);
                self.remain_sec = next_remain;
                if self.running {
                    self.finish_at = Some(now + TimeDelta::seconds(i64::from(next_remain)));
                }
            }
            TimerMode::Stopwatch => {
                let next_elapsed = self.elapsed(now).saturating_add_signed(delta_sec);
                self.elapsed_sec = next_elapsed;
                if self.running {
                    self.started_at = Some(now - TimeDelta::seconds(i64::from(next_elapsed)));
                }
            }
        }
    }

    /// Records a lap from the current elapsed time. No-op outside stopwatch
    /// mode.
    pub fn add_lap(&mut self, now: DateTime<Utc>) {
        if self.mode != TimerMode::Stopwatch {
            return;
        }
        let time_sec = self.elapsed(now);
        let previous = self.laps.first().map_or(0, |lap| lap.time_sec);
        self.laps.insert(
            0,
            Lap {
                time_sec,
                diff_sec: time_sec.saturating_sub(previous),
            },
        );
    }

    pub fn clear_laps(&mut self) {
        self.laps.clear();
    }

    /// Pins a finished countdown at zero and returns to idle. The engine
    /// calls this from the tick that observes completion.
    pub(crate) fn complete(&mut self) {
        self.running = false;
        self.finish_at = None;
        self.started_at = None;
        self.remain_sec = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        "2024-03-27T12:00:00Z".parse().unwrap()
    }

    fn after_ms(ms: i64) -> DateTime<Utc> {
        t0() + TimeDelta::milliseconds(ms)
    }

    #[test]
    fn countdown_rounds_remaining_up() {
        let mut session = TimerSession::new(10);
        session.start(t0());

        // 0.6s left still displays a full second.
        assert_eq!(session.remaining(after_ms(9_400)), 1);
        assert_eq!(session.remaining(after_ms(10_000)), 0);
    }

    #[test]
    fn stopwatch_rounds_elapsed_down() {
        let mut session = TimerSession::new(0);
        session.switch_mode(TimerMode::Stopwatch);
        session.start(t0());

        assert_eq!(session.elapsed(after_ms(9_400)), 9);
    }

    #[test]
    fn pause_then_resume_loses_nothing() {
        let mut session = TimerSession::new(60);
        session.start(t0());

        session.pause(after_ms(20_000));
        assert!(!session.is_running());
        assert_eq!(session.finish_at(), None);
        assert_eq!(session.remaining(after_ms(45_000)), 40);

        session.start(after_ms(45_000));
        assert_eq!(session.remaining(after_ms(45_000)), 40);
        assert_eq!(
            session.finish_at(),
            Some(after_ms(45_000) + TimeDelta::seconds(40))
        );
    }

    #[test]
    fn start_is_noop_while_running() {
        let mut session = TimerSession::new(30);
        session.start(t0());
        let anchored = session.finish_at();

        session.start(after_ms(5_000));
        assert_eq!(session.finish_at(), anchored);
    }

    #[test]
    fn start_with_zero_countdown_is_noop() {
        let mut session = TimerSession::new(0);
        session.start(t0());

        assert!(!session.is_running());
        assert_eq!(session.finish_at(), None);
    }

    #[test]
    fn start_after_completion_restarts_from_duration() {
        let mut session = TimerSession::new(30);
        session.start(t0());
        session.complete();
        assert_eq!(session.remaining(after_ms(31_000)), 0);

        session.start(after_ms(40_000));
        assert_eq!(session.remaining(after_ms(40_000)), 30);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut session = TimerSession::new(45);
        session.start(t0());
        session.adjust(10, after_ms(1_000));

        session.reset();
        let once = session.clone();
        session.reset();

        assert_eq!(session, once);
        assert_eq!(session.remaining(after_ms(2_000)), 55);
    }

    #[test]
    fn switch_mode_clears_laps_and_anchors() {
        let mut session = TimerSession::new(90);
        session.switch_mode(TimerMode::Stopwatch);
        session.start(t0());
        session.add_lap(after_ms(12_000));

        session.switch_mode(TimerMode::Countdown);
        assert!(!session.is_running());
        assert_eq!(session.finish_at(), None);
        assert_eq!(session.started_at(), None);
        assert!(session.laps().is_empty());
        assert_eq!(session.elapsed(after_ms(20_000)), 0);
        assert_eq!(session.remaining(after_ms(20_000)), 90);
    }

    #[test]
    fn switch_to_same_mode_keeps_running() {
        let mut session = TimerSession::new(30);
        session.start(t0());

        session.switch_mode(TimerMode::Countdown);
        assert!(session.is_running());
    }

    #[test]
    fn stopwatch_ticks_never_go_backwards() {
        let mut session = TimerSession::new(0);
        session.switch_mode(TimerMode::Stopwatch);
        session.start(t0());

        let mut last = 0;
        for ms in (0..30_000).step_by(250) {
            let elapsed = session.elapsed(after_ms(ms));
            assert!(elapsed >= last);
            last = elapsed;
        }
    }

    #[test]
    fn lap_ledger_is_most_recent_first_with_diffs() {
        let mut session = TimerSession::new(0);
        session.switch_mode(TimerMode::Stopwatch);
        session.start(t0());

        session.add_lap(after_ms(12_000));
        session.add_lap(after_ms(30_000));
        session.add_lap(after_ms(65_000));

        let times: Vec<u32> = session.laps().iter().map(|l| l.time_sec).collect();
        let diffs: Vec<u32> = session.laps().iter().map(|l| l.diff_sec).collect();
        assert_eq!(times, vec![65, 30, 12]);
        assert_eq!(diffs, vec![35, 18, 12]);
    }

    #[test]
    fn lap_is_noop_in_countdown_mode() {
        let mut session = TimerSession::new(30);
        session.start(t0());
        session.add_lap(after_ms(5_000));

        assert!(session.laps().is_empty());
    }

    #[test]
    fn apply_while_running_reanchors_without_stopping() {
        let mut session = TimerSession::new(90);
        session.start(t0());

        session.apply_seconds(120, after_ms(10_000));
        assert!(session.is_running());
        assert_eq!(session.duration_sec(), 120);
        assert_eq!(
            session.finish_at(),
            Some(after_ms(10_000) + TimeDelta::seconds(120))
        );
        assert_eq!(session.remaining(after_ms(10_000)), 120);
    }

    #[test]
    fn apply_to_running_stopwatch_shifts_the_start() {
        let mut session = TimerSession::new(0);
        session.switch_mode(TimerMode::Stopwatch);
        session.start(t0());

        session.apply_seconds(100, after_ms(5_000));
        assert!(session.is_running());
        assert_eq!(session.elapsed(after_ms(5_000)), 100);
        assert_eq!(session.elapsed(after_ms(7_000)), 102);
    }

    #[test]
    fn force_start_supersedes_a_running_session() {
        let mut session = TimerSession::new(90);
        session.start(t0());

        session.force_start(TimerMode::Countdown, 300, after_ms(30_000));
        assert!(session.is_running());
        assert_eq!(session.duration_sec(), 300);
        assert_eq!(
            session.finish_at(),
            Some(after_ms(30_000) + TimeDelta::seconds(300))
        );
    }

    #[test]
    fn force_start_switches_mode_from_idle() {
        let mut session = TimerSession::new(90);

        session.force_start(TimerMode::Stopwatch, 0, t0());
        assert_eq!(session.mode(), TimerMode::Stopwatch);
        assert!(session.is_running());
        assert_eq!(session.elapsed(after_ms(4_000)), 4);
    }

    #[test]
    fn adjust_moves_duration_and_remainder_together() {
        let mut session = TimerSession::new(90);
        session.start(t0());

        session.adjust(30, after_ms(10_000));
        assert_eq!(session.duration_sec(), 120);
        assert_eq!(session.remaining(after_ms(10_000)), 110);
        assert_eq!(
            session.finish_at(),
            Some(after_ms(10_000) + TimeDelta::seconds(110))
        );
    }

    #[test]
    fn adjust_clamps_at_zero() {
        let mut session = TimerSession::new(15);

        session.adjust(-100, t0());
        assert_eq!(session.duration_sec(), 0);
        assert_eq!(session.remaining(t0()), 0);
    }

    #[test]
    fn adjust_shifts_a_running_stopwatch() {
        let mut session = TimerSession::new(0);
        session.switch_mode(TimerMode::Stopwatch);
        session.start(t0());

        session.adjust(10, after_ms(5_000));
        assert_eq!(session.elapsed(after_ms(5_000)), 15);

        session.adjust(-100, after_ms(5_000));
        assert_eq!(session.elapsed(after_ms(5_000)), 0);
    }

    #[test]
    fn progress_tracks_the_configured_duration() {
        let mut session = TimerSession::new(100);
        assert_eq!(session.progress(t0()), 0.0);

        session.start(t0());
        let progress = session.progress(after_ms(25_000));
        assert!((progress - 0.25).abs() < 1e-9);

        session.apply_seconds(0, after_ms(25_000));
        assert_eq!(session.progress(after_ms(25_000)), 0.0);
    }

    #[test]
    fn finished_only_fires_for_running_countdowns() {
        let mut session = TimerSession::new(30);
        assert!(!session.finished(after_ms(60_000)));

        session.start(t0());
        assert!(!session.finished(after_ms(29_000)));
        assert!(session.finished(after_ms(30_000)));

        session.pause(after_ms(29_000));
        assert!(!session.finished(after_ms(60_000)));
    }
}
