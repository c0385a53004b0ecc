//! Coordination between the timer session and the OS-facing bridges.
//!
//! The engine owns the session plus the notification and feedback sinks and
//! keeps them in lockstep: every operation that can move the finish anchor
//! resynchronizes the scheduled alert before anything else can observe the
//! session. At most one alert is outstanding, always derived from the
//! absolute finish instant.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::Config;
use crate::notify::{FinishNotifier, Haptics};
use crate::timer::{TimerMode, TimerSession};

/// Drives a [`TimerSession`] and its side effects.
pub struct TimerEngine<N, H> {
    session: TimerSession,
    notifier: N,
    haptics: H,
    vibrate_on_finish: bool,
    notify_on_finish: bool,
}

impl<N: FinishNotifier, H: Haptics> TimerEngine<N, H> {
    pub fn new(session: TimerSession, notifier: N, haptics: H, config: &Config) -> Self {
        Self {
            session,
            notifier,
            haptics,
            vibrate_on_finish: config.vibrate_on_finish,
            notify_on_finish: config.notify_on_finish,
        }
    }

    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    pub fn vibrate_on_finish(&self) -> bool {
        self.vibrate_on_finish
    }

    pub fn toggle_vibrate_on_finish(&mut self) {
        self.vibrate_on_finish = !self.vibrate_on_finish;
    }

    pub fn start(&mut self, now: DateTime<Utc>) {
        self.session.start(now);
        self.resync_notification();
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        self.session.pause(now);
        self.resync_notification();
    }

    pub fn reset(&mut self) {
        self.session.reset();
        self.resync_notification();
    }

    pub fn switch_mode(&mut self, next: TimerMode) {
        self.session.switch_mode(next);
        self.resync_notification();
    }

    pub fn apply_seconds(&mut self, sec: u32, now: DateTime<Utc>) {
        self.session.apply_seconds(sec, now);
        self.resync_notification();
    }

    pub fn force_start(&mut self, mode: TimerMode, sec: u32, now: DateTime<Utc>) {
        self.session.force_start(mode, sec, now);
        self.resync_notification();
    }

    pub fn adjust(&mut self, delta_sec: i32, now: DateTime<Utc>) {
        self.session.adjust(delta_sec, now);
        self.resync_notification();
    }

    pub fn add_lap(&mut self, now: DateTime<Utc>) {
        self.session.add_lap(now);
    }

    pub fn clear_laps(&mut self) {
        self.session.clear_laps();
    }

    /// The periodic poll body. Detects countdown completion, pins the
    /// session at zero, clears the scheduled alert, and fires the in-app
    /// feedback once. Returns whether this tick completed the countdown.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if !self.session.finished(now) {
            return false;
        }
        self.session.complete();
        self.notifier.cancel();
        if self.vibrate_on_finish {
            self.haptics.vibrate();
        }
        debug!("countdown finished");
        true
    }

    fn resync_notification(&mut self) {
        self.notifier.cancel();
        if !self.notify_on_finish {
            return;
        }
        if let Some(finish_at) = self.session.finish_at() {
            self.notifier.schedule(finish_at);
        }
    }
}
