//! Finish-alert bridges: the scheduled desktop notification, the completion
//! feedback sink, and the foreground banner policy.
//!
//! Everything here is best-effort. A missing notification daemon or a
//! write-protected terminal degrades the app to foreground-only alerts and
//! never disturbs the timer state.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use notify_rust::{Notification, Urgency};
use tracing::warn;

use crate::app;

const FINISH_SUMMARY: &str = "Time's up";
const FINISH_BODY: &str = "Rest is over. On to the next set!";

/// How often the sleeper thread rechecks its cancellation flag.
const POLL_SLICE: StdDuration = StdDuration::from_millis(100);

/// A one-shot alert scheduled for an absolute finish instant.
///
/// Implementations hold at most one live handle: `schedule` replaces any
/// pending alert, `cancel` is a no-op when nothing is pending. The alert is
/// keyed to the absolute instant, never a relative duration, so rescheduling
/// after an edit stays exact.
pub trait FinishNotifier {
    fn schedule(&mut self, finish_at: DateTime<Utc>);
    fn cancel(&mut self);
}

/// Completion feedback fired in-app when a countdown runs out.
pub trait Haptics {
    fn vibrate(&mut self);
}

/// Desktop notification scheduled independently of the in-app poll, so the
/// alert still fires when the process is stopped in a background terminal.
///
/// A spawned thread sleeps in short slices until the finish instant, then
/// posts the notification unless the cancellation flag was raised. Cancel
/// raises the flag and forgets the handle; the thread winds down on its own.
#[derive(Debug, Default)]
pub struct DesktopNotifier {
    pending: Option<Arc<AtomicBool>>,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FinishNotifier for DesktopNotifier {
    fn schedule(&mut self, finish_at: DateTime<Utc>) {
        // Cancel-then-create, so a stale alert can never outlive a
        // reschedule.
        self.cancel();

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        thread::spawn(move || {
            loop {
                if flag.load(Ordering::SeqCst) {
                    return;
                }
                match (finish_at - Utc::now()).to_std() {
                    Ok(left) if !left.is_zero() => thread::sleep(left.min(POLL_SLICE)),
                    _ => break,
                }
            }
            if flag.load(Ordering::SeqCst) {
                return;
            }
            let shown = Notification::new()
                .appname(app::name())
                .summary(FINISH_SUMMARY)
                .body(FINISH_BODY)
                .icon("alarm-clock")
                .urgency(Urgency::Critical)
                .show();
            if let Err(err) = shown {
                warn!("desktop notification failed: {err}");
            }
        });

        self.pending = Some(cancelled);
    }

    fn cancel(&mut self) {
        if let Some(flag) = self.pending.take() {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

impl Drop for DesktopNotifier {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Rings the terminal bell, the closest desktop stand-in for the vibration
/// pattern a phone plays on finish.
#[derive(Debug, Default)]
pub struct TerminalHaptics;

impl Haptics for TerminalHaptics {
    fn vibrate(&mut self) {
        let mut out = io::stdout();
        let _ = out.write_all(b"\x07").and_then(|()| out.flush());
    }
}

/// Whether the completion banner may render outside the timer view.
///
/// The timer view already shows the finish on its own readout, so it turns
/// the banner off while focused and restores it on blur. Held by whoever
/// renders alerts instead of living in a mutable global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    banner_in_foreground: bool,
}

impl AlertPolicy {
    pub fn new() -> Self {
        Self {
            banner_in_foreground: true,
        }
    }

    pub fn banner_in_foreground(&self) -> bool {
        self.banner_in_foreground
    }

    pub fn set_banner_in_foreground(&mut self, show: bool) {
        self.banner_in_foreground = show;
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::new()
    }
}
