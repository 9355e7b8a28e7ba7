//! Frame pacing
//!
//! Fixed-step pacing with a coarse sleep followed by a spin-wait. Frames that
//! overrun the target are reported as missed and never compensated: motion
//! in the game is per-frame, so achieved frame rate drives visual speed.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Nominal refresh rate used when nothing else is configured.
pub const DEFAULT_TARGET_HZ: f64 = 60.0;

/// Monotonic time source the pacer reads and sleeps on.
pub trait Clock {
    /// Time since an arbitrary fixed origin.
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock for tests.
///
/// Every read advances time by `step_per_read` so spin loops terminate;
/// `sleep` advances by exactly the requested amount.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    step_per_read: Duration,
    slept: Cell<Duration>,
}

impl ManualClock {
    pub fn new(step_per_read: Duration) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            step_per_read,
            slept: Cell::new(Duration::ZERO),
        }
    }

    /// Jump forward, simulating work done between reads.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Total time spent in `sleep`.
    pub fn total_slept(&self) -> Duration {
        self.slept.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let now = self.now.get();
        self.now.set(now + self.step_per_read);
        now
    }

    fn sleep(&self, duration: Duration) {
        self.slept.set(self.slept.get() + duration);
        self.advance(duration);
    }
}

/// How the loop waits out the remainder of each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PacingPolicy {
    /// Run frames back to back.
    Unlimited,
    /// Hold every frame to `1 / target_hz` seconds.
    ///
    /// `coarse_sleep` should only be set when the platform's sleep
    /// granularity is fine enough (about 1ms) not to overshoot.
    Fixed { target_hz: f64, coarse_sleep: bool },
}

impl PacingPolicy {
    pub fn fixed(target_hz: f64) -> Self {
        assert!(target_hz > 0.0, "target rate must be positive, got {}", target_hz);
        Self::Fixed {
            target_hz,
            coarse_sleep: true,
        }
    }

    /// Period of one frame. `None` when unpaced, or when `1 / target_hz`
    /// is not a valid duration (negative, NaN or too long), in which case
    /// the pacer never waits.
    pub fn target_frame_duration(&self) -> Option<Duration> {
        match *self {
            Self::Unlimited => None,
            Self::Fixed { target_hz, .. } => Duration::try_from_secs_f64(1.0 / target_hz).ok(),
        }
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_TARGET_HZ)
    }
}

/// Timing of one completed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Time spent before any waiting.
    pub work: Duration,
    /// Achieved frame duration including waiting.
    pub total: Duration,
    /// The frame overran its target.
    pub missed: bool,
}

impl FrameReport {
    pub fn ms_per_frame(&self) -> f64 {
        self.total.as_secs_f64() * 1000.0
    }

    pub fn fps(&self) -> f64 {
        let secs = self.total.as_secs_f64();
        if secs > 0.0 {
            1.0 / secs
        } else {
            0.0
        }
    }
}

/// Gates loop iterations according to a [`PacingPolicy`].
pub struct FramePacer<C: Clock> {
    clock: C,
    policy: PacingPolicy,
    frame_start: Duration,
}

impl<C: Clock> FramePacer<C> {
    pub fn new(clock: C, policy: PacingPolicy) -> Self {
        let frame_start = clock.now();
        Self {
            clock,
            policy,
            frame_start,
        }
    }

    pub fn policy(&self) -> PacingPolicy {
        self.policy
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Seconds the simulation should assume for one frame.
    ///
    /// Fixed policies report their target; unlimited pacing has no nominal
    /// step and reports zero.
    pub fn nominal_dt(&self) -> f32 {
        self.policy
            .target_frame_duration()
            .map_or(0.0, |target| target.as_secs_f32())
    }

    /// Record the start timestamp of a new frame.
    pub fn begin_frame(&mut self) {
        self.frame_start = self.clock.now();
    }

    /// Wait out the rest of the frame and report how long it took.
    pub fn end_frame(&mut self) -> FrameReport {
        let work = self.elapsed();

        let Some(target) = self.policy.target_frame_duration() else {
            return FrameReport {
                work,
                total: work,
                missed: false,
            };
        };

        if work >= target {
            tracing::warn!(
                work_ms = work.as_secs_f64() * 1000.0,
                target_ms = target.as_secs_f64() * 1000.0,
                "Missed frame deadline"
            );
            return FrameReport {
                work,
                total: work,
                missed: true,
            };
        }

        if let PacingPolicy::Fixed {
            coarse_sleep: true, ..
        } = self.policy
        {
            // Whole milliseconds only, rounded down, so the sleep cannot
            // overshoot the deadline.
            let sleep_ms = (target - work).as_millis() as u64;
            if sleep_ms > 0 {
                self.clock.sleep(Duration::from_millis(sleep_ms));
            }
        }

        let mut total = self.elapsed();
        while total < target {
            std::hint::spin_loop();
            total = self.elapsed();
        }

        FrameReport {
            work,
            total,
            missed: false,
        }
    }

    fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.frame_start)
    }
}
