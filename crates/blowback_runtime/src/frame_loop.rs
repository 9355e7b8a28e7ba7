//! Fixed-step frame loop
//!
//! One iteration: pump platform events into the current input snapshot, run
//! the game step, present, wait out the frame, then swap snapshots. The stop
//! flag is only looked at before an iteration starts, so the frame that saw
//! the quit request still completes.

use blowback_core::time::{Clock, FramePacer, PacingPolicy};
use blowback_metrics::{Counter, FrameTimer, MISSED_FRAMES};
use blowback_render::GraphicsContext;
use blowback_services::{FrameInput, InputBuffer};
use std::time::Duration;

/// Frames kept in the rolling frame-time window.
const FRAME_HISTORY: usize = 120;

/// How often rolling statistics are logged.
const STATS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Stop,
}

/// What the loop needs from the host environment.
pub trait Platform {
    /// Drain pending OS events into `current`, using `previous` for edges.
    fn pump_events(&mut self, current: &mut FrameInput, previous: &FrameInput) -> LoopControl;

    fn graphics(&mut self) -> &mut dyn GraphicsContext;

    /// Show everything drawn since the last present.
    fn present(&mut self);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub missed_frames: u64,
}

pub struct FrameLoop<C: Clock> {
    pacer: FramePacer<C>,
    frame_timer: FrameTimer,
    counters: Counter,
    since_stats: Duration,
    last_frame: Duration,
}

impl<C: Clock> FrameLoop<C> {
    pub fn new(clock: C, policy: PacingPolicy) -> Self {
        tracing::info!(?policy, "Frame pacing configured");
        Self {
            pacer: FramePacer::new(clock, policy),
            frame_timer: FrameTimer::new(FRAME_HISTORY),
            counters: Counter::new(),
            since_stats: Duration::ZERO,
            last_frame: Duration::ZERO,
        }
    }

    pub fn pacer(&self) -> &FramePacer<C> {
        &self.pacer
    }

    /// Run until the platform asks to stop.
    ///
    /// `step` is called exactly once per iteration with the frame's input
    /// and the platform's graphics context.
    pub fn run<P, F>(&mut self, platform: &mut P, inputs: &mut InputBuffer, mut step: F) -> LoopSummary
    where
        P: Platform + ?Sized,
        F: FnMut(&FrameInput, &mut dyn GraphicsContext),
    {
        let mut summary = LoopSummary::default();
        let mut control = LoopControl::Continue;

        tracing::info!("Entering frame loop");

        while control == LoopControl::Continue {
            self.pacer.begin_frame();
            inputs.begin_frame();

            {
                let (current, previous) = inputs.split();
                control = platform.pump_events(current, previous);
                current.dt = self.frame_dt();
            }

            step(inputs.current(), platform.graphics());
            platform.present();

            let report = self.pacer.end_frame();
            self.last_frame = report.total;
            self.frame_timer.record(report.total);
            tracing::trace!(
                ms_per_frame = report.ms_per_frame(),
                fps = report.fps(),
                missed = report.missed,
                "Frame"
            );
            if report.missed {
                summary.missed_frames += 1;
                self.counters.increment(MISSED_FRAMES, 1);
            }

            inputs.swap();
            summary.frames += 1;

            self.since_stats += report.total;
            if self.since_stats >= STATS_INTERVAL {
                self.log_stats();
                self.since_stats = Duration::ZERO;
            }
        }

        tracing::info!(
            frames = summary.frames,
            missed = summary.missed_frames,
            "Frame loop stopped"
        );
        summary
    }

    /// Seconds the next frame is expected to cover: the pacing target, or
    /// the last measured frame when pacing is unlimited.
    fn frame_dt(&self) -> f32 {
        match self.pacer.nominal_dt() {
            dt if dt > 0.0 => dt,
            _ => self.last_frame.as_secs_f32(),
        }
    }

    fn log_stats(&mut self) {
        let (min_ms, max_ms) = self.frame_timer.frame_time_range_ms();
        tracing::debug!(
            fps = self.frame_timer.fps(),
            frame_ms = self.frame_timer.frame_time_ms(),
            last_ms = self.frame_timer.last_frame_ms(),
            min_ms,
            max_ms,
            missed = self.counters.get(MISSED_FRAMES),
            "Frame stats"
        );
        self.counters.reset(MISSED_FRAMES);
    }
}
