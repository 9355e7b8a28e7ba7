//! Blowback Metrics - frame pacing statistics
//!
//! Rolling frame-time statistics and named counters for the frame loop.
//! Everything here compiles down to no-op stubs unless the `metrics`
//! feature is enabled, so the loop can record unconditionally.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use blowback_metrics::{Counter, FrameTimer};
//!
//! let mut timer = FrameTimer::new(60); // Track last 60 frames
//! timer.record(std::time::Duration::from_millis(16));
//! println!("FPS: {:.1}", timer.fps());
//!
//! let mut counters = Counter::new();
//! counters.increment(blowback_metrics::MISSED_FRAMES, 1);
//! ```

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;

/// Counter name for frames that overran their pacing target.
pub const MISSED_FRAMES: &str = "missed_frames";

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn record(&mut self, _frame_time: std::time::Duration) {}
    pub fn fps(&self) -> f64 { 0.0 }
    pub fn frame_time_ms(&self) -> f64 { 0.0 }
    pub fn last_frame_ms(&self) -> f64 { 0.0 }
    pub fn frame_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
}

#[cfg(not(feature = "metrics"))]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &str, _value: usize) {}
    pub fn get(&self, _name: &str) -> usize { 0 }
    pub fn reset(&mut self, _name: &str) {}
}

#[cfg(not(feature = "metrics"))]
impl Default for Counter {
    fn default() -> Self { Self }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    #[test]
    fn test_recording_api_available_in_every_build() {
        let mut timer = super::FrameTimer::new(60);
        timer.record(Duration::from_millis(16));
        let _ = timer.fps();

        let mut counter = super::Counter::new();
        counter.increment(super::MISSED_FRAMES, 1);
        let _ = counter.get(super::MISSED_FRAMES);
    }

    #[cfg(not(feature = "metrics"))]
    #[test]
    fn test_stubs_report_nothing() {
        let mut timer = super::FrameTimer::new(60);
        timer.record(Duration::from_millis(16));
        assert_eq!(timer.fps(), 0.0);

        let mut counter = super::Counter::new();
        counter.increment(super::MISSED_FRAMES, 3);
        assert_eq!(counter.get(super::MISSED_FRAMES), 0);
    }
}
