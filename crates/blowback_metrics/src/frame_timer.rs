//! Rolling frame-time statistics
//!
//! The frame loop measures each frame through its pacer and hands the
//! achieved duration here; this type only aggregates.

use super::ring_buffer::RingBuffer;
use std::time::Duration;

pub struct FrameTimer {
    frame_times: RingBuffer<Duration>,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frame_times: RingBuffer::new(capacity),
        }
    }

    pub fn record(&mut self, frame_time: Duration) {
        self.frame_times.push(frame_time);
    }

    pub fn fps(&self) -> f64 {
        let avg = self.frame_times.average().as_secs_f64();
        if avg > 0.0 {
            1.0 / avg
        } else {
            0.0
        }
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.frame_times.average().as_secs_f64() * 1000.0
    }

    /// Duration of the most recently recorded frame.
    pub fn last_frame_ms(&self) -> f64 {
        self.frame_times
            .latest()
            .map_or(0.0, |frame| frame.as_secs_f64() * 1000.0)
    }

    pub fn frame_time_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.frame_times.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_from_recorded_frames() {
        let mut timer = FrameTimer::new(4);
        for _ in 0..4 {
            timer.record(Duration::from_millis(20));
        }
        assert!((timer.fps() - 50.0).abs() < 1e-9);
        assert!((timer.frame_time_ms() - 20.0).abs() < 1e-9);

        timer.record(Duration::from_millis(25));
        assert!((timer.last_frame_ms() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_frames_reports_zero_fps() {
        let timer = FrameTimer::new(4);
        assert_eq!(timer.fps(), 0.0);
        assert_eq!(timer.frame_time_range_ms(), (0.0, 0.0));
        assert_eq!(timer.last_frame_ms(), 0.0);
    }
}
