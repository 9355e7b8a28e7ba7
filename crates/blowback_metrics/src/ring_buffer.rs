//! Fixed-capacity sample window

use std::time::Duration;

/// Keeps the most recent `capacity` samples, overwriting the oldest.
pub struct RingBuffer<T> {
    slots: Vec<T>,
    capacity: usize,
    next: usize,
}

impl<T: Copy> RingBuffer<T> {
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RingBuffer capacity must be positive");
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.slots.len() < self.capacity {
            self.slots.push(sample);
        } else {
            self.slots[self.next] = sample;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<T> {
        if self.slots.is_empty() {
            return None;
        }
        let index = (self.next + self.capacity - 1) % self.capacity;
        self.slots.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl RingBuffer<Duration> {
    pub fn average(&self) -> Duration {
        if self.slots.is_empty() {
            return Duration::ZERO;
        }
        self.slots.iter().sum::<Duration>() / self.slots.len() as u32
    }

    pub fn min_max(&self) -> (Duration, Duration) {
        self.slots
            .iter()
            .fold(None, |acc: Option<(Duration, Duration)>, &sample| match acc {
                None => Some((sample, sample)),
                Some((min, max)) => Some((min.min(sample), max.max(sample))),
            })
            .unwrap_or((Duration::ZERO, Duration::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_overwrites_oldest() {
        let mut buffer = RingBuffer::new(3);

        buffer.push(Duration::from_millis(10));
        buffer.push(Duration::from_millis(20));
        buffer.push(Duration::from_millis(30));
        assert_eq!(buffer.average(), Duration::from_millis(20));

        buffer.push(Duration::from_millis(40));
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.average(), Duration::from_millis(30)); // (20 + 30 + 40) / 3
        assert_eq!(buffer.latest(), Some(Duration::from_millis(40)));
    }

    #[test]
    fn test_min_max_tracks_window() {
        let mut buffer = RingBuffer::new(2);
        assert_eq!(buffer.min_max(), (Duration::ZERO, Duration::ZERO));

        buffer.push(Duration::from_millis(5));
        buffer.push(Duration::from_millis(50));
        buffer.push(Duration::from_millis(17));

        assert_eq!(
            buffer.min_max(),
            (Duration::from_millis(17), Duration::from_millis(50))
        );
    }

    #[test]
    fn test_empty_buffer_has_no_latest() {
        let buffer: RingBuffer<Duration> = RingBuffer::new(4);
        assert!(buffer.is_empty());
        assert_eq!(buffer.latest(), None);
        assert_eq!(buffer.average(), Duration::ZERO);
    }
}
