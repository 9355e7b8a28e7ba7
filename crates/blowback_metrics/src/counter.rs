//! Named event counters (missed frames, skipped draws)

use std::collections::HashMap;

#[derive(Default)]
pub struct Counter {
    counts: HashMap<&'static str, usize>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: &'static str, value: usize) {
        *self.counts.entry(name).or_insert(0) += value;
    }

    pub fn get(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn reset(&mut self, name: &str) {
        if let Some(count) = self.counts.get_mut(name) {
            *count = 0;
        }
    }
}
