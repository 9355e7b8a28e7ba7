//! Memory arena
//!
//! One up-front allocation split into a permanent region (long-lived
//! simulation state) followed by a transient region (scratch). Records are
//! placed at the head of the permanent region and reinterpreted in place
//! through `bytemuck`, so the arena never hands out individual allocations.

use bytemuck::Pod;
use std::fmt;
use std::mem;
use thiserror::Error;

pub const fn kilobytes(value: usize) -> usize {
    value * 1024
}

pub const fn megabytes(value: usize) -> usize {
    kilobytes(value) * 1024
}

pub const fn gigabytes(value: usize) -> usize {
    megabytes(value) * 1024
}

/// `value` MiB in bytes, or `AllocationFailed` when that overflows `usize`.
pub fn checked_megabytes(value: usize) -> Result<usize, MemoryError> {
    value
        .checked_mul(1024 * 1024)
        .ok_or(MemoryError::AllocationFailed {
            requested: usize::MAX,
        })
}

/// Backing word. Keeps the permanent region 8-byte aligned.
type Word = u64;
const WORD_SIZE: usize = mem::size_of::<Word>();

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("failed to allocate {requested} bytes of arena memory")]
    AllocationFailed { requested: usize },

    #[error("permanent region holds {available} bytes but {required} bytes are needed")]
    RegionTooSmall { required: usize, available: usize },

    #[error("permanent region is not aligned for a record with {align}-byte alignment")]
    Misaligned { align: usize },
}

/// Working memory owned by the platform and lent to the game every frame.
pub struct MemoryArena {
    initialized: bool,
    block: Vec<Word>,
    permanent_size: usize,
    transient_size: usize,
}

impl MemoryArena {
    /// Reserve one zeroed block of `permanent_size + transient_size` bytes.
    ///
    /// Fails with [`MemoryError::AllocationFailed`] instead of aborting when
    /// the system cannot provide the memory.
    pub fn new(permanent_size: usize, transient_size: usize) -> Result<Self, MemoryError> {
        let total = permanent_size
            .checked_add(transient_size)
            .ok_or(MemoryError::AllocationFailed {
                requested: usize::MAX,
            })?;

        let words = total.div_ceil(WORD_SIZE);
        let mut block: Vec<Word> = Vec::new();
        block
            .try_reserve_exact(words)
            .map_err(|_| MemoryError::AllocationFailed { requested: total })?;
        block.resize(words, 0);

        tracing::debug!(
            permanent = permanent_size,
            transient = transient_size,
            "Memory arena reserved"
        );

        Ok(Self {
            initialized: false,
            block,
            permanent_size,
            transient_size,
        })
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Flip the one-time setup flag. Repeated calls are no-ops.
    #[inline]
    pub fn mark_initialized(&mut self) {
        self.initialized = true;
    }

    #[inline]
    pub fn permanent_size(&self) -> usize {
        self.permanent_size
    }

    #[inline]
    pub fn transient_size(&self) -> usize {
        self.transient_size
    }

    #[inline]
    pub fn total_size(&self) -> usize {
        self.permanent_size + self.transient_size
    }

    pub fn permanent(&self) -> &[u8] {
        &self.bytes()[..self.permanent_size]
    }

    pub fn permanent_mut(&mut self) -> &mut [u8] {
        let end = self.permanent_size;
        &mut self.bytes_mut()[..end]
    }

    pub fn transient(&self) -> &[u8] {
        let start = self.permanent_size;
        &self.bytes()[start..]
    }

    pub fn transient_mut(&mut self) -> &mut [u8] {
        let start = self.permanent_size;
        &mut self.bytes_mut()[start..]
    }

    /// View the head of the permanent region as `T`.
    pub fn state<T: Pod>(&self) -> Result<&T, MemoryError> {
        let required = self.check_fits::<T>()?;
        bytemuck::try_from_bytes(&self.permanent()[..required]).map_err(|_| {
            MemoryError::Misaligned {
                align: mem::align_of::<T>(),
            }
        })
    }

    /// Reinterpret the head of the permanent region as `T` in place.
    pub fn state_mut<T: Pod>(&mut self) -> Result<&mut T, MemoryError> {
        let required = self.check_fits::<T>()?;
        bytemuck::try_from_bytes_mut(&mut self.permanent_mut()[..required]).map_err(|_| {
            MemoryError::Misaligned {
                align: mem::align_of::<T>(),
            }
        })
    }

    fn check_fits<T>(&self) -> Result<usize, MemoryError> {
        let required = mem::size_of::<T>();
        if required > self.permanent_size {
            return Err(MemoryError::RegionTooSmall {
                required,
                available: self.permanent_size,
            });
        }
        Ok(required)
    }

    fn bytes(&self) -> &[u8] {
        let total = self.total_size();
        &bytemuck::cast_slice::<Word, u8>(&self.block)[..total]
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        let total = self.total_size();
        &mut bytemuck::cast_slice_mut::<Word, u8>(&mut self.block)[..total]
    }
}

impl fmt::Debug for MemoryArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryArena")
            .field("initialized", &self.initialized)
            .field("permanent_size", &self.permanent_size)
            .field("transient_size", &self.transient_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytemuck::Zeroable;

    #[repr(C)]
    #[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
    struct Counter {
        ticks: u32,
        value: f32,
    }

    #[test]
    fn test_regions_are_split_in_order() {
        let arena = MemoryArena::new(kilobytes(4), kilobytes(1)).unwrap();

        assert_eq!(arena.permanent().len(), 4096);
        assert_eq!(arena.transient().len(), 1024);
        assert_eq!(arena.total_size(), 5120);
        assert!(!arena.is_initialized());
    }

    #[test]
    fn test_memory_starts_zeroed() {
        let arena = MemoryArena::new(64, 64).unwrap();
        assert!(arena.permanent().iter().all(|&b| b == 0));
        assert!(arena.transient().iter().all(|&b| b == 0));
        assert_eq!(*arena.state::<Counter>().unwrap(), Counter::zeroed());
    }

    #[test]
    fn test_state_is_reinterpreted_in_place() {
        let mut arena = MemoryArena::new(64, 0).unwrap();

        {
            let counter = arena.state_mut::<Counter>().unwrap();
            counter.ticks = 7;
            counter.value = 1.5;
        }

        let counter = arena.state::<Counter>().unwrap();
        assert_eq!(counter.ticks, 7);
        assert_eq!(counter.value, 1.5);
        assert_eq!(&arena.permanent()[..4], &7u32.to_ne_bytes());
    }

    #[test]
    fn test_transient_writes_do_not_touch_permanent() {
        let mut arena = MemoryArena::new(16, 16).unwrap();
        arena.transient_mut().fill(0xAB);

        assert!(arena.permanent().iter().all(|&b| b == 0));
        assert!(arena.transient().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_region_too_small() {
        let mut arena = MemoryArena::new(4, 64).unwrap();
        assert_eq!(
            arena.state_mut::<Counter>().unwrap_err(),
            MemoryError::RegionTooSmall {
                required: 8,
                available: 4
            }
        );
    }

    #[test]
    fn test_impossible_allocation_is_an_error() {
        let err = MemoryArena::new(usize::MAX / 2, usize::MAX / 4).unwrap_err();
        assert!(matches!(err, MemoryError::AllocationFailed { .. }));

        let err = MemoryArena::new(usize::MAX, 1).unwrap_err();
        assert!(matches!(err, MemoryError::AllocationFailed { .. }));
    }

    #[test]
    fn test_mark_initialized_is_idempotent() {
        let mut arena = MemoryArena::new(8, 0).unwrap();
        arena.mark_initialized();
        arena.mark_initialized();
        assert!(arena.is_initialized());
    }

    #[test]
    fn test_checked_megabytes_reports_overflow() {
        assert_eq!(checked_megabytes(64), Ok(megabytes(64)));
        assert_eq!(
            checked_megabytes(18_000_000_000_000),
            Err(MemoryError::AllocationFailed {
                requested: usize::MAX
            })
        );
    }

    #[test]
    fn test_size_helpers() {
        assert_eq!(kilobytes(1), 1024);
        assert_eq!(megabytes(2), 2 * 1024 * 1024);
        assert_eq!(gigabytes(1), 1024 * 1024 * 1024);
    }
}
