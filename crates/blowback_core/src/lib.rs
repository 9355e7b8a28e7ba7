//! Blowback Core
//!
//! Contains the platform-independent building blocks of the frame loop:
//! - Memory arena (permanent + transient storage)
//! - Frame pacing (clock and pacing policy)
//! - Math (glam re-export, camera helpers)

pub mod math;
pub mod memory;
pub mod time;

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
