//! Arena configuration parameters.

use crate::error::ArenaConfigError;

/// Configuration for a runtime-sized [`HeapArena`](crate::HeapArena).
///
/// Validated at construction; the arena never changes size afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Length of the region in bytes.
    ///
    /// Default: 65_536 (64 KiB). Must be non-zero. Allocators impose their
    /// own minimum on top of this (room for one free-list header).
    pub capacity: usize,

    /// Byte written to every position of a fresh arena.
    ///
    /// Default: 0. A non-zero pattern makes stale or uninitialised reads
    /// easy to spot in dumps.
    pub fill_byte: u8,
}

impl ArenaConfig {
    /// Default arena capacity: 64 KiB.
    pub const DEFAULT_CAPACITY: usize = 64 * 1024;

    /// Default fill byte.
    pub const DEFAULT_FILL_BYTE: u8 = 0;

    /// Create a config for an arena of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            fill_byte: Self::DEFAULT_FILL_BYTE,
        }
    }

    /// Check the parameters.
    pub fn validate(&self) -> Result<(), ArenaConfigError> {
        if self.capacity == 0 {
            return Err(ArenaConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
