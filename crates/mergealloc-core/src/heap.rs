//! Heap-backed arena.

use crate::config::ArenaConfig;
use crate::error::ArenaConfigError;
use crate::provider::ArenaProvider;

/// An arena backed by a single boxed slice.
///
/// The buffer is allocated once at construction and never resized. Unlike
/// [`FixedArena`](crate::FixedArena), the start address survives moves of
/// the `HeapArena` value itself.
#[derive(Clone, Debug)]
pub struct HeapArena {
    block: Box<[u8]>,
}

impl HeapArena {
    /// Allocate a zeroed arena of `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`HeapArena::from_config`] to get
    /// an error value instead.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "heap arena capacity must be non-zero");
        Self {
            block: vec![0; capacity].into_boxed_slice(),
        }
    }

    /// Allocate an arena described by `config`.
    ///
    /// The buffer is filled with `config.fill_byte`.
    pub fn from_config(config: &ArenaConfig) -> Result<Self, ArenaConfigError> {
        config.validate()?;
        Ok(Self {
            block: vec![config.fill_byte; config.capacity].into_boxed_slice(),
        })
    }

    /// Memory usage of the backing buffer in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.block.len()
    }
}

impl Default for HeapArena {
    fn default() -> Self {
        Self::new(ArenaConfig::DEFAULT_CAPACITY)
    }
}

impl ArenaProvider for HeapArena {
    fn as_bytes(&self) -> &[u8] {
        &self.block
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_allocates_requested_capacity() {
        let arena = HeapArena::new(1024);
        assert_eq!(arena.size(), 1024);
        assert_eq!(arena.memory_bytes(), 1024);
        assert!(arena.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn new_rejects_zero_capacity() {
        let _ = HeapArena::new(0);
    }

    #[test]
    fn from_config_applies_fill_byte() {
        let config = ArenaConfig {
            capacity: 128,
            fill_byte: 0x5A,
        };
        let arena = HeapArena::from_config(&config).unwrap();
        assert_eq!(arena.size(), 128);
        assert!(arena.as_bytes().iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn from_config_rejects_zero_capacity() {
        let config = ArenaConfig::new(0);
        assert_eq!(
            HeapArena::from_config(&config).unwrap_err(),
            ArenaConfigError::ZeroCapacity
        );
    }

    #[test]
    fn begin_survives_move() {
        let arena = HeapArena::new(64);
        let begin = arena.begin();
        let moved = Box::new(arena);
        assert_eq!(moved.begin(), begin);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn from_config_matches_capacity_and_fill(
                capacity in 1usize..4096,
                fill_byte in any::<u8>(),
            ) {
                let arena = HeapArena::from_config(&ArenaConfig { capacity, fill_byte }).unwrap();
                prop_assert_eq!(arena.size(), capacity);
                prop_assert!(arena.as_bytes().iter().all(|&b| b == fill_byte));
            }
        }
    }
}
