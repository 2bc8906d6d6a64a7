//! In-object fixed-size arena.

use crate::provider::ArenaProvider;

/// An arena whose bytes live inside the value itself.
///
/// `N` is fixed at compile time. The buffer is zero-initialised unless built
/// with [`FixedArena::filled`]. Because the bytes are inline, the start
/// address changes if the value moves; allocators borrow the arena, which
/// pins it for as long as addresses handed out by them are meaningful.
#[derive(Clone, Debug)]
pub struct FixedArena<const N: usize> {
    block: [u8; N],
}

impl<const N: usize> FixedArena<N> {
    /// Length of every `FixedArena<N>` in bytes.
    pub const SIZE: usize = N;

    /// Create a zeroed arena.
    pub const fn new() -> Self {
        Self { block: [0; N] }
    }

    /// Create an arena with every byte set to `byte`.
    ///
    /// Useful for spotting reads of memory that was never written.
    pub const fn filled(byte: u8) -> Self {
        Self { block: [byte; N] }
    }
}

impl<const N: usize> Default for FixedArena<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ArenaProvider for FixedArena<N> {
    fn as_bytes(&self) -> &[u8] {
        &self.block
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.block
    }

    fn size(&self) -> usize {
        N
    }
}
