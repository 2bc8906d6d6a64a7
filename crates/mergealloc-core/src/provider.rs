//! The arena provider capability.

/// A fixed, contiguous byte region handed to an allocator.
///
/// Implementors own the backing bytes for their whole lifetime. The region
/// must not change length, and its start address must not change while it
/// is borrowed (a borrow already rules out moving the provider).
///
/// Only [`as_bytes`](ArenaProvider::as_bytes) and
/// [`as_bytes_mut`](ArenaProvider::as_bytes_mut) are required; the address
/// and length are derived from the slice by default.
pub trait ArenaProvider {
    /// The managed region.
    fn as_bytes(&self) -> &[u8];

    /// The managed region, writable.
    fn as_bytes_mut(&mut self) -> &mut [u8];

    /// Start address of the region.
    fn begin(&self) -> usize {
        self.as_bytes().as_ptr() as usize
    }

    /// Length of the region in bytes.
    fn size(&self) -> usize {
        self.as_bytes().len()
    }
}

impl<A: ArenaProvider + ?Sized> ArenaProvider for &mut A {
    fn as_bytes(&self) -> &[u8] {
        (**self).as_bytes()
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        (**self).as_bytes_mut()
    }

    fn begin(&self) -> usize {
        (**self).begin()
    }

    fn size(&self) -> usize {
        (**self).size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecArena(Vec<u8>);

    impl ArenaProvider for VecArena {
        fn as_bytes(&self) -> &[u8] {
            &self.0
        }

        fn as_bytes_mut(&mut self) -> &mut [u8] {
            &mut self.0
        }
    }

    #[test]
    fn defaults_derive_from_slice() {
        let arena = VecArena(vec![0; 48]);
        assert_eq!(arena.size(), 48);
        assert_eq!(arena.begin(), arena.0.as_ptr() as usize);
    }

    fn poke<A: ArenaProvider>(mut arena: A, at: usize) -> (usize, usize) {
        arena.as_bytes_mut()[at] = 7;
        (arena.begin(), arena.size())
    }

    #[test]
    fn mut_borrow_forwards_to_provider() {
        let mut arena = VecArena(vec![0; 32]);
        let begin = arena.begin();
        assert_eq!(poke(&mut arena, 3), (begin, 32));
        assert_eq!(arena.0[3], 7);
    }
}
