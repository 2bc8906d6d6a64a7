//! In-arena free-block header layout and the padding rule.
//!
//! Every free block starts with a fixed 16-byte header:
//!
//! ```text
//! offset 0        8                16
//!        ├────────┼────────────────┤
//!        │ size   │ next           │  (both u64, little endian)
//!        └────────┴────────────────┘
//! ```
//!
//! `size` counts the whole block including the header. `next` is the arena
//! offset of the following free block, or [`u64::MAX`] for the last one.
//! Headers are read and written through the arena's byte slice, so every
//! access is bounds-checked.

/// Size of one free-block header in bytes.
///
/// Also the padding granularity: every request is rounded up to a multiple
/// of this value.
pub const HEADER_SIZE: usize = 16;

const WORD: usize = 8;

/// Encoded "no next block".
const NO_NEXT: u64 = u64::MAX;

/// Round `size` up to the next multiple of [`HEADER_SIZE`].
///
/// Returns `None` if the rounded value does not fit in `usize`. Zero stays
/// zero.
pub const fn padded_size(size: usize) -> Option<usize> {
    let remainder = size % HEADER_SIZE;
    if remainder == 0 {
        Some(size)
    } else {
        size.checked_add(HEADER_SIZE - remainder)
    }
}

/// Decoded free-block header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    /// Total block length, header included.
    pub size: usize,
    /// Arena offset of the next free block.
    pub next: Option<usize>,
}

impl Header {
    /// Read the header stored at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + HEADER_SIZE` exceeds the region.
    pub fn read(bytes: &[u8], offset: usize) -> Self {
        let size = read_word(bytes, offset);
        let next = read_word(bytes, offset + WORD);
        Self {
            size: size as usize,
            next: (next != NO_NEXT).then_some(next as usize),
        }
    }

    /// Write this header at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset + HEADER_SIZE` exceeds the region.
    pub fn write(self, bytes: &mut [u8], offset: usize) {
        write_word(bytes, offset, self.size as u64);
        write_word(bytes, offset + WORD, self.next.map_or(NO_NEXT, |n| n as u64));
    }

    /// Offset one past the block's last byte.
    pub fn end(self, offset: usize) -> usize {
        offset + self.size
    }
}

fn read_word(bytes: &[u8], at: usize) -> u64 {
    let mut word = [0u8; WORD];
    word.copy_from_slice(&bytes[at..at + WORD]);
    u64::from_le_bytes(word)
}

fn write_word(bytes: &mut [u8], at: usize, value: u64) {
    bytes[at..at + WORD].copy_from_slice(&value.to_le_bytes());
}
