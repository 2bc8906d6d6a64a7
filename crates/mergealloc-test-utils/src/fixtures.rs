//! Reusable arena and workload fixtures.
//!
//! - [`poisoned_arena`]: heap arena pre-filled with a recognisable byte.
//! - [`allocate_all`]: allocate a list of sizes, failing the test on OOM.
//! - [`permutations`]: every free order for small allocation sets.

use mergealloc::{ArenaConfig, ArenaProvider, HeapArena};

use crate::ShadowAllocator;

/// Byte used by [`poisoned_arena`].
pub const POISON: u8 = 0xA5;

/// A heap arena of `capacity` bytes filled with [`POISON`].
pub fn poisoned_arena(capacity: usize) -> HeapArena {
    HeapArena::from_config(&ArenaConfig {
        capacity,
        fill_byte: POISON,
    })
    .expect("fixture capacity must be non-zero")
}

/// Allocate each size in order and return the addresses.
pub fn allocate_all<A: ArenaProvider + ?Sized>(
    shadow: &mut ShadowAllocator<'_, A>,
    sizes: &[usize],
) -> Vec<usize> {
    sizes
        .iter()
        .map(|&size| {
            shadow
                .allocate(size)
                .unwrap_or_else(|err| panic!("allocate({size}) failed: {err}"))
        })
        .collect()
}

/// All orderings of `0..n`, for exhaustive free-order tests.
///
/// Grows as `n!`; keep `n` small.
pub fn permutations(n: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current: Vec<usize> = (0..n).collect();
    permute(&mut current, 0, &mut out);
    out
}

fn permute(items: &mut [usize], k: usize, out: &mut Vec<Vec<usize>>) {
    if k == items.len() {
        out.push(items.to_vec());
        return;
    }
    for i in k..items.len() {
        items.swap(k, i);
        permute(items, k + 1, out);
        items.swap(k, i);
    }
}
