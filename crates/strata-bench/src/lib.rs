//! Benchmark workloads for the strata arena.
//!
//! Provides deterministic allocation traces for benchmarks and examples:
//!
//! - [`mixed_requests`]: seeded sequence of small, variously aligned requests
//! - [`replay`]: drive an [`Arena`] with a request trace
//! - [`fill_vector`]: append-only growth through [`ArenaVec`]

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strata_arena::{Arena, ArenaAllocator, ArenaError, ArenaVec};

/// Largest request size produced by [`mixed_requests`].
pub const MAX_REQUEST_SIZE: usize = 512;

/// Largest alignment produced by [`mixed_requests`].
///
/// Pool buffers are at least 16-byte aligned, so padding for alignments up to
/// this value does not depend on where the host allocator places a pool.
pub const MAX_REQUEST_ALIGN: usize = 16;

/// One byte-level allocation request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    /// Bytes requested.
    pub size: usize,
    /// Required alignment (a power of two).
    pub alignment: usize,
}

/// Generate `count` requests from `seed`.
///
/// Sizes are uniform in `1..=MAX_REQUEST_SIZE`; alignments are powers of
/// two up to [`MAX_REQUEST_ALIGN`]. The same seed always yields the same
/// trace, and replaying it yields the same pool layout.
pub fn mixed_requests(seed: u64, count: usize) -> Vec<Request> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let align_steps = MAX_REQUEST_ALIGN.trailing_zeros() + 1;
    (0..count)
        .map(|_| {
            let size = 1 + (rng.next_u32() as usize) % MAX_REQUEST_SIZE;
            let alignment = 1usize << (rng.next_u32() % align_steps);
            Request { size, alignment }
        })
        .collect()
}

/// Serve every request in `trace` from `arena`. Returns the arena's total
/// used bytes afterwards.
pub fn replay(arena: &Arena, trace: &[Request]) -> Result<usize, ArenaError> {
    for request in trace {
        arena.allocate(request.size, request.alignment)?;
    }
    Ok(arena.total_used())
}

/// Push `0..count` into a fresh [`ArenaVec`] backed by `arena`.
pub fn fill_vector(arena: &Arena, count: u32) -> ArenaVec<'_, u32> {
    let mut vec = ArenaVec::new_in(ArenaAllocator::new(arena));
    vec.extend(0..count);
    vec
}
