//! Strata: a growable pool arena for append-only data.
//!
//! This is the top-level facade crate that re-exports the public API of the
//! strata sub-crates. For most users, adding `strata` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! let arena = Arena::with_initial_capacity(1024).unwrap();
//!
//! // Raw bytes: the last block of a pool can grow without moving.
//! let ptr = arena.allocate(1, 1).unwrap();
//! // SAFETY: nothing else references the block.
//! assert_eq!(unsafe { arena.reallocate(ptr, 2, 1) }, Ok(ptr));
//! assert_eq!(arena.pools()[0].size(), 2);
//!
//! // Typed: construct values in place, or grow an arena-backed vector.
//! let alloc = ArenaAllocator::new(&arena);
//! let answer = alloc.construct_new(42u64).unwrap();
//! assert_eq!(*answer, 42);
//!
//! let mut values = ArenaVec::new_in(alloc.rebind::<u32>());
//! values.extend(0..100);
//! assert_eq!(values.last(), Some(&99));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `strata-arena` | `Arena`, `Pool`, `ArenaConfig`, typed adapter, `ArenaVec` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Pools, the arena, configuration, and typed allocation (`strata-arena`).
pub use strata_arena as arena;

/// Common imports for typical strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    pub use strata_arena::{Arena, ArenaAllocator, ArenaConfig, ArenaError, ArenaVec, Pool};
}
