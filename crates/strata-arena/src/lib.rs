//! Pool-backed bump arena with in-place growth of the last allocation.
//!
//! Hands out raw, aligned memory blocks from a growing set of fixed-size
//! pools. Blocks are never freed individually; everything is released when
//! the arena is dropped. The most recent block of each pool can be grown or
//! shrunk in place without moving it, which is what append-only containers
//! need to avoid copying on every reserve.
//!
//! # Architecture
//!
//! ```text
//! Arena (pool directory, growth policy)
//! ├── ArenaConfig (initial capacity, growth factor, ceiling)
//! └── Pool × N (created on demand, never moved or freed early)
//!     └── RawBuffer (one heap allocation, bump cursor, growth-eligible tip)
//!
//! ArenaAllocator<'a, T> (typed adapter, borrows the arena)
//! └── ArenaVec<'a, T> (grows in place, relocates only when it must)
//! ```
//!
//! # Reallocation contract
//!
//! [`Arena::reallocate`] only succeeds for a pool's most recent allocation
//! when the pool still has room. It never falls back to a fresh block:
//! callers that need relocation allocate anew and copy, as [`ArenaVec`]
//! does. Shrinking hands bytes back to the pool, so the call is `unsafe`:
//! the caller promises it owns the block.
//!
//! # Safety
//!
//! `unsafe` code is confined to `raw` (buffer ownership), `allocator`
//! (constructing values in place), `vec` (element storage) and the
//! `reallocate` entry points of `arena`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod allocator;
pub mod arena;
pub mod config;
pub mod error;
pub mod pool;
mod raw;
pub mod vec;

// Public re-exports for the primary API surface.
pub use allocator::ArenaAllocator;
pub use arena::Arena;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use pool::Pool;
pub use vec::ArenaVec;
