//! Growable arena of bump pools.
//!
//! [`Arena`] owns an append-only list of [`Pool`]s. Requests go to the first
//! pool (in creation order) that can fit them; when none can, exactly one new
//! pool is created, sized by the growth policy:
//!
//! ```text
//! capacity(first)  = max(size, initial_capacity)
//! capacity(next)   = max(size, growth_factor * capacity(previous))
//! ```
//!
//! A new pool's base is aligned to the triggering request's alignment, so
//! that request never needs padding. Geometric growth is clamped to
//! `max_pool_capacity` when a ceiling is configured. An allocation never
//! spans two pools.

use std::alloc::Layout;
use std::cell::{Ref, RefCell, RefMut};
use std::ptr::NonNull;

use tracing::{debug, trace};

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::pool::{validate_alignment, Pool};
use crate::raw::RawBuffer;

/// A growable, pool-backed bump allocator.
///
/// Allocation goes through `&self`, so any number of typed allocators and
/// containers may share one arena; each of them borrows it, which keeps the
/// arena (and every pool buffer) alive for as long as they exist. Blocks
/// are never freed individually. All memory is released when the arena is
/// dropped, at which point every pointer it issued becomes invalid.
///
/// The arena is single-threaded: it may be moved to another thread but not
/// shared between threads.
#[derive(Debug, Default)]
pub struct Arena {
    pools: RefCell<Vec<Pool>>,
    config: ArenaConfig,
}

impl Arena {
    /// Create an arena with the default config (1 KiB first pool, ×2 growth).
    ///
    /// No pool is created until the first allocation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena whose first pool holds `initial_capacity` bytes.
    pub fn with_initial_capacity(initial_capacity: usize) -> Result<Self, ArenaError> {
        Self::with_config(ArenaConfig::new(initial_capacity))
    }

    /// Create an arena from an explicit config.
    ///
    /// Returns `Err(ArenaError::InvalidConfig)` if the config is rejected by
    /// [`ArenaConfig::validate`].
    pub fn with_config(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            pools: RefCell::new(Vec::new()),
            config,
        })
    }

    /// Allocate `size` uninitialised bytes aligned to `alignment`.
    ///
    /// The returned pointer is non-null, aligned, and valid until the arena
    /// is dropped. Fails with [`ArenaError::PoolsBorrowed`] while a
    /// [`pools`](Self::pools) view is alive.
    pub fn allocate(&self, size: usize, alignment: usize) -> Result<NonNull<u8>, ArenaError> {
        validate_alignment(alignment)?;
        let mut pools = self.pools_mut()?;

        if let Some(pool) = pools.iter_mut().find(|pool| pool.fits(size, alignment)) {
            return pool.allocate(size, alignment);
        }

        let capacity = self.next_pool_capacity(pools.last(), size, alignment)?;
        let mut pool = Pool::with_base_alignment(capacity, alignment)?;
        let ptr = pool.allocate(size, alignment)?;
        debug!(
            pool = pools.len(),
            capacity,
            size,
            alignment,
            "created arena pool"
        );
        pools.push(pool);
        Ok(ptr)
    }

    /// Resize the block at `ptr` in place to `new_size` bytes.
    ///
    /// Succeeds only when `ptr` is the most recent allocation of the pool
    /// that owns it and that pool has room; the same pointer is returned.
    /// There is no fallback: on failure the caller must allocate a fresh
    /// block and copy the data itself. Fails with
    /// [`ArenaError::PoolsBorrowed`] while a [`pools`](Self::pools) view is
    /// alive.
    ///
    /// # Safety
    ///
    /// The caller must own the block at `ptr`: no reference or live value
    /// handed out by anyone else may point into it. When `new_size` is
    /// smaller than the block, the bytes past `ptr + new_size` go back to
    /// the pool and are served to later allocations, so the caller must not
    /// access them again.
    ///
    /// Without `unsafe` the call does not compile:
    ///
    /// ```compile_fail,E0133
    /// let arena = strata_arena::Arena::new();
    /// let ptr = arena.allocate(8, 8).unwrap();
    /// arena.reallocate(ptr, 0, 8).unwrap();
    /// ```
    #[allow(unsafe_code)]
    pub unsafe fn reallocate(
        &self,
        ptr: NonNull<u8>,
        new_size: usize,
        alignment: usize,
    ) -> Result<NonNull<u8>, ArenaError> {
        validate_alignment(alignment)?;
        let mut pools = self.pools_mut()?;
        let index = owner_of(&pools, ptr).ok_or(ArenaError::UnknownPointer)?;

        let result = pools[index].reallocate(ptr, new_size, alignment);
        if let Err(err) = &result {
            trace!(pool = index, new_size, %err, "in-place reallocation refused");
        }
        result
    }

    /// [`allocate`](Self::allocate) with size and alignment from `layout`.
    pub fn allocate_layout(&self, layout: Layout) -> Result<NonNull<u8>, ArenaError> {
        self.allocate(layout.size(), layout.align())
    }

    /// [`reallocate`](Self::reallocate) with size and alignment from `layout`.
    ///
    /// # Safety
    ///
    /// Same contract as [`reallocate`](Self::reallocate).
    #[allow(unsafe_code)]
    pub unsafe fn reallocate_layout(
        &self,
        ptr: NonNull<u8>,
        layout: Layout,
    ) -> Result<NonNull<u8>, ArenaError> {
        // SAFETY: the caller upholds `reallocate`'s contract.
        unsafe { self.reallocate(ptr, layout.size(), layout.align()) }
    }

    /// Read-only view of all pools in creation order.
    ///
    /// While the view is alive, [`allocate`](Self::allocate) and
    /// [`reallocate`](Self::reallocate) fail with
    /// [`ArenaError::PoolsBorrowed`].
    pub fn pools(&self) -> Ref<'_, [Pool]> {
        Ref::map(self.pools.borrow(), Vec::as_slice)
    }

    /// Number of pools created so far.
    pub fn pool_count(&self) -> usize {
        self.pools.borrow().len()
    }

    /// Capacity of the first pool.
    pub fn initial_capacity(&self) -> usize {
        self.config.initial_capacity
    }

    /// Multiplier between consecutive pool capacities.
    pub fn growth_factor(&self) -> usize {
        self.config.growth_factor
    }

    /// The config the arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Sum of all pool capacities in bytes.
    pub fn total_capacity(&self) -> usize {
        self.pools.borrow().iter().map(Pool::total_capacity).sum()
    }

    /// Sum of all bytes consumed across pools, padding included.
    pub fn total_used(&self) -> usize {
        self.pools.borrow().iter().map(Pool::size).sum()
    }

    fn pools_mut(&self) -> Result<RefMut<'_, Vec<Pool>>, ArenaError> {
        self.pools
            .try_borrow_mut()
            .map_err(|_| ArenaError::PoolsBorrowed)
    }

    fn next_pool_capacity(
        &self,
        last: Option<&Pool>,
        size: usize,
        alignment: usize,
    ) -> Result<usize, ArenaError> {
        let layout_limit = RawBuffer::max_capacity(alignment.max(RawBuffer::BASE_ALIGN));
        let limit = self
            .config
            .max_pool_capacity
            .map_or(layout_limit, |max| max.min(layout_limit));

        // The new pool's base satisfies `alignment`, so the block needs
        // exactly `size` bytes.
        if size > limit {
            return Err(ArenaError::AllocationTooLarge {
                requested: size,
                limit,
            });
        }

        let growth = match last {
            None => self.config.initial_capacity,
            Some(pool) => pool.total_capacity().saturating_mul(self.config.growth_factor),
        };
        Ok(size.max(growth.min(limit)))
    }
}

/// Index of the pool that owns `ptr`.
///
/// A pool whose tip is `ptr` wins; otherwise the newest pool whose consumed
/// range contains it.
fn owner_of(pools: &[Pool], ptr: NonNull<u8>) -> Option<usize> {
    let mut owner = None;
    for (index, pool) in pools.iter().enumerate().rev() {
        if pool.is_last_allocation(ptr) {
            return Some(index);
        }
        if owner.is_none() && pool.contains(ptr) {
            owner = Some(index);
        }
    }
    owner
}
