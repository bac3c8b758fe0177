//! Arena-backed growable array.
//!
//! [`ArenaVec`] is the append-only consumer the arena is shaped around.
//! When it runs out of room it first asks the arena to extend its block in
//! place; this succeeds as long as the block is still the most recent
//! allocation of its pool and the pool has space. Otherwise it allocates a
//! fresh block, moves the elements over, and abandons the old block, whose
//! bytes stay consumed until the arena is dropped.

#![allow(unsafe_code)]

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};
use std::slice;

use tracing::trace;

use crate::allocator::ArenaAllocator;
use crate::error::ArenaError;

/// A contiguous growable array whose storage lives in an [`Arena`](crate::Arena).
///
/// Elements are dropped when the vector is dropped; the storage itself is
/// reclaimed only with the arena.
pub struct ArenaVec<'a, T> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    alloc: ArenaAllocator<'a, T>,
}

impl<'a, T> ArenaVec<'a, T> {
    const IS_ZST: bool = std::mem::size_of::<T>() == 0;

    /// Largest element count a single block can describe.
    const MAX_CAP: usize = if Self::IS_ZST {
        usize::MAX
    } else {
        isize::MAX as usize / std::mem::size_of::<T>()
    };

    /// Create an empty vector. Nothing is allocated until the first push.
    pub fn new_in(alloc: ArenaAllocator<'a, T>) -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            cap: if Self::IS_ZST { usize::MAX } else { 0 },
            alloc,
        }
    }

    /// Create an empty vector with room for exactly `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if the arena cannot serve the request.
    pub fn with_capacity_in(capacity: usize, alloc: ArenaAllocator<'a, T>) -> Self {
        let mut vec = Self::new_in(alloc);
        vec.reserve_exact(capacity);
        vec
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of elements the current block can hold.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// The allocator handle backing this vector.
    pub fn allocator(&self) -> ArenaAllocator<'a, T> {
        self.alloc
    }

    /// Pointer to the first element's slot.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// The elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `ptr` is valid for `len` initialised elements (or dangling
        // and well-aligned when `len == 0` or `T` is zero-sized).
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// The elements as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`; `&mut self` guarantees uniqueness.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    /// Append `value`.
    ///
    /// # Panics
    ///
    /// Panics if the arena cannot serve the growth request.
    pub fn push(&mut self, value: T) {
        if let Err(err) = self.try_push(value) {
            panic!("arena allocation failed: {err}");
        }
    }

    /// Append `value`, reporting allocation failure instead of panicking.
    ///
    /// On failure `value` is dropped and the vector is unchanged.
    pub fn try_push(&mut self, value: T) -> Result<(), ArenaError> {
        if self.len == self.cap {
            self.try_reserve(1)?;
        }
        // SAFETY: `len < cap`, so the slot is inside the block and unused.
        unsafe { self.ptr.as_ptr().add(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot at the old `len - 1` is initialised and, after the
        // decrement, no longer tracked, so it is read exactly once.
        Some(unsafe { self.ptr.as_ptr().add(self.len).read() })
    }

    /// Drop elements past `len`, keeping the capacity.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let tail = ptr::slice_from_raw_parts_mut(
            // SAFETY: `len < self.len`, so the offset stays inside the block.
            unsafe { self.ptr.as_ptr().add(len) },
            self.len - len,
        );
        self.len = len;
        // SAFETY: the tail elements are initialised and no longer tracked.
        unsafe { ptr::drop_in_place(tail) };
    }

    /// Drop all elements, keeping the capacity.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Make room for at least `additional` more elements.
    ///
    /// Does nothing when the capacity already suffices, so repeated calls
    /// with the same request leave the arena untouched.
    ///
    /// # Panics
    ///
    /// Panics if the arena cannot serve the growth request.
    pub fn reserve(&mut self, additional: usize) {
        if let Err(err) = self.try_reserve(additional) {
            panic!("arena allocation failed: {err}");
        }
    }

    /// Make room for exactly `additional` more elements.
    ///
    /// # Panics
    ///
    /// Panics if the arena cannot serve the growth request.
    pub fn reserve_exact(&mut self, additional: usize) {
        if let Err(err) = self.try_reserve_exact(additional) {
            panic!("arena allocation failed: {err}");
        }
    }

    /// Fallible [`reserve`](Self::reserve) with amortised doubling.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), ArenaError> {
        let needed = self.needed(additional)?;
        if needed <= self.cap {
            return Ok(());
        }
        self.grow_to(Self::amortized_capacity(self.cap, needed))
    }

    /// Fallible [`reserve_exact`](Self::reserve_exact).
    pub fn try_reserve_exact(&mut self, additional: usize) -> Result<(), ArenaError> {
        let needed = self.needed(additional)?;
        if needed <= self.cap {
            return Ok(());
        }
        self.grow_to(needed)
    }

    /// Doubling growth, capped where a block stops being describable. Never
    /// below `needed`.
    fn amortized_capacity(cap: usize, needed: usize) -> usize {
        needed.max(cap.saturating_mul(2).min(Self::MAX_CAP))
    }

    fn needed(&self, additional: usize) -> Result<usize, ArenaError> {
        self.len
            .checked_add(additional)
            .ok_or(ArenaError::AllocationTooLarge {
                requested: usize::MAX,
                limit: isize::MAX as usize,
            })
    }

    /// Move to a block of `new_cap` elements, in place when possible.
    fn grow_to(&mut self, new_cap: usize) -> Result<(), ArenaError> {
        if self.cap == 0 {
            self.ptr = self.alloc.allocate(new_cap)?;
            self.cap = new_cap;
            return Ok(());
        }

        // SAFETY: the vector owns its block exclusively and `new_cap > cap`,
        // so no initialised element is given back to the arena.
        match unsafe { self.alloc.reallocate(self.ptr, new_cap) } {
            Ok(ptr) => self.ptr = ptr,
            Err(ArenaError::NotLastAllocation | ArenaError::OutOfSpace { .. }) => {
                let fresh = self.alloc.allocate(new_cap)?;
                trace!(
                    len = self.len,
                    old_cap = self.cap,
                    new_cap,
                    "relocating arena vector"
                );
                // SAFETY: both blocks hold at least `len` elements and are
                // distinct arena blocks, so they do not overlap. The old
                // slots are abandoned without being dropped.
                unsafe {
                    ptr::copy_nonoverlapping(self.ptr.as_ptr(), fresh.as_ptr(), self.len);
                }
                self.alloc.deallocate(self.ptr, self.cap);
                self.ptr = fresh;
            }
            Err(err) => return Err(err),
        }
        self.cap = new_cap;
        Ok(())
    }
}

impl<T> Drop for ArenaVec<'_, T> {
    fn drop(&mut self) {
        self.clear();
        self.alloc.deallocate(self.ptr, self.cap);
    }
}

impl<T> Deref for ArenaVec<'_, T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> DerefMut for ArenaVec<'_, T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> Extend<T> for ArenaVec<'_, T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for value in iter {
            self.push(value);
        }
    }
}

impl<'v, T> IntoIterator for &'v ArenaVec<'_, T> {
    type Item = &'v T;
    type IntoIter = slice::Iter<'v, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for ArenaVec<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::arena::Arena;

    #[test]
    fn empty_vector_allocates_nothing() {
        let arena = Arena::new();
        let vec = ArenaVec::<i32>::new_in(ArenaAllocator::new(&arena));
        assert_eq!(vec.len(), 0);
        assert_eq!(vec.capacity(), 0);
        assert!(vec.is_empty());
        assert_eq!(arena.pool_count(), 0);
    }

    #[test]
    fn push_and_index() {
        let arena = Arena::new();
        let mut vec = ArenaVec::new_in(ArenaAllocator::new(&arena));
        for i in 0..10 {
            vec.push(i);
        }
        assert_eq!(vec.len(), 10);
        assert_eq!(vec[0], 0);
        assert_eq!(vec[9], 9);
        assert_eq!(vec.first(), Some(&0));
        assert_eq!(vec.last(), Some(&9));
    }

    #[test]
    fn growth_stays_in_place_while_tip() {
        let arena = Arena::new();
        let mut vec = ArenaVec::new_in(ArenaAllocator::new(&arena));
        vec.push(1u32);
        let start = vec.as_ptr();
        for i in 0..63 {
            vec.push(i);
        }
        assert_eq!(vec.as_ptr(), start);
        assert_eq!(vec.capacity(), 64);
        assert_eq!(arena.total_used(), 64 * 4);
        assert_eq!(arena.pool_count(), 1);
    }

    #[test]
    fn reserve_then_grow_counts_only_new_bytes() {
        let arena = Arena::with_initial_capacity(1024).unwrap();
        let mut vec = ArenaVec::<i32>::new_in(ArenaAllocator::new(&arena));
        vec.reserve_exact(2);
        let initial = arena.pools()[0].size();

        vec.reserve_exact(4);
        for i in 0..4 {
            vec.push(i);
            assert_eq!(vec[i as usize], i);
        }
        assert_eq!(vec.len(), 4);
        assert_eq!(arena.pool_count(), 1);
        assert_eq!(arena.pools()[0].total_capacity(), arena.initial_capacity());
        assert_eq!(arena.pools()[0].size(), initial + 2 * 4);
    }

    #[test]
    fn repeated_identical_reserve_is_idempotent() {
        let arena = Arena::with_initial_capacity(1024).unwrap();
        let mut vec = ArenaVec::<i32>::new_in(ArenaAllocator::new(&arena));
        vec.reserve(10);
        let size = arena.pools()[0].size();
        for _ in 0..10 {
            vec.reserve(10);
        }
        assert_eq!(vec.capacity(), 10);
        assert_eq!(arena.pool_count(), 1);
        assert_eq!(arena.pools()[0].total_capacity(), arena.initial_capacity());
        assert_eq!(arena.pools()[0].size(), size);
    }

    #[test]
    fn relocates_when_no_longer_tip() {
        let arena = Arena::new();
        let alloc = ArenaAllocator::<u16>::new(&arena);
        let mut vec = ArenaVec::with_capacity_in(4, alloc);
        vec.extend([1, 2, 3, 4]);
        let before = vec.as_ptr();

        // Someone else allocates after the vector's block.
        alloc.allocate(1).unwrap();

        vec.push(5);
        assert_ne!(vec.as_ptr(), before);
        assert_eq!(vec.as_slice(), &[1, 2, 3, 4, 5]);
        assert_eq!(vec.capacity(), 8);
    }

    #[test]
    fn pop_and_truncate() {
        let arena = Arena::new();
        let mut vec = ArenaVec::new_in(ArenaAllocator::new(&arena));
        vec.extend(0..5);
        assert_eq!(vec.pop(), Some(4));
        vec.truncate(2);
        assert_eq!(vec.as_slice(), &[0, 1]);
        vec.clear();
        assert_eq!(vec.pop(), None);
        assert!(vec.capacity() >= 5);
    }

    #[test]
    fn drop_runs_element_destructors() {
        let drops = Rc::new(Cell::new(0));
        struct Counted(Rc<Cell<usize>>);
        impl Drop for Counted {
            fn drop(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let arena = Arena::new();
        {
            let mut vec = ArenaVec::new_in(ArenaAllocator::new(&arena));
            for _ in 0..3 {
                vec.push(Counted(Rc::clone(&drops)));
            }
            vec.truncate(1);
            assert_eq!(drops.get(), 2);
        }
        assert_eq!(drops.get(), 3);
    }

    #[test]
    fn zero_sized_elements_never_allocate() {
        let arena = Arena::new();
        let mut vec = ArenaVec::new_in(ArenaAllocator::new(&arena));
        for _ in 0..1000 {
            vec.push(());
        }
        assert_eq!(vec.len(), 1000);
        assert_eq!(vec.capacity(), usize::MAX);
        assert_eq!(arena.pool_count(), 0);
    }

    #[test]
    fn try_reserve_reports_ceiling() {
        let config = crate::ArenaConfig::new(64).with_max_pool_capacity(64);
        let arena = Arena::with_config(config).unwrap();
        let mut vec = ArenaVec::<u64>::new_in(ArenaAllocator::new(&arena));
        assert!(vec.try_reserve_exact(8).is_ok());
        assert!(matches!(
            vec.try_reserve_exact(9),
            Err(ArenaError::AllocationTooLarge { .. })
        ));
        assert_eq!(vec.capacity(), 8);
    }

    #[test]
    #[should_panic(expected = "arena allocation failed")]
    fn push_panics_on_failure() {
        let config = crate::ArenaConfig::new(16).with_max_pool_capacity(16);
        let arena = Arena::with_config(config).unwrap();
        let mut vec = ArenaVec::<u64>::new_in(ArenaAllocator::new(&arena));
        for i in 0..3 {
            vec.push(i);
        }
    }

    #[test]
    fn doubling_is_capped_at_layout_limit() {
        type Big = [u64; 1024];
        let max = isize::MAX as usize / std::mem::size_of::<Big>();

        let cap = max / 2 + 1;
        let grown = ArenaVec::<Big>::amortized_capacity(cap, cap + 1);
        assert_eq!(grown, max);
        assert!(std::alloc::Layout::array::<Big>(grown).is_ok());

        assert_eq!(ArenaVec::<Big>::amortized_capacity(8, 9), 16);
        assert_eq!(ArenaVec::<Big>::amortized_capacity(8, 40), 40);

        let half = isize::MAX as usize / 2 + 1;
        assert_eq!(
            ArenaVec::<u8>::amortized_capacity(half, half + 1),
            isize::MAX as usize
        );
    }

    #[test]
    fn contents_survive_other_arena_users() {
        let arena = Arena::new();
        let alloc = ArenaAllocator::<u32>::new(&arena);
        let mut vec = ArenaVec::new_in(alloc);
        vec.extend([10, 20, 30, 40]);

        // Everything below runs after the vector's block, in the same pool.
        let bytes = arena.allocate(64, 4).unwrap();
        // SAFETY: `bytes` is a fresh 64-byte block owned by the test.
        unsafe { ptr::write_bytes(bytes.as_ptr(), 0xFF, 64) };
        let value = alloc.construct_new(999).unwrap();
        let mut other = ArenaVec::new_in(alloc);
        other.extend(0..100);
        assert_eq!(vec.as_slice(), &[10, 20, 30, 40]);
        assert_eq!(*value, 999);

        // Growing the vector now relocates it; the others stay put.
        vec.extend(50..60);
        *value += 1;
        assert_eq!(&vec[..4], &[10, 20, 30, 40]);
        assert!(vec[4..].iter().copied().eq(50..60));
        assert_eq!(*value, 1000);
        assert!(other.iter().copied().eq(0..100));
    }

    #[test]
    fn debug_lists_elements() {
        let arena = Arena::new();
        let mut vec = ArenaVec::new_in(ArenaAllocator::new(&arena));
        vec.extend([1, 2]);
        assert_eq!(format!("{vec:?}"), "[1, 2]");
    }
}
