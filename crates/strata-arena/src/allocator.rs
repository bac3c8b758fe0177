//! Typed allocation on top of the byte-oriented [`Arena`].
//!
//! [`ArenaAllocator`] turns element counts into `count * size_of::<T>()`
//! byte requests at `align_of::<T>()`. It is the surface containers use;
//! see [`ArenaVec`](crate::ArenaVec) for the growth pattern it is built for.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use crate::arena::Arena;
use crate::error::ArenaError;

/// A typed handle that allocates `T`s from a borrowed [`Arena`].
///
/// The `'a` borrow ties everything allocated through the handle to the
/// arena's lifetime. Handles are `Copy`; any number may share one arena.
pub struct ArenaAllocator<'a, T> {
    arena: &'a Arena,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T> ArenaAllocator<'a, T> {
    /// Create a handle allocating from `arena`.
    pub fn new(arena: &'a Arena) -> Self {
        Self {
            arena,
            _marker: PhantomData,
        }
    }

    /// The arena this handle allocates from.
    pub fn arena(&self) -> &'a Arena {
        self.arena
    }

    /// A handle for another element type over the same arena.
    pub fn rebind<U>(&self) -> ArenaAllocator<'a, U> {
        ArenaAllocator::new(self.arena)
    }

    /// Allocate uninitialised space for `count` values of `T`.
    ///
    /// Zero-byte requests (zero `count` or zero-sized `T`) return a
    /// dangling, well-aligned pointer without touching the arena.
    pub fn allocate(&self, count: usize) -> Result<NonNull<T>, ArenaError> {
        let layout = array_layout::<T>(count)?;
        if layout.size() == 0 {
            return Ok(NonNull::dangling());
        }
        self.arena.allocate_layout(layout).map(NonNull::cast)
    }

    /// Resize the block at `ptr` in place to hold `new_count` values.
    ///
    /// Same rules as [`Arena::reallocate`]: only the most recent block of
    /// its pool can be resized, and nothing is ever copied.
    ///
    /// # Safety
    ///
    /// The caller must own the block at `ptr`. In particular it must not
    /// back a value returned by [`construct_new`](Self::construct_new) or
    /// the storage of an [`ArenaVec`](crate::ArenaVec). When shrinking, no
    /// value past `new_count` may be accessed again.
    pub unsafe fn reallocate(
        &self,
        ptr: NonNull<T>,
        new_count: usize,
    ) -> Result<NonNull<T>, ArenaError> {
        let layout = array_layout::<T>(new_count)?;
        // SAFETY: the caller upholds the arena's reallocation contract.
        unsafe { self.arena.reallocate_layout(ptr.cast(), layout) }.map(NonNull::cast)
    }

    /// Release a block. The arena never frees individual blocks, so this
    /// does nothing; the bytes stay consumed until the arena is dropped.
    pub fn deallocate(&self, _ptr: NonNull<T>, _count: usize) {}

    /// Allocate space for one `T` and move `value` into it.
    ///
    /// The arena never runs destructors: `value`'s `Drop` impl, if any, is
    /// not called when the arena is dropped.
    pub fn construct_new(&self, value: T) -> Result<&'a mut T, ArenaError> {
        let ptr = self.allocate(1)?;
        // SAFETY: `ptr` is a fresh block (or a dangling pointer for a
        // zero-sized `T`) with the size and alignment of one `T`. No other
        // reference to it exists, and the arena borrow `'a` keeps the pool
        // buffer alive and unmoved for the returned lifetime.
        unsafe {
            ptr.as_ptr().write(value);
            Ok(&mut *ptr.as_ptr())
        }
    }
}

fn array_layout<T>(count: usize) -> Result<Layout, ArenaError> {
    Layout::array::<T>(count).map_err(|_| ArenaError::AllocationTooLarge {
        requested: count.saturating_mul(std::mem::size_of::<T>()),
        limit: isize::MAX as usize,
    })
}

impl<T> Clone for ArenaAllocator<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ArenaAllocator<'_, T> {}

/// Handles are equal when they allocate from the same arena.
impl<T, U> PartialEq<ArenaAllocator<'_, U>> for ArenaAllocator<'_, T> {
    fn eq(&self, other: &ArenaAllocator<'_, U>) -> bool {
        ptr::eq(self.arena, other.arena)
    }
}

impl<T> Eq for ArenaAllocator<'_, T> {}

impl<T> fmt::Debug for ArenaAllocator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaAllocator")
            .field("arena", &ptr::from_ref(self.arena))
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}
