//! Low-level primitives for arena memory operations.
//!
//! [`RawBuffer`] is the only owner of pool memory. Its allocation is made
//! once, never resized or moved, and released when the buffer is dropped.
//! Every `unsafe` block carries a mandatory `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::fmt;
use std::ptr::{self, NonNull};

use crate::error::ArenaError;

/// Zero-sized marker whose alignment matches [`RawBuffer::BASE_ALIGN`].
#[repr(align(16))]
struct BaseAlign;

/// An exclusively owned, fixed-size, uninitialised byte region.
pub(crate) struct RawBuffer {
    /// Start of the region. Dangling (but aligned) when `capacity == 0`.
    ptr: NonNull<u8>,
    capacity: usize,
    /// Alignment of `ptr`; never below [`Self::BASE_ALIGN`].
    align: usize,
}

impl RawBuffer {
    /// Alignment of every buffer's base address.
    pub(crate) const BASE_ALIGN: usize = std::mem::align_of::<BaseAlign>();

    /// Largest capacity [`Layout`] accepts for a base aligned to `align`.
    pub(crate) const fn max_capacity(align: usize) -> usize {
        (isize::MAX as usize).saturating_sub(align - 1)
    }

    /// Allocate a buffer of `capacity` bytes aligned to [`Self::BASE_ALIGN`].
    pub(crate) fn new(capacity: usize) -> Result<Self, ArenaError> {
        Self::with_min_alignment(capacity, Self::BASE_ALIGN)
    }

    /// Allocate a buffer of `capacity` bytes whose base is aligned to
    /// `align`, or to [`Self::BASE_ALIGN`] if that is larger.
    ///
    /// `align` must be a power of two. Aborts through
    /// [`alloc::handle_alloc_error`] if the host allocator is exhausted,
    /// matching the standard collections.
    pub(crate) fn with_min_alignment(capacity: usize, align: usize) -> Result<Self, ArenaError> {
        let align = align.max(Self::BASE_ALIGN);
        if capacity == 0 {
            let ptr = if align == Self::BASE_ALIGN {
                NonNull::<BaseAlign>::dangling().cast()
            } else {
                NonNull::new(ptr::without_provenance_mut(align))
                    .ok_or(ArenaError::InvalidAlignment { alignment: align })?
            };
            return Ok(Self {
                ptr,
                capacity: 0,
                align,
            });
        }
        let layout = Self::layout(capacity, align)?;
        // SAFETY: `layout` has a non-zero size (checked above).
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        Ok(Self {
            ptr,
            capacity,
            align,
        })
    }

    fn layout(capacity: usize, align: usize) -> Result<Layout, ArenaError> {
        Layout::from_size_align(capacity, align).map_err(|_| ArenaError::AllocationTooLarge {
            requested: capacity,
            limit: Self::max_capacity(align),
        })
    }

    /// Total size of the region in bytes.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    /// Address of the first byte.
    pub(crate) fn addr(&self) -> usize {
        self.ptr.as_ptr().addr()
    }

    /// Base pointer of the region.
    pub(crate) fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Pointer `offset` bytes past the base.
    ///
    /// # Panics
    ///
    /// Panics if `offset` exceeds the capacity.
    pub(crate) fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        assert!(
            offset <= self.capacity,
            "offset {offset} outside buffer of {} bytes",
            self.capacity
        );
        // SAFETY: `offset <= capacity` keeps the result inside the allocation
        // or one past its end, and the base pointer is non-null.
        unsafe { self.ptr.add(offset) }
    }

    /// Offset of `ptr` from the base if it lies in `[base, base + capacity]`.
    pub(crate) fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        ptr.as_ptr()
            .addr()
            .checked_sub(self.addr())
            .filter(|&offset| offset <= self.capacity)
    }
}

impl Drop for RawBuffer {
    fn drop(&mut self) {
        if self.capacity == 0 {
            return;
        }
        // The layout was accepted by `new`, so rebuilding it cannot fail.
        if let Ok(layout) = Self::layout(self.capacity, self.align) {
            // SAFETY: `ptr` came from `alloc::alloc` with this exact layout
            // and is released exactly once, here.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) };
        }
    }
}

impl fmt::Debug for RawBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawBuffer")
            .field("ptr", &self.ptr)
            .field("capacity", &self.capacity)
            .field("align", &self.align)
            .finish()
    }
}

// SAFETY: the buffer uniquely owns its allocation and holds no thread-bound
// state, so moving it to another thread is sound.
unsafe impl Send for RawBuffer {}
