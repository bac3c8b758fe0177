//! Fixed-capacity bump pools.
//!
//! A [`Pool`] owns one contiguous byte buffer and serves aligned blocks from
//! it by advancing a cursor. It remembers the block it served last; that
//! block (the pool's "tip") is the only one that may later grow or shrink in
//! place.

use std::fmt;
use std::ptr::NonNull;

use crate::error::ArenaError;
use crate::raw::RawBuffer;

/// Reject alignments that are zero or not a power of two.
pub(crate) fn validate_alignment(alignment: usize) -> Result<(), ArenaError> {
    if alignment.is_power_of_two() {
        Ok(())
    } else {
        Err(ArenaError::InvalidAlignment { alignment })
    }
}

/// A single contiguous byte buffer with bump allocation.
///
/// Pools are the storage unit of the [`Arena`](crate::Arena). The buffer is
/// allocated once at construction and never resized or moved, so every
/// pointer the pool hands out stays valid until the pool is dropped.
/// Individual blocks are never freed; alignment padding is never reused.
pub struct Pool {
    buffer: RawBuffer,
    /// Bump cursor: bytes consumed from the start of `buffer`.
    used: usize,
    /// Offset of the most recent allocation, if any.
    last_allocation: Option<usize>,
}

impl Pool {
    /// Create an empty pool with a buffer of `capacity` bytes.
    ///
    /// Fails with [`ArenaError::AllocationTooLarge`] if the capacity exceeds
    /// what the platform can describe as a single allocation.
    pub fn new(capacity: usize) -> Result<Self, ArenaError> {
        Ok(Self::from_buffer(RawBuffer::new(capacity)?))
    }

    /// Create an empty pool whose base address is aligned to at least
    /// `alignment`, so a first block at that alignment needs no padding.
    pub(crate) fn with_base_alignment(
        capacity: usize,
        alignment: usize,
    ) -> Result<Self, ArenaError> {
        let buffer = RawBuffer::with_min_alignment(capacity, alignment)?;
        Ok(Self::from_buffer(buffer))
    }

    fn from_buffer(buffer: RawBuffer) -> Self {
        Self {
            buffer,
            used: 0,
            last_allocation: None,
        }
    }

    /// Bump-allocate `size` bytes aligned to `alignment`.
    ///
    /// The block starts at the first suitably aligned address at or after
    /// the cursor. Padding in front of it is consumed as well. The returned
    /// block becomes the pool's tip; the previous tip loses its eligibility
    /// for in-place growth.
    ///
    /// The memory is uninitialised.
    pub fn allocate(&mut self, size: usize, alignment: usize) -> Result<NonNull<u8>, ArenaError> {
        let (offset, end) = self.placement(size, alignment)?;
        let ptr = self.buffer.ptr_at(offset);
        self.used = end;
        self.last_allocation = Some(offset);
        Ok(ptr)
    }

    /// Resize the pool's tip in place to `new_size` bytes.
    ///
    /// Returns `ptr` unchanged on success. Growing consumes more of the
    /// pool; shrinking hands the tail back to the cursor. Nothing is ever
    /// copied.
    ///
    /// Fails with [`ArenaError::NotLastAllocation`] if `ptr` is not the tip,
    /// whatever the remaining capacity, and with [`ArenaError::OutOfSpace`]
    /// if the tip cannot reach `new_size` bytes before the end of the buffer.
    pub fn reallocate(
        &mut self,
        ptr: NonNull<u8>,
        new_size: usize,
        alignment: usize,
    ) -> Result<NonNull<u8>, ArenaError> {
        validate_alignment(alignment)?;
        let tip = self.tip_offset(ptr).ok_or(ArenaError::NotLastAllocation)?;
        if ptr.as_ptr().addr() & (alignment - 1) != 0 {
            return Err(ArenaError::InvalidAlignment { alignment });
        }

        let available = self.total_capacity() - tip;
        if new_size > available {
            let current = self.used - tip;
            return Err(ArenaError::OutOfSpace {
                requested: new_size - current,
                remaining: self.remaining_capacity(),
            });
        }
        self.used = tip + new_size;
        Ok(ptr)
    }

    /// Whether [`allocate`](Self::allocate) would succeed for this request.
    ///
    /// Accounts for the exact padding needed at the current cursor.
    pub fn fits(&self, size: usize, alignment: usize) -> bool {
        self.placement(size, alignment).is_ok()
    }

    /// Whether `ptr` is this pool's current tip.
    pub fn is_last_allocation(&self, ptr: NonNull<u8>) -> bool {
        self.tip_offset(ptr).is_some()
    }

    /// Whether `ptr` lies within the consumed part of this pool's buffer.
    ///
    /// The range is closed at the cursor so that a zero-sized tip sitting
    /// exactly at the cursor still belongs to the pool.
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.buffer
            .offset_of(ptr)
            .is_some_and(|offset| offset <= self.used)
    }

    /// Bytes consumed so far, alignment padding included.
    pub fn size(&self) -> usize {
        self.used
    }

    /// Size of the buffer in bytes.
    pub fn total_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Bytes left after the cursor.
    pub fn remaining_capacity(&self) -> usize {
        self.buffer.capacity() - self.used
    }

    /// Whether nothing has been consumed yet.
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// The current tip, if the pool has served any allocation.
    pub fn last_allocation(&self) -> Option<NonNull<u8>> {
        self.last_allocation
            .map(|offset| self.buffer.ptr_at(offset))
    }

    /// Base address of the buffer.
    pub fn as_ptr(&self) -> *const u8 {
        self.buffer.as_ptr()
    }

    /// Compute `(block_offset, new_cursor)` for a request without mutating.
    fn placement(&self, size: usize, alignment: usize) -> Result<(usize, usize), ArenaError> {
        validate_alignment(alignment)?;
        let cursor = self.buffer.addr() + self.used;
        let padding = cursor.wrapping_neg() & (alignment - 1);
        let remaining = self.remaining_capacity();
        let requested = padding
            .checked_add(size)
            .filter(|&requested| requested <= remaining)
            .ok_or(ArenaError::OutOfSpace {
                requested: padding.saturating_add(size),
                remaining,
            })?;
        Ok((self.used + padding, self.used + requested))
    }

    fn tip_offset(&self, ptr: NonNull<u8>) -> Option<usize> {
        let tip = self.last_allocation?;
        (self.buffer.offset_of(ptr) == Some(tip)).then_some(tip)
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("base", &self.buffer.as_ptr())
            .field("total_capacity", &self.total_capacity())
            .field("used", &self.used)
            .field("last_allocation", &self.last_allocation)
            .finish()
    }
}
