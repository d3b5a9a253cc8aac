//! Owned, bounded byte buffers.
//!
//! Each binary field of a test case lives in a [`Buffer`]. A
//! buffer's capacity is fixed when it is allocated: input fields
//! are sized to their decoded value, output fields to the
//! protocol maximum for that field. Nothing ever grows a buffer,
//! so an oversized value is an error instead of a silent
//! reallocation or truncation.
//!
//! Buffers are zeroed and freed by [`Buffer::release`] and on
//! drop.

use alloc::vec::Vec;
use core::fmt;

use zeroize::Zeroize;

use crate::{
    error::{Error, Result},
    hex::{self, HexError},
};

/// Returned when data does not fit in a [`Buffer`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{len} bytes exceeds buffer capacity of {capacity}")]
pub struct Overflow {
    len: usize,
    capacity: usize,
}

/// A fixed-capacity byte buffer.
///
/// The bytes in `..len()` are the value; the bytes in
/// `len()..capacity()` are always zero.
#[derive(Default)]
pub struct Buffer {
    /// Always `capacity()` bytes long.
    data: Vec<u8>,
    len: usize,
}

impl Buffer {
    /// Creates an unallocated, zero-capacity buffer.
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            len: 0,
        }
    }

    /// Allocates a zeroed buffer that can hold `capacity` bytes.
    ///
    /// It returns [`Error::AllocationFailure`] if the memory
    /// cannot be reserved.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| Error::AllocationFailure(capacity))?;
        data.resize(capacity, 0);
        if capacity > 0 {
            live::inc();
        }
        Ok(Self { data, len: 0 })
    }

    /// Decodes the hexadecimal field `field` into a new buffer.
    ///
    /// The decoded value must be at most `max` bytes. The length
    /// is checked before anything is allocated.
    pub fn from_hex(field: &'static str, src: &str, max: usize) -> Result<Self> {
        let need = hex::decoded_len(src).map_err(|err| Error::hex(field, err))?;
        if need > max {
            return Err(Error::hex(
                field,
                HexError::Capacity {
                    need,
                    capacity: max,
                },
            ));
        }
        let mut buf = Self::with_capacity(need)?;
        buf.len = hex::hex_to_bin(src, &mut buf.data).map_err(|err| Error::hex(field, err))?;
        Ok(buf)
    }

    /// Returns the number of bytes the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the length of the value.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Reports whether the value is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reports whether the buffer owns any memory.
    pub fn is_allocated(&self) -> bool {
        self.data.capacity() != 0
    }

    /// Returns the value.
    pub fn as_bytes(&self) -> &[u8] {
        self.data.get(..self.len).unwrap_or_default()
    }

    /// Returns the entire backing storage.
    ///
    /// Call [`set_len`][Self::set_len] after writing to it.
    pub fn as_mut_capacity(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Sets the length of the value after writing to
    /// [`as_mut_capacity`][Self::as_mut_capacity].
    ///
    /// Bytes past `len` are zeroed.
    pub fn set_len(&mut self, len: usize) -> Result<(), Overflow> {
        let capacity = self.data.len();
        let tail = self.data.get_mut(len..).ok_or(Overflow { len, capacity })?;
        tail.zeroize();
        self.len = len;
        Ok(())
    }

    /// Replaces the value with `src`.
    pub fn write(&mut self, src: &[u8]) -> Result<(), Overflow> {
        let capacity = self.data.len();
        let dst = self.data.get_mut(..src.len()).ok_or(Overflow {
            len: src.len(),
            capacity,
        })?;
        dst.copy_from_slice(src);
        self.set_len(src.len())
    }

    /// Zeroes and frees the buffer.
    ///
    /// Releasing an already released buffer does nothing.
    pub fn release(&mut self) {
        if self.is_allocated() {
            live::dec();
        }
        self.data.zeroize();
        self.data = Vec::new();
        self.len = 0;
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Counts buffers that currently own memory on this thread.
///
/// Only tracked in unit tests.
pub(crate) mod live {
    #[cfg(test)]
    std::thread_local! {
        static LIVE: core::cell::Cell<usize> = const { core::cell::Cell::new(0) };
        static TOTAL: core::cell::Cell<usize> = const { core::cell::Cell::new(0) };
    }

    #[inline(always)]
    pub(crate) fn inc() {
        #[cfg(test)]
        {
            LIVE.with(|n| n.set(n.get().wrapping_add(1)));
            TOTAL.with(|n| n.set(n.get().wrapping_add(1)));
        }
    }

    #[inline(always)]
    pub(crate) fn dec() {
        #[cfg(test)]
        LIVE.with(|n| n.set(n.get().wrapping_sub(1)));
    }

    /// Returns the number of live buffers.
    #[cfg(test)]
    pub(crate) fn count() -> usize {
        LIVE.with(|n| n.get())
    }

    /// Returns the number of buffers ever allocated.
    #[cfg(test)]
    pub(crate) fn total() -> usize {
        TOTAL.with(|n| n.get())
    }
}
