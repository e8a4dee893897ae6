//! A break pointer for the C library heap.

use crate::layout::MemoryLayout;
use core::fmt;

/// A heap request could not be satisfied.
///
/// The cursor is left where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfMemory {
    /// The cursor when the request arrived.
    pub cursor: usize,
    /// The requested change, in bytes.
    pub increment: isize,
    /// The highest address the cursor may reach.
    pub limit: usize,
}

impl fmt::Display for OutOfMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot move heap cursor {:#010X} by {} bytes (heap ends at {:#010X})",
            self.cursor, self.increment, self.limit
        )
    }
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
impl std::error::Error for OutOfMemory {}

/// The program break.
///
/// The cursor starts unset. The first call to [`sbrk`](Self::sbrk) places it
/// at [`MemoryLayout::heap_start`]. After that, it only moves by the
/// increments that callers request, and it never leaves
/// [`MemoryLayout::heap`].
///
/// There's no synchronization here. A `HeapCursor` is owned by whoever
/// allocates; on the target, that's the C library through `_sbrk`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapCursor {
    brk: Option<usize>,
}

impl HeapCursor {
    /// A cursor that hasn't handed out any memory.
    pub const fn new() -> Self {
        Self { brk: None }
    }

    /// The current break, or `None` before the first request.
    pub const fn current(&self) -> Option<usize> {
        self.brk
    }

    /// Move the break by `increment` bytes.
    ///
    /// On success, returns the break as it was before the call. The caller
    /// owns `[previous, previous + increment)` when `increment` is positive.
    /// A negative `increment` gives memory back.
    ///
    /// Fails when the new break would pass [`MemoryLayout::heap_limit`], or
    /// fall below [`MemoryLayout::heap_start`].
    pub fn sbrk(&mut self, layout: &MemoryLayout, increment: isize) -> Result<usize, OutOfMemory> {
        let cursor = *self.brk.get_or_insert(layout.heap_start);
        let limit = layout.heap_limit();
        let error = OutOfMemory {
            cursor,
            increment,
            limit,
        };
        let next = cursor.checked_add_signed(increment).ok_or(error)?;
        if next > limit || next < layout.heap_start {
            return Err(error);
        }
        self.brk = Some(next);
        Ok(cursor)
    }
}

impl Default for HeapCursor {
    fn default() -> Self {
        Self::new()
    }
}
