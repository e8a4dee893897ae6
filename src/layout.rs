//! Memory regions that the linker hands to the runtime.

/// A half-open range of addresses, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Region {
    /// First address in the region.
    pub start: usize,
    /// One past the last address in the region.
    pub end: usize,
}

impl Region {
    /// Describe a region of `len` bytes starting at `start`.
    pub const fn with_len(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    /// The number of bytes in the region.
    ///
    /// A region whose end precedes its start is a link error. Debug builds
    /// catch that; release builds treat it as empty.
    pub const fn len(&self) -> usize {
        debug_assert!(self.end >= self.start, "region ends before it starts");
        self.end.saturating_sub(self.start)
    }

    /// `true` when the region holds no bytes.
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` when `address` falls inside the region.
    pub const fn contains(&self, address: usize) -> bool {
        self.start <= address && address < self.end
    }
}

/// The link-time memory map consumed by the reset sequence and the heap.
///
/// On the target, [`MemoryLayout::from_linker`] fills this from linker
/// symbols. Everywhere else, build one by hand and pass it to
/// [`boot`](crate::boot) or [`HeapCursor::sbrk`](crate::HeapCursor::sbrk).
///
/// ```text
/// ┌───────┬──────┬─────────────────────────┬───────────────────┐
/// │ .data │ .bss │ heap ->                 │        <- stack   │
/// └───────┴──────┴─────────────────────────┴───────────────────┘
///                ^ heap_start    heap_limit ^          stack_top ^
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryLayout {
    /// Where the initial values of `.data` live in flash (`_sidata`).
    pub data_load: usize,
    /// The RAM home of `.data` (`_sdata` to `_edata`).
    pub data: Region,
    /// Storage that must be zeroed before use (`_sbss` to `_ebss`).
    pub bss: Region,
    /// End of the static image, and the first heap address (`_end`).
    pub heap_start: usize,
    /// Initial stack pointer (`_estack`).
    pub stack_top: usize,
    /// Bytes reserved below `stack_top` for the stack (`_Min_Stack_Size`).
    pub stack_size: usize,
}

impl MemoryLayout {
    /// The flash-resident copy of `.data`.
    ///
    /// Always the same length as [`data`](Self::data).
    pub const fn data_image(&self) -> Region {
        Region::with_len(self.data_load, self.data.len())
    }

    /// The highest address the heap may reach.
    ///
    /// The bound is exactly `stack_top - stack_size`; any extra guard
    /// margin must already be part of `stack_size`.
    pub const fn heap_limit(&self) -> usize {
        self.stack_top.saturating_sub(self.stack_size)
    }

    /// The range the heap may occupy.
    pub const fn heap(&self) -> Region {
        Region {
            start: self.heap_start,
            end: self.heap_limit(),
        }
    }
}
