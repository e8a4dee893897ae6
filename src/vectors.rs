//! The Cortex-M vector table.
//!
//! The table is a run of words at the start of the image. The processor
//! loads the stack pointer from word 0, then jumps to the address in word 1.
//! Every other word is an exception or interrupt handler.
//!
//! Build a table with [`VectorTable::new`], which points every handler slot
//! at one default handler, then register real handlers with the `with_*`
//! methods. All of these are `const fn`, so the table is complete when the
//! image is linked.
//!
//! ```
//! use stm32f4_rt::{Exception, Interrupt, VectorTable};
//!
//! unsafe extern "C" fn reset() -> ! { loop {} }
//! unsafe extern "C" fn unhandled() {}
//! unsafe extern "C" fn systick() {}
//! unsafe extern "C" fn tim2() {}
//!
//! static VECTORS: VectorTable = VectorTable::new(0x2002_0000 as *const u32, reset, unhandled)
//!     .with_exception(Exception::SysTick, systick)
//!     .with_interrupt(Interrupt::TIM2, tim2);
//!
//! assert_eq!(VECTORS.exception(Exception::SysTick) as usize, systick as usize);
//! assert_eq!(VECTORS.exception(Exception::HardFault) as usize, unhandled as usize);
//! ```

use crate::interrupt::{Interrupt, INTERRUPT_COUNT};
use core::sync::atomic::{self, Ordering};

/// An exception or interrupt handler.
pub type Handler = unsafe extern "C" fn();

/// The reset routine. It never returns.
pub type ResetHandler = unsafe extern "C" fn() -> !;

/// Architecturally defined exceptions, after reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Exception {
    /// Non-maskable interrupt.
    NonMaskableInt,
    /// All classes of fault.
    HardFault,
    /// Memory management fault.
    MemoryManagement,
    /// Pre-fetch and memory access faults.
    BusFault,
    /// Undefined instructions and illegal state.
    UsageFault,
    /// Supervisor call (`SVC`).
    SVCall,
    /// Debug monitor.
    DebugMonitor,
    /// Pendable request for system service.
    PendSV,
    /// System tick timer.
    SysTick,
}

impl Exception {
    /// All exceptions, in slot order.
    pub const ALL: [Exception; 9] = [
        Exception::NonMaskableInt,
        Exception::HardFault,
        Exception::MemoryManagement,
        Exception::BusFault,
        Exception::UsageFault,
        Exception::SVCall,
        Exception::DebugMonitor,
        Exception::PendSV,
        Exception::SysTick,
    ];

    /// The exception's position in the vector table.
    pub const fn slot(self) -> usize {
        match self {
            Exception::NonMaskableInt => 2,
            Exception::HardFault => 3,
            Exception::MemoryManagement => 4,
            Exception::BusFault => 5,
            Exception::UsageFault => 6,
            Exception::SVCall => 11,
            Exception::DebugMonitor => 12,
            Exception::PendSV => 14,
            Exception::SysTick => 15,
        }
    }

    /// The handler symbol for this exception.
    pub const fn name(self) -> &'static str {
        match self {
            Exception::NonMaskableInt => "NonMaskableInt",
            Exception::HardFault => "HardFault",
            Exception::MemoryManagement => "MemoryManagement",
            Exception::BusFault => "BusFault",
            Exception::UsageFault => "UsageFault",
            Exception::SVCall => "SVCall",
            Exception::DebugMonitor => "DebugMonitor",
            Exception::PendSV => "PendSV",
            Exception::SysTick => "SysTick",
        }
    }
}

/// Slots 7 through 10, and 13, are reserved. They hold zero.
const RESERVED_SLOTS: [usize; 5] = [7, 8, 9, 10, 13];

/// Exception words, slots 2 through 15.
const EXCEPTION_WORDS: usize = 14;
const FIRST_EXCEPTION_SLOT: usize = 2;
const FIRST_INTERRUPT_SLOT: usize = FIRST_EXCEPTION_SLOT + EXCEPTION_WORDS;

/// One word in the exception part of the table.
#[derive(Clone, Copy)]
#[repr(C)]
pub union Vector {
    handler: Handler,
    reserved: usize,
}

const fn is_reserved(slot: usize) -> bool {
    let mut idx = 0;
    while idx < RESERVED_SLOTS.len() {
        if RESERVED_SLOTS[idx] == slot {
            return true;
        }
        idx += 1;
    }
    false
}

/// What a vector table word holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Slot 0: the initial stack pointer.
    InitialStack(usize),
    /// Slot 1: the reset routine's address.
    Reset(usize),
    /// An exception or interrupt handler's address.
    Handler(usize),
    /// A reserved word. Always zero.
    Reserved,
}

/// A complete vector table: core exceptions, then every peripheral interrupt.
#[repr(C)]
pub struct VectorTable {
    initial_stack: *const u32,
    reset: ResetHandler,
    exceptions: [Vector; EXCEPTION_WORDS],
    interrupts: [Handler; INTERRUPT_COUNT],
}

// The initial stack pointer is only an address; nothing dereferences it.
unsafe impl Sync for VectorTable {}

impl VectorTable {
    /// The number of words in the table.
    pub const LEN: usize = FIRST_INTERRUPT_SLOT + INTERRUPT_COUNT;

    /// A table that sends every exception and interrupt to `default`.
    pub const fn new(initial_stack: *const u32, reset: ResetHandler, default: Handler) -> Self {
        let mut exceptions = [Vector { handler: default }; EXCEPTION_WORDS];
        let mut idx = 0;
        while idx < EXCEPTION_WORDS {
            if is_reserved(idx + FIRST_EXCEPTION_SLOT) {
                exceptions[idx] = Vector { reserved: 0 };
            }
            idx += 1;
        }
        Self {
            initial_stack,
            reset,
            exceptions,
            interrupts: [default; INTERRUPT_COUNT],
        }
    }

    /// Install `handler` for `exception`.
    pub const fn with_exception(mut self, exception: Exception, handler: Handler) -> Self {
        self.exceptions[exception.slot() - FIRST_EXCEPTION_SLOT] = Vector { handler };
        self
    }

    /// Install `handler` for `interrupt`.
    pub const fn with_interrupt(mut self, interrupt: Interrupt, handler: Handler) -> Self {
        self.interrupts[interrupt as usize] = handler;
        self
    }

    /// Install a handler for every interrupt, in IRQ order.
    pub const fn with_interrupts(mut self, handlers: [Handler; INTERRUPT_COUNT]) -> Self {
        self.interrupts = handlers;
        self
    }

    /// The initial stack pointer.
    pub const fn initial_stack(&self) -> *const u32 {
        self.initial_stack
    }

    /// The reset routine.
    pub const fn reset(&self) -> ResetHandler {
        self.reset
    }

    /// The handler for `exception`.
    pub const fn exception(&self, exception: Exception) -> Handler {
        // Safety: exception slots are never reserved.
        unsafe { self.exceptions[exception.slot() - FIRST_EXCEPTION_SLOT].handler }
    }

    /// The handler for `interrupt`.
    pub const fn interrupt(&self, interrupt: Interrupt) -> Handler {
        self.interrupts[interrupt as usize]
    }

    /// Inspect the word at `index`.
    ///
    /// Returns `None` past the end of the table.
    pub fn slot(&self, index: usize) -> Option<Slot> {
        let slot = match index {
            0 => Slot::InitialStack(self.initial_stack as usize),
            1 => Slot::Reset(self.reset as usize),
            _ if is_reserved(index) => {
                // Safety: reserved words are always written as integers.
                let word = unsafe { self.exceptions[index - FIRST_EXCEPTION_SLOT].reserved };
                debug_assert_eq!(word, 0);
                Slot::Reserved
            }
            _ if index < FIRST_INTERRUPT_SLOT => {
                // Safety: every other exception word holds a handler.
                let handler = unsafe { self.exceptions[index - FIRST_EXCEPTION_SLOT].handler };
                Slot::Handler(handler as usize)
            }
            _ if index < Self::LEN => {
                Slot::Handler(self.interrupts[index - FIRST_INTERRUPT_SLOT] as usize)
            }
            _ => return None,
        };
        Some(slot)
    }

    /// Every word in the table, in order.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        (0..Self::LEN).map_while(|index| self.slot(index))
    }
}

/// Park the processor.
///
/// This is the body of the default handler, and where the reset routine
/// ends up if `main` returns. Only a reset gets out.
pub extern "C" fn halt() -> ! {
    loop {
        atomic::compiler_fence(Ordering::SeqCst);
    }
}
