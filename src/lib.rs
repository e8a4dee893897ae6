//! Runtime and startup support for STM32F4 processors.
//!
//! This crate gives an STM32F4 image everything it needs between reset and
//! `main`:
//!
//! - the vector table, with every exception and interrupt routed to a shared
//!   default handler unless the application defines its own.
//! - a reset routine that enables the FPU (on `eabihf` targets), copies
//!   `.data`, zeroes `.bss`, runs static constructors, calls `SystemInit`,
//!   then calls `main`.
//! - a heap break pointer, `sbrk`, for C libraries that grow their heap.
//! - a build-time API that writes the linker script.
//!
//! Both APIs are exposed from the same package. The interface changes depending on the
//! build environment.
//!
//! # Dependencies
//!
//! In your embedded target, depend on `stm32f4-rt` in both of
//!
//! - the `[dependencies]` section of your Cargo.toml
//! - the `[build-dependencies]` section of your Cargo.toml
//!
//! Use the same crate version in both locations.
//!
//! ```text
//! [dependencies.stm32f4-rt]
//! version = # $VERSION
//!
//! [build-dependencies.stm32f4-rt]
//! version = # Same as $VERSION
//! ```
//!
//! # Linker script
//!
//! **Link against `stm32f4-link.x`**, which is automatically made available on the linker
//! search path. You may change the name of the linker script by using the `RuntimeBuilder`.
//!
//! # Host configuration
//!
//! In your project, create a `build.rs` script that configures the runtime. The simplest
//! `build.rs` looks like this:
//!
//! ```no_run
//! use stm32f4_rt::{Family, RuntimeBuilder};
//!
//! /// CHANGE ME depending on your board's flash size.
//! const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2 MiB.
//! /// CHANGE ME depending on your board's chip.
//! const FAMILY: Family = Family::Stm32f429;
//!
//! fn main() {
//!     RuntimeBuilder::from_flash(FAMILY, FLASH_SIZE)
//!         .build()
//!         .unwrap();
//! }
//! ```
//!
//! A more involved configuration keeps the stack, `.bss` and the heap in the
//! core-coupled memory, and leaves SRAM to DMA buffers in `.data`:
//!
//! ```no_run
//! # use stm32f4_rt::{Family, RuntimeBuilder};
//! use stm32f4_rt::Memory;
//! # const FLASH_SIZE: usize = 2 * 1024 * 1024;
//! # const FAMILY: Family = Family::Stm32f429;
//!
//! fn main() {
//!     RuntimeBuilder::from_flash(FAMILY, FLASH_SIZE)
//!         .data(Memory::Sram)
//!         .bss(Memory::Ccm)
//!         .stack(Memory::Ccm)
//!         .stack_size(4 * 1024)
//!         .heap_size(16 * 1024)
//!         .build()
//!         .unwrap();
//! }
//! ```
//!
//! # Target integration
//!
//! Name your entry point with [`entry!`], and define handlers by symbol name:
//!
//! ```ignore
//! #![no_std]
//! #![no_main]
//!
//! stm32f4_rt::entry!(main);
//!
//! fn main() -> ! {
//!     loop {}
//! }
//!
//! #[no_mangle]
//! extern "C" fn SysTick() {
//!     // ...
//! }
//! ```
//!
//! Exception handler names are the [`Exception`] variant names. Interrupt
//! handler names are the [`Interrupt`] variant names. Anything you don't
//! define runs `DefaultHandler`, which halts. Define `DefaultHandler` to
//! replace it, and `SystemInit` to configure clocks before `main`.
//!
//! # Feature flags
//!
//! - `newlib` exports `_sbrk` for newlib's `malloc`, and reports exhaustion
//!   through `errno`.
//! - `set-vtor` points `SCB.VTOR` at the vector table during reset. Use it for
//!   images placed with [`RuntimeBuilder::in_flash`].
//! - `defmt` logs unhandled exceptions and heap exhaustion, and implements
//!   `defmt::Format` for public types.
//!
//! # Limitations
//!
//! The vector table follows the STM32F42x / F43x interrupt map. The 405 and 407
//! have fewer interrupts; their trailing vectors are never raised.
//!
//! The heap limit is the stack reservation's low edge. There's no guard band
//! beyond `stack_size`, and nothing stops the stack from growing past its
//! reservation.

#![cfg_attr(all(target_arch = "arm", target_os = "none"), no_std)]

mod heap;
mod interrupt;
mod layout;
mod startup;
mod vectors;

pub use heap::{HeapCursor, OutOfMemory};
pub use interrupt::{Interrupt, INTERRUPT_COUNT};
pub use layout::{MemoryLayout, Region};
pub use startup::{
    boot, fpu_full_access, relocate_data, run_fini_functions, run_init_functions, zero_fill,
    AddressSpace, BootHooks, InitFunction, CPACR_FPU_FULL_ACCESS,
};
pub use vectors::{halt, Exception, Handler, ResetHandler, Slot, Vector, VectorTable};

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "arm", target_os = "none"))] {
        mod target;
        pub use target::*;
    } else {
        mod host;
        mod sim;
        pub use host::*;
        pub use sim::SimulatedMemory;
    }
}
