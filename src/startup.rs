//! The reset sequence.
//!
//! [`boot`] runs the steps that every image needs before `main`, in a fixed
//! order:
//!
//! 1. copy `.data` from flash into RAM.
//! 2. zero `.bss`.
//! 3. run static constructors (`.preinit_array`, then `.init_array`).
//! 4. call `SystemInit`.
//! 5. call `main`.
//! 6. run static destructors (`.fini_array`), if `main` returns.
//!
//! Nothing here can fail. A bad memory map is a link error, and the
//! generated linker script checks for it.
//!
//! Memory is reached through [`AddressSpace`], and the external routines
//! through [`BootHooks`]. On the target, both are thin wrappers over raw
//! pointers and linker symbols. In tests, use
//! [`SimulatedMemory`](crate::SimulatedMemory) and a recording `BootHooks`.

use crate::layout::MemoryLayout;

/// Byte-addressed memory.
pub trait AddressSpace {
    /// Read the byte at `address`.
    fn read_byte(&self, address: usize) -> u8;
    /// Write `value` to `address`.
    fn write_byte(&mut self, address: usize, value: u8);
}

/// The routines that the reset sequence calls, but doesn't own.
pub trait BootHooks {
    /// Run static constructors.
    fn run_constructors(&mut self);
    /// Configure clocks and the rest of the platform.
    fn system_init(&mut self);
    /// Call the program's entry point. Any return value is dropped.
    fn main(&mut self);
    /// Run static destructors.
    fn run_destructors(&mut self);
}

/// A static constructor or destructor.
pub type InitFunction = unsafe extern "C" fn();

/// CP10 and CP11 fields of `SCB.CPACR`, both set to full access.
pub const CPACR_FPU_FULL_ACCESS: u32 = 0b1111 << 20;

/// The `CPACR` value that lets privileged and unprivileged code use the FPU.
///
/// Other coprocessor fields keep their value. The reset routine writes this
/// before any other step on hard-float targets, since a floating-point
/// instruction with the FPU off faults.
pub const fn fpu_full_access(cpacr: u32) -> u32 {
    cpacr | CPACR_FPU_FULL_ACCESS
}

/// Copy the initial values of `.data` from flash into RAM.
///
/// Copies exactly `layout.data.len()` bytes. An empty `.data` touches
/// nothing.
pub fn relocate_data<A: AddressSpace + ?Sized>(memory: &mut A, layout: &MemoryLayout) {
    let source = layout.data_image();
    for offset in 0..layout.data.len() {
        let byte = memory.read_byte(source.start + offset);
        memory.write_byte(layout.data.start + offset, byte);
    }
}

/// Write zero to every byte of `.bss`.
pub fn zero_fill<A: AddressSpace + ?Sized>(memory: &mut A, layout: &MemoryLayout) {
    for address in layout.bss.start..layout.bss.end {
        memory.write_byte(address, 0);
    }
}

/// Prepare memory and run the program.
///
/// Returns only if `main` returns, after the destructors run.
pub fn boot<A, H>(memory: &mut A, layout: &MemoryLayout, hooks: &mut H)
where
    A: AddressSpace + ?Sized,
    H: BootHooks + ?Sized,
{
    relocate_data(memory, layout);
    zero_fill(memory, layout);
    hooks.run_constructors();
    hooks.system_init();
    hooks.main();
    hooks.run_destructors();
}

/// Call each constructor, first to last.
///
/// # Safety
///
/// Each function must be safe to call exactly once, right now.
pub unsafe fn run_init_functions(functions: &[InitFunction]) {
    for function in functions {
        function();
    }
}

/// Call each destructor, last to first.
///
/// # Safety
///
/// See [`run_init_functions`].
pub unsafe fn run_fini_functions(functions: &[InitFunction]) {
    for function in functions.iter().rev() {
        function();
    }
}
