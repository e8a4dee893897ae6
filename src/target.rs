//! STM32F4 target support.
//!
//! Defines the symbols that the generated linker script expects:
//!
//! - `__VECTOR_TABLE`, placed in `.vector_table` at the start of the image.
//! - `Reset`, the first code to run.
//! - `DefaultHandler_`, the fallback for every unimplemented handler.
//! - `__stm32f4_rt_system_init`, the fallback `SystemInit`.
//! - `_sbrk`, with the `newlib` feature.
//!
//! The reset routine is plain Rust. It runs before `.data` and `.bss` are
//! ready, so it only touches the stack and linker symbols until the
//! relocation and zero-fill steps finish. Those steps use volatile accesses,
//! so the compiler can't merge them into library calls.

use core::ptr::{self, addr_of, addr_of_mut};

use crate::{
    heap::{HeapCursor, OutOfMemory},
    layout::{MemoryLayout, Region},
    startup::{self, AddressSpace, BootHooks, InitFunction},
    vectors::{self, Exception, VectorTable},
};

pub use cortex_m::{asm, peripheral, register};

extern "C" {
    static _sidata: u8;
    static _sdata: u8;
    static _edata: u8;
    static _sbss: u8;
    static _ebss: u8;
    static _end: u8;
    static _estack: u32;
    static _Min_Stack_Size: u8;

    static __preinit_array_start: InitFunction;
    static __preinit_array_end: InitFunction;
    static __init_array_start: InitFunction;
    static __init_array_end: InitFunction;
    static __fini_array_start: InitFunction;
    static __fini_array_end: InitFunction;

    fn main() -> i32;
    fn SystemInit();

    fn DefaultHandler();
    fn NonMaskableInt();
    fn HardFault();
    fn MemoryManagement();
    fn BusFault();
    fn UsageFault();
    fn SVCall();
    fn DebugMonitor();
    fn PendSV();
    fn SysTick();
}

impl MemoryLayout {
    /// Read the memory map from linker symbols.
    pub fn from_linker() -> Self {
        unsafe {
            let data_start = addr_of!(_sdata) as usize;
            let bss_start = addr_of!(_sbss) as usize;
            MemoryLayout {
                data_load: addr_of!(_sidata) as usize,
                data: Region {
                    start: data_start,
                    end: addr_of!(_edata) as usize,
                },
                bss: Region {
                    start: bss_start,
                    end: addr_of!(_ebss) as usize,
                },
                heap_start: addr_of!(_end) as usize,
                stack_top: addr_of!(_estack) as usize,
                stack_size: addr_of!(_Min_Stack_Size) as usize,
            }
        }
    }
}

/// The vector table that the processor reads at reset.
///
/// Every handler slot names a symbol. The linker script aliases each one to
/// `DefaultHandler`, unless the application defines it.
#[doc(hidden)]
#[link_section = ".vector_table"]
#[no_mangle]
#[used]
pub static __VECTOR_TABLE: VectorTable =
    VectorTable::new(unsafe { addr_of!(_estack) }, Reset, DefaultHandler)
        .with_exception(Exception::NonMaskableInt, NonMaskableInt)
        .with_exception(Exception::HardFault, HardFault)
        .with_exception(Exception::MemoryManagement, MemoryManagement)
        .with_exception(Exception::BusFault, BusFault)
        .with_exception(Exception::UsageFault, UsageFault)
        .with_exception(Exception::SVCall, SVCall)
        .with_exception(Exception::DebugMonitor, DebugMonitor)
        .with_exception(Exception::PendSV, PendSV)
        .with_exception(Exception::SysTick, SysTick)
        .with_interrupts(crate::interrupt::linked::HANDLERS);

/// Volatile access to the processor's address space.
struct Physical;

impl AddressSpace for Physical {
    #[inline(always)]
    fn read_byte(&self, address: usize) -> u8 {
        unsafe { ptr::read_volatile(address as *const u8) }
    }
    #[inline(always)]
    fn write_byte(&mut self, address: usize, value: u8) {
        unsafe { ptr::write_volatile(address as *mut u8, value) }
    }
}

/// Constructors, `SystemInit`, `main` and destructors, found by symbol.
struct Linked;

/// The functions between two linker symbols.
///
/// # Safety
///
/// `start` and `end` must bound an array of `InitFunction`.
unsafe fn init_functions(
    start: *const InitFunction,
    end: *const InitFunction,
) -> &'static [InitFunction] {
    let len = (end as usize - start as usize) / core::mem::size_of::<InitFunction>();
    core::slice::from_raw_parts(start, len)
}

impl BootHooks for Linked {
    fn run_constructors(&mut self) {
        unsafe {
            startup::run_init_functions(init_functions(
                addr_of!(__preinit_array_start),
                addr_of!(__preinit_array_end),
            ));
            startup::run_init_functions(init_functions(
                addr_of!(__init_array_start),
                addr_of!(__init_array_end),
            ));
        }
    }
    fn system_init(&mut self) {
        unsafe { SystemInit() }
    }
    fn main(&mut self) {
        unsafe { main() };
    }
    fn run_destructors(&mut self) {
        unsafe {
            startup::run_fini_functions(init_functions(
                addr_of!(__fini_array_start),
                addr_of!(__fini_array_end),
            ));
        }
    }
}

/// The reset handler.
///
/// Enables the FPU on hard-float targets, prepares memory, runs `main`, and
/// parks the processor if `main` ever returns.
#[doc(hidden)]
#[no_mangle]
pub unsafe extern "C" fn Reset() -> ! {
    #[cfg(feature = "set-vtor")]
    {
        (*cortex_m::peripheral::SCB::PTR)
            .vtor
            .write(addr_of!(__VECTOR_TABLE) as u32);
        asm::dsb();
        asm::isb();
    }
    #[cfg(target_abi = "eabihf")]
    {
        let scb = &*cortex_m::peripheral::SCB::PTR;
        scb.cpacr.write(startup::fpu_full_access(scb.cpacr.read()));
        asm::dsb();
        asm::isb();
    }
    let layout = MemoryLayout::from_linker();
    startup::boot(&mut Physical, &layout, &mut Linked);
    vectors::halt()
}

/// The handler behind every unimplemented exception and interrupt.
///
/// Applications replace it by defining `DefaultHandler`.
#[doc(hidden)]
#[no_mangle]
pub unsafe extern "C" fn DefaultHandler_() -> ! {
    #[cfg(feature = "defmt")]
    defmt::error!(
        "unhandled exception: {}",
        defmt::Debug2Format(&cortex_m::peripheral::SCB::vect_active())
    );
    vectors::halt()
}

/// The `SystemInit` used when the application doesn't supply one.
#[doc(hidden)]
#[no_mangle]
pub unsafe extern "C" fn __stm32f4_rt_system_init() {}

static mut HEAP: HeapCursor = HeapCursor::new();

/// Move the program break by `increment` bytes.
///
/// Returns the start of the granted memory. See [`HeapCursor::sbrk`].
///
/// # Safety
///
/// Not reentrant. Callers must make sure no other `sbrk` call, including one
/// from an interrupt handler, runs at the same time.
pub unsafe fn sbrk(increment: isize) -> Result<*mut u8, OutOfMemory> {
    let heap = &mut *addr_of_mut!(HEAP);
    let result = heap.sbrk(&MemoryLayout::from_linker(), increment);
    #[cfg(feature = "defmt")]
    if let Err(err) = &result {
        defmt::warn!("heap exhausted: {}", err);
    }
    result.map(|address| address as *mut u8)
}

/// The heap hook for newlib's `malloc`.
#[cfg(feature = "newlib")]
#[doc(hidden)]
#[no_mangle]
pub unsafe extern "C" fn _sbrk(increment: isize) -> *mut core::ffi::c_void {
    const ENOMEM: core::ffi::c_int = 12;
    extern "C" {
        fn __errno() -> *mut core::ffi::c_int;
    }
    match sbrk(increment) {
        Ok(address) => address.cast(),
        Err(_) => {
            *__errno() = ENOMEM;
            usize::MAX as *mut core::ffi::c_void
        }
    }
}

/// Returns a pointer to the start of the heap.
#[inline]
pub fn heap_start() -> *mut u8 {
    unsafe { addr_of!(_end) as *mut u8 }
}

/// Declare the program's entry point.
///
/// The function may return anything, or nothing, or never return. A return
/// value is dropped, and then static destructors run.
///
/// ```ignore
/// stm32f4_rt::entry!(main);
///
/// fn main() -> ! {
///     loop {}
/// }
/// ```
#[macro_export]
macro_rules! entry {
    ($path:path) => {
        #[export_name = "main"]
        pub unsafe extern "C" fn __stm32f4_rt_main() -> i32 {
            #[allow(unreachable_code)]
            {
                let _ = $path();
                0
            }
        }
    };
}
