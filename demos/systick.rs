//! Blink an LED from the SysTick exception.
//!
//! The handler is installed by defining a function named after the
//! exception. Every other vector still runs the default handler.

#![no_std]
#![no_main]

use core::sync::atomic::{AtomicBool, Ordering};

use stm32f4_rt::peripheral::syst::SystClkSource;

/// Ticks per second.
const RATE_HZ: u32 = 4;

static TICKED: AtomicBool = AtomicBool::new(false);

stm32f4_rt::entry!(main);

fn main() -> ! {
    let board::Resources { led, mut syst } = board::prepare().unwrap();
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(board::SYSCLK_HZ / RATE_HZ - 1);
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();

    loop {
        stm32f4_rt::asm::wfi();
        if TICKED.swap(false, Ordering::Relaxed) {
            led.toggle();
        }
    }
}

#[no_mangle]
extern "C" fn SysTick() {
    TICKED.store(true, Ordering::Relaxed);
}
