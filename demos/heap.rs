//! Grow the heap until it meets the stack reservation.
//!
//! The LED turns on once the first request succeeds. It turns off, and the
//! program parks, once the heap can't grow any further. Set `BOARD_STACK`
//! and `BOARD_HEAP` when building to see the limit move.

#![no_std]
#![no_main]

const CHUNK: isize = 1024;

stm32f4_rt::entry!(main);

fn main() {
    let board::Resources { led, .. } = board::prepare().unwrap();

    let start = stm32f4_rt::heap_start();
    let first = unsafe { stm32f4_rt::sbrk(CHUNK) }.unwrap();
    assert_eq!(first, start);
    led.set();

    let mut granted = CHUNK;
    while unsafe { stm32f4_rt::sbrk(CHUNK) }.is_ok() {
        granted += CHUNK;
    }
    // The rest fits, one byte at a time.
    while unsafe { stm32f4_rt::sbrk(1) }.is_ok() {
        granted += 1;
    }

    let layout = stm32f4_rt::MemoryLayout::from_linker();
    assert_eq!(granted as usize, layout.heap().len());
    led.clear();
    // Returning from main runs the destructors, then parks.
}
