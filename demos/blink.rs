//! Slowly blink an LED while blocking on SysTick.
//!
//! Use this as the minimum-viable runtime support. You don't
//! need interrupts for this example.

#![no_std]
#![no_main]

const PERIOD_MS: u32 = 500;

stm32f4_rt::entry!(main);

fn main() -> ! {
    let board::Resources { led, syst } = board::prepare().unwrap();
    let mut delay = board::delay(syst);
    loop {
        led.toggle();
        delay.delay_ms(PERIOD_MS);
    }
}
