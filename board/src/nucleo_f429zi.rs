//! NUCLEO-F429ZI support. LD2, the blue LED, is on PB7.

use crate::pac;

pub(crate) type LedPort = pac::GPIOB;

const LED_PIN: u32 = 7;

pub(crate) fn prepare_led(dp: pac::Peripherals) -> crate::Led {
    dp.RCC.ahb1enr.modify(|_, w| w.gpioben().set_bit());
    crate::Led::new(LED_PIN, dp.GPIOB)
}
