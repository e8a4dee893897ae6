//! STM32F4DISCOVERY support. LD4, the green LED, is on PD12.

use crate::pac;

pub(crate) type LedPort = pac::GPIOD;

const LED_PIN: u32 = 12;

pub(crate) fn prepare_led(dp: pac::Peripherals) -> crate::Led {
    dp.RCC.ahb1enr.modify(|_, w| w.gpioden().set_bit());
    crate::Led::new(LED_PIN, dp.GPIOD)
}
