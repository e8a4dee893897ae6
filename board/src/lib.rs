//! A very simple, multi-board BSP for stm32f4-rt examples.
#![no_std]

cfg_if::cfg_if! {
    if #[cfg(feature = "nucleo-f429zi")] {
        use stm32f4::stm32f429 as pac;

        mod nucleo_f429zi;
        pub use nucleo_f429zi::*;
    } else if #[cfg(feature = "stm32f4-discovery")] {
        use stm32f4::stm32f407 as pac;

        mod stm32f4_discovery;
        pub use stm32f4_discovery::*;
    } else {
        compile_error!("No board feature selected!");
    }
}

#[cfg(target_arch = "arm")]
use panic_halt as _;

use cortex_m::{delay::Delay, peripheral::SYST};

/// The core clock out of reset. Both boards run from the 16 MHz HSI until
/// someone changes it.
pub const SYSCLK_HZ: u32 = 16_000_000;

pub struct Led {
    pin: u32,
    port: LedPort,
}

impl Led {
    fn new(pin: u32, port: LedPort) -> Self {
        // General purpose output mode.
        port.moder.modify(|r, w| unsafe {
            w.bits(r.bits() & !(0b11 << (2 * pin)) | (0b01 << (2 * pin)))
        });
        Led { pin, port }
    }
    fn mask(&self) -> u32 {
        1 << self.pin
    }
    pub fn set(&self) {
        self.port.bsrr.write(|w| unsafe { w.bits(self.mask()) });
    }

    pub fn clear(&self) {
        self.port.bsrr.write(|w| unsafe { w.bits(self.mask() << 16) });
    }

    pub fn toggle(&self) {
        if self.port.odr.read().bits() & self.mask() != 0 {
            self.clear();
        } else {
            self.set();
        }
    }
}

// The PAC's port token is `Send`, so the LED can move into a handler.
const _: () = {
    const fn assert_send<T: Send>() {}
    assert_send::<Led>();
};

pub struct Resources {
    pub led: crate::Led,
    /// SysTick, still disabled. Use [`delay`] for blocking waits, or
    /// configure it for interrupts.
    pub syst: SYST,
}

/// Block using SysTick.
pub fn delay(syst: SYST) -> Delay {
    Delay::new(syst, SYSCLK_HZ)
}

/// Prepare the board for the examples.
///
/// Call this first. Returns `None` if called twice.
pub fn prepare() -> Option<Resources> {
    let cp = cortex_m::Peripherals::take()?;
    let dp = pac::Peripherals::take()?;
    Some(Resources {
        led: prepare_led(dp),
        syst: cp.SYST,
    })
}
