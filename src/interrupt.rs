//! STM32F42x / STM32F43x peripheral interrupts.
//!
//! The same list drives the `Interrupt` enum, the linker script's default
//! handler aliases, and (on the target) the handler symbols in the vector
//! table. Parts with fewer interrupts, like the 405 and 407, never raise the
//! trailing vectors.

/// The number of peripheral interrupt vectors.
pub const INTERRUPT_COUNT: usize = 91;

macro_rules! interrupts {
    ($($name:ident = $irqn:literal,)+) => {
        /// A peripheral interrupt, numbered by its NVIC position.
        ///
        /// The variant name is also the name of the handler symbol.
        /// Define an `extern "C" fn` with this name to install a handler.
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr(u16)]
        pub enum Interrupt {
            $(
                #[allow(missing_docs)]
                $name = $irqn,
            )+
        }

        impl Interrupt {
            /// All interrupts, in IRQ order.
            pub const ALL: [Interrupt; INTERRUPT_COUNT] = [$(Interrupt::$name,)+];

            /// The handler symbol for this interrupt.
            pub const fn name(self) -> &'static str {
                match self {
                    $(Interrupt::$name => stringify!($name),)+
                }
            }
        }

        #[cfg(all(target_arch = "arm", target_os = "none"))]
        #[allow(non_snake_case)]
        pub(crate) mod linked {
            use crate::vectors::Handler;

            extern "C" {
                $(fn $name();)+
            }

            /// Handler symbols, in IRQ order. Unless the application defines
            /// one, the linker script resolves each to `DefaultHandler`.
            pub(crate) const HANDLERS: [Handler; super::INTERRUPT_COUNT] = [$($name,)+];
        }
    };
}

interrupts! {
    WWDG = 0,
    PVD = 1,
    TAMP_STAMP = 2,
    RTC_WKUP = 3,
    FLASH = 4,
    RCC = 5,
    EXTI0 = 6,
    EXTI1 = 7,
    EXTI2 = 8,
    EXTI3 = 9,
    EXTI4 = 10,
    DMA1_STREAM0 = 11,
    DMA1_STREAM1 = 12,
    DMA1_STREAM2 = 13,
    DMA1_STREAM3 = 14,
    DMA1_STREAM4 = 15,
    DMA1_STREAM5 = 16,
    DMA1_STREAM6 = 17,
    ADC = 18,
    CAN1_TX = 19,
    CAN1_RX0 = 20,
    CAN1_RX1 = 21,
    CAN1_SCE = 22,
    EXTI9_5 = 23,
    TIM1_BRK_TIM9 = 24,
    TIM1_UP_TIM10 = 25,
    TIM1_TRG_COM_TIM11 = 26,
    TIM1_CC = 27,
    TIM2 = 28,
    TIM3 = 29,
    TIM4 = 30,
    I2C1_EV = 31,
    I2C1_ER = 32,
    I2C2_EV = 33,
    I2C2_ER = 34,
    SPI1 = 35,
    SPI2 = 36,
    USART1 = 37,
    USART2 = 38,
    USART3 = 39,
    EXTI15_10 = 40,
    RTC_ALARM = 41,
    OTG_FS_WKUP = 42,
    TIM8_BRK_TIM12 = 43,
    TIM8_UP_TIM13 = 44,
    TIM8_TRG_COM_TIM14 = 45,
    TIM8_CC = 46,
    DMA1_STREAM7 = 47,
    FMC = 48,
    SDIO = 49,
    TIM5 = 50,
    SPI3 = 51,
    UART4 = 52,
    UART5 = 53,
    TIM6_DAC = 54,
    TIM7 = 55,
    DMA2_STREAM0 = 56,
    DMA2_STREAM1 = 57,
    DMA2_STREAM2 = 58,
    DMA2_STREAM3 = 59,
    DMA2_STREAM4 = 60,
    ETH = 61,
    ETH_WKUP = 62,
    CAN2_TX = 63,
    CAN2_RX0 = 64,
    CAN2_RX1 = 65,
    CAN2_SCE = 66,
    OTG_FS = 67,
    DMA2_STREAM5 = 68,
    DMA2_STREAM6 = 69,
    DMA2_STREAM7 = 70,
    USART6 = 71,
    I2C3_EV = 72,
    I2C3_ER = 73,
    OTG_HS_EP1_OUT = 74,
    OTG_HS_EP1_IN = 75,
    OTG_HS_WKUP = 76,
    OTG_HS = 77,
    DCMI = 78,
    CRYP = 79,
    HASH_RNG = 80,
    FPU = 81,
    UART7 = 82,
    UART8 = 83,
    SPI4 = 84,
    SPI5 = 85,
    SPI6 = 86,
    SAI1 = 87,
    LTDC = 88,
    LTDC_ER = 89,
    DMA2D = 90,
}

impl Interrupt {
    /// The IRQ number.
    pub const fn number(self) -> u16 {
        self as u16
    }

    /// Look up an interrupt by IRQ number.
    pub const fn from_number(number: u16) -> Option<Self> {
        if (number as usize) < INTERRUPT_COUNT {
            Some(Self::ALL[number as usize])
        } else {
            None
        }
    }
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
unsafe impl cortex_m::interrupt::InterruptNumber for Interrupt {
    #[inline]
    fn number(self) -> u16 {
        self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::{Interrupt, INTERRUPT_COUNT};
    use std::collections::HashSet;

    #[test]
    fn numbered_in_table_order() {
        for (idx, interrupt) in Interrupt::ALL.iter().enumerate() {
            assert_eq!(interrupt.number() as usize, idx, "{interrupt:?}");
            assert_eq!(Interrupt::from_number(idx as u16), Some(*interrupt));
        }
        assert_eq!(Interrupt::from_number(INTERRUPT_COUNT as u16), None);
    }

    #[test]
    fn names_are_unique_symbols() {
        let names: HashSet<_> = Interrupt::ALL.iter().map(|i| i.name()).collect();
        assert_eq!(names.len(), INTERRUPT_COUNT);
        assert_eq!(Interrupt::WWDG.name(), "WWDG");
        assert_eq!(Interrupt::DMA2D.name(), "DMA2D");
    }
}
