//! Boot-time clock configuration for the STM32F334.
//!
//! Pick a clock source and a target SYSCLK frequency as types; the PLL divider and multiplier
//! are solved during compilation, and an unreachable target fails the build. At startup,
//! `configure()` walks the RCC from its reset state to the target, waiting on each ready flag.
//!
//! ```no_run
//! use stm32f334_clocks::clocks::{Hse, SysClock};
//!
//! // 8Mhz crystal on OSC_IN/OSC_OUT, PLL up to 72Mhz.
//! type Boot = SysClock<Hse<8_000_000>, 72_000_000>;
//!
//! let clocks = Boot::configure().unwrap();
//! ```

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod macros;

pub mod clocks;
pub mod error;
pub mod regs;
pub mod traits;
mod util;

pub use crate::{
    clocks::{FrequencyUnit, checked_freq, freq, hz, khz, mhz},
    error::{Error, Result},
    traits::ClockCfg,
};
