//! Clock sources, as values and as types.
//!
//! `Source` is the value a `const fn` works with. The `ClockSource` types (`Hsi`, `Hse`) are
//! what firmware names in `SysClock<S, TARGET>`; each one maps to a `Source` through an
//! associated const. `ClockSource` is sealed, so naming any other type as a clock source
//! doesn't compile.

use core::marker::PhantomData;

/// Units accepted by `freq`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrequencyUnit {
    Hz,
    KHz,
    MHz,
}

impl FrequencyUnit {
    pub const fn hz(self) -> u32 {
        match self {
            Self::Hz => 1,
            Self::KHz => 1_000,
            Self::MHz => 1_000_000,
        }
    }
}

/// `count` of `unit`, in Hz. Meant for constants: a result past `u32::MAX` panics, which
/// in a `const` stops the build. Use `checked_freq` for values only known at runtime.
pub const fn freq(count: u32, unit: FrequencyUnit) -> u32 {
    match checked_freq(count, unit) {
        Some(f) => f,
        None => panic!("Frequency doesn't fit in a u32"),
    }
}

/// `count` of `unit`, in Hz, or `None` if that's past `u32::MAX` (about 4.29Ghz).
pub const fn checked_freq(count: u32, unit: FrequencyUnit) -> Option<u32> {
    count.checked_mul(unit.hz())
}

pub const fn hz(count: u32) -> u32 {
    freq(count, FrequencyUnit::Hz)
}

pub const fn khz(count: u32) -> u32 {
    freq(count, FrequencyUnit::KHz)
}

/// Eg `mhz(72) == 72_000_000`.
pub const fn mhz(count: u32) -> u32 {
    freq(count, FrequencyUnit::MHz)
}

/// HSI frequency. Factory-trimmed RC oscillator.
pub const HSI_FREQ: u32 = mhz(8);

/// How an external clock is driven onto OSC_IN.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SourceKind {
    /// Crystal or ceramic resonator across OSC_IN/OSC_OUT; needs the internal amplifier.
    Resonator,
    /// An external oscillator drives OSC_IN directly. The amplifier is bypassed (`HSEBYP`).
    Direct,
}

/// A clock source the system clock and PLL can be fed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
    Hsi,
    Hse { freq: u32, kind: SourceKind },
}

impl Source {
    pub const fn freq(&self) -> u32 {
        match self {
            Self::Hsi => HSI_FREQ,
            Self::Hse { freq, .. } => *freq,
        }
    }

    /// Frequency reaching the PLL with this source selected by `PLLSRC`, before PREDIV.
    /// With `PLLSRC` = HSI the PLL gets HSI / 2, and PREDIV doesn't apply.
    pub const fn pll_input(&self) -> u32 {
        match self {
            Self::Hsi => HSI_FREQ / 2,
            Self::Hse { freq, .. } => *freq,
        }
    }

    /// Whether `HSEBYP` must be set before the HSE is turned on.
    pub const fn bypass(&self) -> bool {
        matches!(
            self,
            Self::Hse {
                kind: SourceKind::Direct,
                ..
            }
        )
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A clock source type usable in `SysClock`. Implemented by `Hsi` and `Hse` only.
pub trait ClockSource: sealed::Sealed {
    const SOURCE: Source;

    const FREQ: u32 = Self::SOURCE.freq();
}

/// How the HSE is wired: `Crystal` or `Bypass`.
pub trait HseMode: sealed::Sealed {
    const KIND: SourceKind;
}

/// HSE from a crystal or resonator.
pub struct Crystal;

/// HSE from an external oscillator driving OSC_IN.
pub struct Bypass;

impl sealed::Sealed for Crystal {}
impl sealed::Sealed for Bypass {}

impl HseMode for Crystal {
    const KIND: SourceKind = SourceKind::Resonator;
}

impl HseMode for Bypass {
    const KIND: SourceKind = SourceKind::Direct;
}

/// The internal 8Mhz oscillator.
pub struct Hsi;

/// An external clock of `FREQ` Hz. Defaults to a crystal; use `Hse<FREQ, Bypass>` for an
/// oscillator module.
pub struct Hse<const FREQ: u32, K: HseMode = Crystal> {
    _mode: PhantomData<K>,
}

impl sealed::Sealed for Hsi {}
impl<const FREQ: u32, K: HseMode> sealed::Sealed for Hse<FREQ, K> {}

impl ClockSource for Hsi {
    const SOURCE: Source = Source::Hsi;
}

impl<const FREQ: u32, K: HseMode> ClockSource for Hse<FREQ, K> {
    const SOURCE: Source = Source::Hse {
        freq: FREQ,
        kind: K::KIND,
    };
}
