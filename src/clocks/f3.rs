//! Boot sequence for the F334 clock tree: flash wait states, oscillator bring-up, PLL, and
//! the SYSCLK switch.

use core::marker::PhantomData;

use crate::{
    clocks::{
        pll::{self, PllSolution},
        source::{ClockSource, HSI_FREQ, Source, mhz},
    },
    error::{Error, Result},
    regs::{
        Mmio, RegisterIo, flash,
        rcc::{self, ApbPrescaler, HclkPrescaler, PllSrc, Sw},
    },
    traits::{ClockCfg, ClocksValid},
    util::{MAX_ITERS, bounded_loop},
};

/// Maximum SYSCLK, HCLK and APB2 speed.
pub const SYSCLK_MAX: u32 = mhz(72);
/// Maximum APB1 speed.
pub const APB1_MAX: u32 = mhz(36);
/// HSE input range, crystal or bypass.
pub const HSE_MIN: u32 = mhz(4);
pub const HSE_MAX: u32 = mhz(32);
/// SYSCLK straight from the HSI, for `SysClock<Hsi, HSI_SYSCLK>`.
pub const HSI_SYSCLK: u32 = HSI_FREQ;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
/// Represents Flash wait states in the FLASH_ACR register.
pub enum FlashLatency {
    /// 0 < SYSCLK < 24Mhz
    Ws0 = 0b000,
    /// 24Mhz <= SYSCLK < 48Mhz
    Ws1 = 0b001,
    /// 48Mhz <= SYSCLK <= 72Mhz
    Ws2 = 0b010,
}

impl FlashLatency {
    /// f3 ref man section 3.5.1.
    pub const fn from_hertz(sysclk: u32) -> Self {
        if sysclk < mhz(24) {
            Self::Ws0
        } else if sysclk < mhz(48) {
            Self::Ws1
        } else {
            Self::Ws2
        }
    }
}

/// Flags the sequencer waits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadyFlag {
    /// `HSIRDY` never set.
    Hsi,
    /// `HSERDY` never set. Usually a missing or mis-loaded crystal.
    Hse,
    /// `PLLRDY` stayed set after `PLLON` was cleared.
    PllStopped,
    /// `PLLRDY` never set after `PLLON`.
    PllLocked,
    /// `SWS` never reported the source written to `SW`.
    Switch(Sw),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RccError {
    /// No PLL divider and multiplier reach the requested SYSCLK.
    Unsatisfiable,
    /// SYSCLK or the HSE frequency is outside what the part supports.
    SpeedOutOfRange,
}

/// How long to wait on a status flag before reporting `Error::RegisterUnchanged`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaitPolicy {
    /// Spin until the hardware responds, however long that takes.
    Forever,
    /// Give up after this many polls.
    Bounded(u32),
}

impl WaitPolicy {
    fn max_polls(self) -> Option<u32> {
        match self {
            Self::Forever => None,
            Self::Bounded(n) => Some(n),
        }
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self::Bounded(MAX_ITERS)
    }
}

/// Where the clock tree is in the boot sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Power-on state: HSI drives SYSCLK.
    Reset,
    /// Flash wait states set for the target frequency.
    LatencySet,
    /// The requested oscillator is running.
    SourceReady,
    /// The requested oscillator drives SYSCLK.
    SourceSelected,
    /// PLL is off, with its divider, multiplier and input written.
    PllConfigured,
    /// PLL is locked.
    PllEngaged,
    /// SYSCLK is at the target frequency.
    Stable,
}

/// Everything the sequencer writes, worked out ahead of time. Build one in a `const` to get
/// configuration errors at compile time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockPlan {
    pub source: Source,
    /// Target SYSCLK, in Hz.
    pub sysclk: u32,
    pub latency: FlashLatency,
    /// `None` when SYSCLK is taken straight from the source.
    pub pll: Option<PllSolution>,
    pub hclk_prescaler: HclkPrescaler,
    pub apb1_prescaler: ApbPrescaler,
    pub apb2_prescaler: ApbPrescaler,
}

impl ClockPlan {
    pub const fn new(source: Source, sysclk: u32) -> core::result::Result<Self, RccError> {
        if let Source::Hse { freq, .. } = source {
            if freq < HSE_MIN || freq > HSE_MAX {
                return Err(RccError::SpeedOutOfRange);
            }
        }
        if sysclk > SYSCLK_MAX {
            return Err(RccError::SpeedOutOfRange);
        }

        let pll = if sysclk == source.freq() {
            None
        } else {
            let solution = match source {
                Source::Hsi => pll::solve_undivided(source.pll_input(), sysclk),
                Source::Hse { .. } => pll::solve(source.pll_input(), sysclk),
            };
            match solution {
                Ok(solution) => Some(solution),
                Err(_) => return Err(RccError::Unsatisfiable),
            }
        };

        let apb1_prescaler = if sysclk > APB1_MAX {
            ApbPrescaler::Div2
        } else {
            ApbPrescaler::Div1
        };

        Ok(Self {
            source,
            sysclk,
            latency: FlashLatency::from_hertz(sysclk),
            pll,
            hclk_prescaler: HclkPrescaler::Div1,
            apb1_prescaler,
            apb2_prescaler: ApbPrescaler::Div1,
        })
    }

    fn pll_src(&self) -> PllSrc {
        match self.source {
            Source::Hsi => PllSrc::Hsi,
            Source::Hse { .. } => PllSrc::Hse,
        }
    }
}

/// Walks the RCC from its reset state to a `ClockPlan`.
pub struct Sequencer<'a, B: RegisterIo> {
    bus: &'a mut B,
    wait: WaitPolicy,
    stage: Stage,
}

impl<'a, B: RegisterIo> Sequencer<'a, B> {
    pub fn new(bus: &'a mut B) -> Self {
        Self {
            bus,
            wait: WaitPolicy::default(),
            stage: Stage::Reset,
        }
    }

    pub fn wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// The last stage reached. After an error, this is where the sequence stopped.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Run the full sequence. Returns once SYSCLK runs at `plan.sysclk`, or with
    /// `Error::RegisterUnchanged` naming the flag that didn't respond.
    pub fn run(&mut self, plan: &ClockPlan) -> Result<Clocks> {
        use rcc::{cfgr, cfgr2, cr};

        debug!(
            "Configuring clocks: {} Hz from {}, PLL {}",
            plan.sysclk,
            plan.source,
            plan.pll
        );

        // Wait states go up before anything can raise SYSCLK.
        flash::acr::REG.write_field(self.bus, flash::acr::LATENCY, plan.latency as u32);
        self.advance(Stage::LatencySet);

        cfgr::REG.modify(self.bus, |w| {
            w.set(cfgr::HPRE, plan.hclk_prescaler as u32)
                .set(cfgr::PPRE1, plan.apb1_prescaler as u32)
                .set(cfgr::PPRE2, plan.apb2_prescaler as u32)
        });

        match plan.source {
            Source::Hsi => {
                cr::REG.modify(self.bus, |w| w.bit(cr::HSION, true));
                self.wait_while(ReadyFlag::Hsi, |bus| !cr::REG.is_set(bus, cr::HSIRDY))?;
                self.advance(Stage::SourceReady);

                self.switch_to(Sw::Hsi)?;
                if plan.pll.is_none() || !cfg!(feature = "legacy-sequence") {
                    cr::REG.modify(self.bus, |w| w.bit(cr::HSEON, false));
                }
            }
            Source::Hse { .. } => {
                // HSEBYP is only writable while the HSE is off.
                if plan.source.bypass() {
                    cr::REG.modify(self.bus, |w| w.bit(cr::HSEBYP, true));
                }
                cr::REG.modify(self.bus, |w| w.bit(cr::HSEON, true));
                self.wait_while(ReadyFlag::Hse, |bus| !cr::REG.is_set(bus, cr::HSERDY))?;
                self.advance(Stage::SourceReady);

                cr::REG.modify(self.bus, |w| w.bit(cr::HSION, false));
                self.switch_to(Sw::Hse)?;

                // Hardware holds HSION while HSI is SYSCLK, so the clear above may not have
                // taken.
                if cr::REG.is_set(self.bus, cr::HSION) {
                    cr::REG.modify(self.bus, |w| w.bit(cr::HSION, false));
                }
            }
        }
        self.advance(Stage::SourceSelected);

        // PLLMUL, PLLSRC and PREDIV can only change with the PLL off.
        cr::REG.modify(self.bus, |w| w.bit(cr::PLLON, false));

        if let Some(solution) = plan.pll {
            self.wait_while(ReadyFlag::PllStopped, |bus| {
                cr::REG.is_set(bus, cr::PLLRDY)
            })?;

            cfgr::REG.modify(self.bus, |w| {
                w.set(cfgr::PLLMUL, solution.pll_mul.bits())
                    .set(cfgr::PLLSRC, plan.pll_src() as u32)
            });
            // Always Div1 for the HSI, which doesn't pass through PREDIV.
            cfgr2::REG.write_field(self.bus, cfgr2::PREDIV, solution.prediv.bits());
            self.advance(Stage::PllConfigured);

            cr::REG.modify(self.bus, |w| w.bit(cr::PLLON, true));
            self.wait_while(ReadyFlag::PllLocked, |bus| {
                !cr::REG.is_set(bus, cr::PLLRDY)
            })?;
            self.advance(Stage::PllEngaged);

            self.switch_to(Sw::Pll)?;
        }

        self.advance(Stage::Stable);

        Ok(Clocks { plan: *plan })
    }

    /// Select a SYSCLK source, and wait for the switch to show up in `SWS`.
    fn switch_to(&mut self, sw: Sw) -> Result<()> {
        use rcc::cfgr;

        cfgr::REG.write_field(self.bus, cfgr::SW, sw as u32);
        self.wait_while(ReadyFlag::Switch(sw), |bus| {
            Sw::from_bits(cfgr::REG.read_field(bus, cfgr::SWS)) != Some(sw)
        })
    }

    fn wait_while<F>(&mut self, flag: ReadyFlag, mut busy: F) -> Result<()>
    where
        F: FnMut(&mut B) -> bool,
    {
        trace!("Waiting on {}", flag);

        let stage = self.stage;
        bounded_loop!(self.wait.max_polls(), busy(&mut *self.bus), {
            warn!("Timed out waiting on {} during {}", flag, stage);
            Error::RegisterUnchanged(flag)
        });
        Ok(())
    }

    fn advance(&mut self, stage: Stage) {
        debug!("Clock stage: {} -> {}", self.stage, stage);
        self.stage = stage;
    }
}

/// A configured clock tree, as returned by `Sequencer::run`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    plan: ClockPlan,
}

impl Clocks {
    pub fn plan(&self) -> &ClockPlan {
        &self.plan
    }

    pub fn source(&self) -> Source {
        self.plan.source
    }

    pub fn latency(&self) -> FlashLatency {
        self.plan.latency
    }

    pub fn pll(&self) -> Option<PllSolution> {
        self.plan.pll
    }
}

impl ClockCfg for Clocks {
    fn sysclk(&self) -> u32 {
        self.plan.sysclk
    }

    fn hclk(&self) -> u32 {
        self.sysclk() / self.plan.hclk_prescaler.value() as u32
    }

    fn systick(&self) -> u32 {
        self.hclk()
    }

    fn apb1(&self) -> u32 {
        self.hclk() / self.plan.apb1_prescaler.value() as u32
    }

    fn apb1_timer(&self) -> u32 {
        if let ApbPrescaler::Div1 = self.plan.apb1_prescaler {
            self.apb1()
        } else {
            self.apb1() * 2
        }
    }

    fn apb2(&self) -> u32 {
        self.hclk() / self.plan.apb2_prescaler.value() as u32
    }

    fn apb2_timer(&self) -> u32 {
        if let ApbPrescaler::Div1 = self.plan.apb2_prescaler {
            self.apb2()
        } else {
            self.apb2() * 2
        }
    }

    fn validate_speeds(&self) -> ClocksValid {
        if self.sysclk() > SYSCLK_MAX
            || self.hclk() > SYSCLK_MAX
            || self.apb1() > APB1_MAX
            || self.apb2() > SYSCLK_MAX
        {
            ClocksValid::NotValid
        } else {
            ClocksValid::Valid
        }
    }
}

/// SYSCLK at `TARGET` Hz, from clock source `S`.
///
/// The plan is a constant: a target the PLL can't reach exactly, or one above 72Mhz, stops
/// the build. From the HSI, the PLL runs from 4Mhz (HSI / 2), so PLL targets are multiples
/// of 4Mhz up to 64Mhz.
///
/// ```
/// use stm32f334_clocks::clocks::{Bypass, Hse, Hsi, SysClock};
///
/// type FromHsi = SysClock<Hsi, 8_000_000>;
/// type FromOscillator = SysClock<Hse<12_000_000, Bypass>, 72_000_000>;
///
/// assert!(FromHsi::PLAN.pll.is_none());
/// assert_eq!(FromOscillator::PLAN.pll.unwrap().multiplier(), 6);
/// ```
///
/// ```compile_fail
/// use stm32f334_clocks::clocks::{Hse, SysClock};
///
/// // No divider and multiplier give 8_000_001 from 8Mhz.
/// let _ = SysClock::<Hse<8_000_000>, 8_000_001>::PLAN;
/// ```
///
/// ```compile_fail
/// use stm32f334_clocks::clocks::{Hsi, SysClock};
///
/// // 72Mhz would need 18 x (HSI / 2).
/// let _ = SysClock::<Hsi, 72_000_000>::PLAN;
/// ```
pub struct SysClock<S: ClockSource, const TARGET: u32> {
    _source: PhantomData<S>,
}

impl<S: ClockSource, const TARGET: u32> SysClock<S, TARGET> {
    pub const SYSCLK: u32 = TARGET;

    pub const PLAN: ClockPlan = match ClockPlan::new(S::SOURCE, TARGET) {
        Ok(plan) => plan,
        Err(RccError::Unsatisfiable) => {
            panic!("Could not determine divider and multiplier values for PLL")
        }
        Err(RccError::SpeedOutOfRange) => {
            panic!("SYSCLK or HSE frequency out of range for the STM32F334")
        }
    };

    /// Set up the clock tree on the MCU. Call this once, early in `main`, before other
    /// peripherals are configured.
    pub fn configure() -> Result<Clocks> {
        Self::configure_with_policy(WaitPolicy::default())
    }

    /// As `configure`, choosing how long to wait on oscillators and the PLL.
    /// `WaitPolicy::Forever` never returns on a dead crystal.
    pub fn configure_with_policy(wait: WaitPolicy) -> Result<Clocks> {
        cortex_m::interrupt::free(|_| {
            // We're inside a critical section, and nothing else in the crate hands out RCC or
            // FLASH access.
            let mut bus = unsafe { Mmio::steal() };
            Sequencer::new(&mut bus).wait_policy(wait).run(&Self::PLAN)
        })
    }

    /// Run the sequence against any register backend.
    pub fn configure_with<B: RegisterIo>(bus: &mut B) -> Result<Clocks> {
        Sequencer::new(bus).run(&Self::PLAN)
    }
}
