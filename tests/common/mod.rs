//! A register-level stand-in for the F334 RCC and flash interface.
//!
//! Status bits follow their control bits on every write, the way the hardware does once an
//! oscillator has started: `HSIRDY` follows `HSION`, `HSERDY` follows `HSEON`, `PLLRDY`
//! follows `PLLON`, and `SWS` follows `SW`. Any of them can be stalled to model a dead
//! crystal or a PLL that won't lock. `HSION` is held set while the HSI drives SYSCLK or the
//! PLL, as RM0364 describes.

#![allow(dead_code)]

use std::collections::HashMap;

use stm32f334_clocks::regs::{Field, Reg, RegisterIo, flash, rcc};

/// A status bit that doesn't follow its control bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stall {
    Hsi,
    Hse,
    /// `PLLRDY` never sets.
    PllLock,
    /// `PLLRDY` never clears.
    PllStop,
    /// `SWS` never changes.
    Switch,
}

/// One store, as software issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Write {
    pub address: usize,
    /// Register contents right before the store.
    pub before: u32,
    /// The value written.
    pub value: u32,
}

pub struct Sim {
    regs: HashMap<usize, u32>,
    stalls: Vec<Stall>,
    pub writes: Vec<Write>,
}

/// RCC_CR reset value: HSI on and ready, HSITRIM = 16.
pub const CR_RESET: u32 = 0x0000_0083;
/// FLASH_ACR reset value: prefetch enabled.
pub const ACR_RESET: u32 = 0x0000_0030;
/// Internal oscillator, in Hz.
pub const HSI: u32 = 8_000_000;

impl Sim {
    /// Power-on state.
    pub fn new() -> Self {
        let mut regs = HashMap::new();
        regs.insert(rcc::cr::REG.address, CR_RESET);
        regs.insert(rcc::cfgr::REG.address, 0);
        regs.insert(rcc::cfgr2::REG.address, 0);
        regs.insert(flash::acr::REG.address, ACR_RESET);

        Self {
            regs,
            stalls: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// State a bootloader might leave behind: HSE and PLL running, HSI still SYSCLK.
    pub fn after_bootloader() -> Self {
        let mut sim = Self::new();
        let cr = rcc::cr::HSEON.insert(CR_RESET, 1);
        let cr = rcc::cr::HSERDY.insert(cr, 1);
        let cr = rcc::cr::PLLON.insert(cr, 1);
        let cr = rcc::cr::PLLRDY.insert(cr, 1);
        sim.regs.insert(rcc::cr::REG.address, cr);
        sim.regs.insert(
            rcc::cfgr::REG.address,
            rcc::cfgr::PLLMUL.insert(rcc::cfgr::PLLSRC.insert(0, 1), 4),
        );
        sim.regs.insert(rcc::cfgr2::REG.address, 1);
        sim
    }

    pub fn stall(mut self, stall: Stall) -> Self {
        self.stalls.push(stall);
        self.respond();
        self
    }

    fn stalled(&self, stall: Stall) -> bool {
        self.stalls.contains(&stall)
    }

    /// Current value of a field, as software would read it.
    pub fn field(&self, reg: Reg, field: Field) -> u32 {
        field.extract(self.regs[&reg.address])
    }

    /// Index of the first store to `reg` that changed `field` to `value`.
    pub fn changed(&self, reg: Reg, field: Field, value: u32) -> Option<usize> {
        self.writes.iter().position(|w| {
            w.address == reg.address
                && field.extract(w.value) == value
                && field.extract(w.before) != value
        })
    }

    /// Index of the first store to `reg` that left `field` at `value`, changed or not.
    pub fn written(&self, reg: Reg, field: Field, value: u32) -> Option<usize> {
        self.writes
            .iter()
            .position(|w| w.address == reg.address && field.extract(w.value) == value)
    }

    /// Whether any store changed `field`.
    pub fn touched(&self, reg: Reg, field: Field) -> bool {
        self.writes
            .iter()
            .any(|w| w.address == reg.address && field.extract(w.value) != field.extract(w.before))
    }

    /// SYSCLK the hardware would produce from the current register state, with `hse` Hz on
    /// OSC_IN. The PLL input is HSI / 2 with `PLLSRC` = 0, and HSE / PREDIV otherwise.
    pub fn sysclk(&self, hse: u32) -> u32 {
        use rcc::{cfgr, cfgr2};

        match cfgr::SWS.extract(self.regs[&cfgr::REG.address]) {
            0b00 => HSI,
            0b01 => hse,
            _ => {
                let input = if self.field(cfgr::REG, cfgr::PLLSRC) == 0 {
                    HSI / 2
                } else {
                    hse / (self.field(cfgr2::REG, cfgr2::PREDIV) + 1)
                };
                // 0b1111 is x16, same as 0b1110.
                let mul = (self.field(cfgr::REG, cfgr::PLLMUL) + 2).min(16);
                input * mul
            }
        }
    }

    pub fn writes_to(&self, reg: Reg) -> usize {
        self.writes.iter().filter(|w| w.address == reg.address).count()
    }

    fn respond(&mut self) {
        use rcc::{cfgr, cr};

        let mut c = self.regs[&cr::REG.address];
        let mut g = self.regs[&cfgr::REG.address];

        if !self.stalled(Stall::Hsi) {
            c = cr::HSIRDY.insert(c, cr::HSION.extract(c));
        } else {
            c = cr::HSIRDY.insert(c, 0);
        }

        if !self.stalled(Stall::Hse) {
            c = cr::HSERDY.insert(c, cr::HSEON.extract(c));
        } else {
            c = cr::HSERDY.insert(c, 0);
        }

        let pll_on = cr::PLLON.extract(c);
        let lock_stalled = pll_on == 1 && self.stalled(Stall::PllLock);
        let stop_stalled = pll_on == 0 && self.stalled(Stall::PllStop);
        if !lock_stalled && !stop_stalled {
            c = cr::PLLRDY.insert(c, pll_on);
        } else if lock_stalled {
            c = cr::PLLRDY.insert(c, 0);
        }

        // SW = 0b11 is reserved and ignored.
        let sw = cfgr::SW.extract(g);
        if !self.stalled(Stall::Switch) && sw != 0b11 {
            g = cfgr::SWS.insert(g, sw);
        }

        let sws = cfgr::SWS.extract(g);
        let hsi_feeds_pll = pll_on == 1 && cfgr::PLLSRC.extract(g) == 0;
        if sws == 0b00 || (sws == 0b10 && hsi_feeds_pll) {
            c = cr::HSION.insert(c, 1);
        }

        self.regs.insert(cr::REG.address, c);
        self.regs.insert(cfgr::REG.address, g);
    }
}

impl RegisterIo for Sim {
    fn read(&mut self, address: usize) -> u32 {
        *self
            .regs
            .get(&address)
            .unwrap_or_else(|| panic!("read from unmapped address {:#010x}", address))
    }

    fn write(&mut self, address: usize, value: u32) {
        let before = self.read(address);
        self.writes.push(Write {
            address,
            before,
            value,
        });
        self.regs.insert(address, value);
        self.respond();
    }
}
