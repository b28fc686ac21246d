//! Register map for the two blocks the clock setup touches: RCC and the flash interface.
//!
//! Registers are described as `Reg` (an address) and `Field` (offset and width) constants.
//! Nothing here holds a reference into peripheral memory; all access goes through a
//! `RegisterIo` implementation, which on hardware is `Mmio`, and writes to a single field are
//! a read-modify-write of the whole word.
//!
//! Offsets and bit positions: RM0364, sections 9.4 (RCC) and 3.5 (FLASH).

use core::ptr;

/// AHB1 peripheral bus base address.
pub const AHB1_BASE: usize = 0x4002_0000;
/// Reset and clock control.
pub const RCC_BASE: usize = AHB1_BASE + 0x1000;
/// Flash memory interface.
pub const FLASH_BASE: usize = AHB1_BASE + 0x2000;

/// Word-sized access to memory-mapped registers.
///
/// Implementations must perform each access exactly once and in program order; the hardware
/// implementation does this with volatile loads and stores.
pub trait RegisterIo {
    fn read(&mut self, address: usize) -> u32;

    fn write(&mut self, address: usize, value: u32);
}

/// Volatile access to the real peripheral registers.
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Get access to the register blocks.
    ///
    /// # Safety
    /// Only call this on an STM32F334, and don't let anything else touch the RCC or FLASH
    /// registers while the returned value is in use.
    pub unsafe fn steal() -> Self {
        Self { _private: () }
    }
}

impl RegisterIo for Mmio {
    #[inline(always)]
    fn read(&mut self, address: usize) -> u32 {
        unsafe { ptr::read_volatile(address as *const u32) }
    }

    #[inline(always)]
    fn write(&mut self, address: usize, value: u32) {
        unsafe { ptr::write_volatile(address as *mut u32, value) }
    }
}

/// A bit field inside a 32-bit register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    pub offset: u8,
    pub width: u8,
}

impl Field {
    pub const fn new(offset: u8, width: u8) -> Self {
        assert!(width >= 1 && offset as u32 + width as u32 <= 32);
        Self { offset, width }
    }

    /// Bits covered by this field, in place.
    pub const fn mask(self) -> u32 {
        (u32::MAX >> (32 - self.width as u32)) << self.offset
    }

    /// Read this field's value out of a whole register word.
    pub const fn extract(self, word: u32) -> u32 {
        (word & self.mask()) >> self.offset
    }

    /// Replace this field's bits in `word`. Bits of `value` beyond the width are dropped.
    pub const fn insert(self, word: u32, value: u32) -> u32 {
        (word & !self.mask()) | ((value << self.offset) & self.mask())
    }
}

/// Collects field writes so several fields of one register go out in a single store.
#[derive(Clone, Copy)]
pub struct Writer {
    bits: u32,
}

impl Writer {
    pub fn set(&mut self, field: Field, value: u32) -> &mut Self {
        self.bits = field.insert(self.bits, value);
        self
    }

    pub fn bit(&mut self, field: Field, value: bool) -> &mut Self {
        self.set(field, value as u32)
    }
}

/// A 32-bit register at a fixed address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reg {
    pub address: usize,
}

impl Reg {
    pub const fn new(address: usize) -> Self {
        Self { address }
    }

    pub fn read<B: RegisterIo>(self, bus: &mut B) -> u32 {
        bus.read(self.address)
    }

    pub fn write<B: RegisterIo>(self, bus: &mut B, value: u32) {
        bus.write(self.address, value)
    }

    /// Read the register, let `f` change fields, write it back. One load, one store.
    pub fn modify<B, F>(self, bus: &mut B, f: F)
    where
        B: RegisterIo,
        F: FnOnce(&mut Writer) -> &mut Writer,
    {
        let mut w = Writer {
            bits: self.read(bus),
        };
        f(&mut w);
        self.write(bus, w.bits);
    }

    pub fn read_field<B: RegisterIo>(self, bus: &mut B, field: Field) -> u32 {
        field.extract(self.read(bus))
    }

    pub fn write_field<B: RegisterIo>(self, bus: &mut B, field: Field, value: u32) {
        self.modify(bus, |w| w.set(field, value));
    }

    pub fn is_set<B: RegisterIo>(self, bus: &mut B, field: Field) -> bool {
        self.read_field(bus, field) != 0
    }
}

/// Reset and clock control registers.
pub mod rcc {
    use super::RCC_BASE;

    register!(RCC_BASE, CR @ 0x00, "Clock control register (RCC_CR)", {
        HSION: 0, 1;
        HSIRDY: 1, 1;
        HSITRIM: 3, 5;
        HSICAL: 8, 8;
        HSEON: 16, 1;
        HSERDY: 17, 1;
        HSEBYP: 18, 1;
        CSSON: 19, 1;
        PLLON: 24, 1;
        PLLRDY: 25, 1;
    });

    register!(RCC_BASE, CFGR @ 0x04, "Clock configuration register (RCC_CFGR)", {
        SW: 0, 2;
        SWS: 2, 2;
        HPRE: 4, 4;
        PPRE1: 8, 3;
        PPRE2: 11, 3;
        PLLSRC: 16, 1;
        PLLXTPRE: 17, 1;
        PLLMUL: 18, 4;
        MCO: 24, 3;
        MCOPRE: 28, 3;
        PLLNODIV: 31, 1;
    });

    register!(RCC_BASE, CFGR2 @ 0x2c, "Clock configuration register 2 (RCC_CFGR2)", {
        PREDIV: 0, 4;
        ADC12PRES: 4, 5;
    });

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[repr(u8)]
    /// System clock switch, and its status readback. (`SW`, `SWS`)
    pub enum Sw {
        Hsi = 0b00,
        Hse = 0b01,
        Pll = 0b10,
    }

    impl Sw {
        /// Decode the 2-bit `SWS` field. `0b11` is reserved.
        pub const fn from_bits(bits: u32) -> Option<Self> {
            match bits {
                0b00 => Some(Self::Hsi),
                0b01 => Some(Self::Hse),
                0b10 => Some(Self::Pll),
                _ => None,
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[repr(u8)]
    /// PLL entry clock. (`PLLSRC`)
    pub enum PllSrc {
        Hsi = 0,
        Hse = 1,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[repr(u8)]
    /// Division factor for the AHB clock. Also known as AHB Prescaler. (`HPRE`)
    pub enum HclkPrescaler {
        Div1 = 0b0000,
        Div2 = 0b1000,
        Div4 = 0b1001,
        Div8 = 0b1010,
        Div16 = 0b1011,
        Div64 = 0b1100,
        Div128 = 0b1101,
        Div256 = 0b1110,
        Div512 = 0b1111,
    }

    impl HclkPrescaler {
        pub const fn value(&self) -> u16 {
            match self {
                Self::Div1 => 1,
                Self::Div2 => 2,
                Self::Div4 => 4,
                Self::Div8 => 8,
                Self::Div16 => 16,
                Self::Div64 => 64,
                Self::Div128 => 128,
                Self::Div256 => 256,
                Self::Div512 => 512,
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    #[repr(u8)]
    /// For use with `PPRE1`, and `PPRE2`. Ie, low-speed and high-speed prescalers respectively.
    pub enum ApbPrescaler {
        Div1 = 0b000,
        Div2 = 0b100,
        Div4 = 0b101,
        Div8 = 0b110,
        Div16 = 0b111,
    }

    impl ApbPrescaler {
        pub const fn value(&self) -> u8 {
            match self {
                Self::Div1 => 1,
                Self::Div2 => 2,
                Self::Div4 => 4,
                Self::Div8 => 8,
                Self::Div16 => 16,
            }
        }
    }
}

/// Flash interface registers.
pub mod flash {
    use super::FLASH_BASE;

    register!(FLASH_BASE, ACR @ 0x00, "Flash access control register (FLASH_ACR)", {
        LATENCY: 0, 3;
        HLFCYA: 3, 1;
        PRFTBE: 4, 1;
        PRFTBS: 5, 1;
    });
}
