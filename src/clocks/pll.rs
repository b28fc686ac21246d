//! PLL divider and multiplier search.
//!
//! The PLL output is `input / PREDIV * PLLMUL`. `solve` tries every divider from 1 to 16 and,
//! for each, every multiplier from 2 to 16, returning the first pair that hits the target
//! exactly. The division truncates and happens before the multiplication, so a source that
//! isn't a multiple of the divider can miss targets a rational calculation would hit; that is
//! the predicate existing boards were tuned against, and it is kept as is.
//!
//! PREDIV only divides the HSE. With the HSI as PLL source the input is fixed at HSI / 2, and
//! `solve_undivided` searches the multiplier alone.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
/// PLL input predivider. The discriminant is the `RCC_CFGR2.PREDIV` value.
pub enum Prediv {
    Div1 = 0b0000,
    Div2 = 0b0001,
    Div3 = 0b0010,
    Div4 = 0b0011,
    Div5 = 0b0100,
    Div6 = 0b0101,
    Div7 = 0b0110,
    Div8 = 0b0111,
    Div9 = 0b1000,
    Div10 = 0b1001,
    Div11 = 0b1010,
    Div12 = 0b1011,
    Div13 = 0b1100,
    Div14 = 0b1101,
    Div15 = 0b1110,
    Div16 = 0b1111,
}

impl Prediv {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 16;

    pub const fn from_value(div: u32) -> Option<Self> {
        Some(match div {
            1 => Self::Div1,
            2 => Self::Div2,
            3 => Self::Div3,
            4 => Self::Div4,
            5 => Self::Div5,
            6 => Self::Div6,
            7 => Self::Div7,
            8 => Self::Div8,
            9 => Self::Div9,
            10 => Self::Div10,
            11 => Self::Div11,
            12 => Self::Div12,
            13 => Self::Div13,
            14 => Self::Div14,
            15 => Self::Div15,
            16 => Self::Div16,
            _ => return None,
        })
    }

    pub const fn value(&self) -> u32 {
        *self as u32 + 1
    }

    pub const fn bits(&self) -> u32 {
        *self as u32
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
/// PLL multiplication factor. The discriminant is the `RCC_CFGR.PLLMUL` value.
pub enum PllMul {
    Mul2 = 0b0000,
    Mul3 = 0b0001,
    Mul4 = 0b0010,
    Mul5 = 0b0011,
    Mul6 = 0b0100,
    Mul7 = 0b0101,
    Mul8 = 0b0110,
    Mul9 = 0b0111,
    Mul10 = 0b1000,
    Mul11 = 0b1001,
    Mul12 = 0b1010,
    Mul13 = 0b1011,
    Mul14 = 0b1100,
    Mul15 = 0b1101,
    Mul16 = 0b1110,
}

impl PllMul {
    pub const MIN: u32 = 2;
    pub const MAX: u32 = 16;

    pub const fn from_value(mul: u32) -> Option<Self> {
        Some(match mul {
            2 => Self::Mul2,
            3 => Self::Mul3,
            4 => Self::Mul4,
            5 => Self::Mul5,
            6 => Self::Mul6,
            7 => Self::Mul7,
            8 => Self::Mul8,
            9 => Self::Mul9,
            10 => Self::Mul10,
            11 => Self::Mul11,
            12 => Self::Mul12,
            13 => Self::Mul13,
            14 => Self::Mul14,
            15 => Self::Mul15,
            16 => Self::Mul16,
            _ => return None,
        })
    }

    pub const fn value(&self) -> u32 {
        *self as u32 + 2
    }

    pub const fn bits(&self) -> u32 {
        *self as u32
    }
}

/// No divider/multiplier pair reaches the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Unsatisfiable;

/// A divider/multiplier pair found by `solve`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PllSolution {
    pub prediv: Prediv,
    pub pll_mul: PllMul,
}

impl PllSolution {
    pub const fn divider(&self) -> u32 {
        self.prediv.value()
    }

    pub const fn multiplier(&self) -> u32 {
        self.pll_mul.value()
    }

    /// PLL output for `input`, with the same truncation `solve` uses.
    pub const fn output(&self, input: u32) -> u64 {
        (input / self.divider()) as u64 * self.multiplier() as u64
    }
}

/// Find the smallest divider, then the smallest multiplier, such that
/// `source / divider * multiplier == target` in integer arithmetic.
pub const fn solve(source: u32, target: u32) -> Result<PllSolution, Unsatisfiable> {
    search(source, target, Prediv::MAX)
}

/// Find the smallest multiplier such that `input * multiplier == target`, for a PLL input
/// that bypasses PREDIV. The solution's divider is always 1.
pub const fn solve_undivided(input: u32, target: u32) -> Result<PllSolution, Unsatisfiable> {
    search(input, target, Prediv::MIN)
}

const fn search(source: u32, target: u32, max_div: u32) -> Result<PllSolution, Unsatisfiable> {
    let mut div = Prediv::MIN;
    while div <= max_div {
        let mut mul = PllMul::MIN;
        while mul <= PllMul::MAX {
            // u64, so a fast source times 16 can't wrap into a false match.
            if (source / div) as u64 * mul as u64 == target as u64 {
                // Both are in range by construction.
                if let (Some(prediv), Some(pll_mul)) =
                    (Prediv::from_value(div), PllMul::from_value(mul))
                {
                    return Ok(PllSolution { prediv, pll_mul });
                }
            }
            mul += 1;
        }
        div += 1;
    }
    Err(Unsatisfiable)
}
