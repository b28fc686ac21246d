//! This module contains clock configurations. `SysClock` is the entry point: choose a source
//! and a SYSCLK frequency, and call `configure()` at the top of `main`.
//!
//! See STM32CubeIDE for an interactive editor that's very useful for seeing what
//! settings are available, and validating them.
//!
//! See the Reference Manuals for non-interactive visualizations.

mod f3;
pub mod pll;
mod source;

pub use f3::*;
pub use pll::{PllMul, PllSolution, Prediv, Unsatisfiable, solve, solve_undivided};
pub use source::*;
