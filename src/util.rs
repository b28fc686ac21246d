//! This is an internal module that contains utility functionality used by other modules.

use cfg_if::cfg_if;

/// Default number of polls before giving up on a register flag. At the 8Mhz reset clock this
/// is a few hundred milliseconds, well past the HSE startup and PLL lock times in the
/// datasheet.
pub const MAX_ITERS: u32 = 300_000;

/// Pause between polls of a status flag.
#[inline(always)]
pub(crate) fn spin() {
    cfg_if! {
        if #[cfg(arm_none)] {
            cortex_m::asm::nop();
        } else {
            core::hint::spin_loop();
        }
    }
}

/// Poll `$cond` until it is false. With `Some(max)`, give up after `max` polls and return
/// `Err($err)` from the enclosing function; with `None`, wait indefinitely.
///
/// Example: `bounded_loop!(Some(MAX_ITERS), !hse_ready(), Error::RegisterUnchanged(..));`
macro_rules! bounded_loop {
    ($max:expr, $cond:expr, $err:expr) => {{
        match $max {
            Some(max) => {
                let mut i: u32 = 0;
                while $cond {
                    i += 1;
                    if i >= max {
                        return Err($err);
                    }
                    $crate::util::spin();
                }
            }
            None => {
                while $cond {
                    $crate::util::spin();
                }
            }
        }
    }};
}

pub(crate) use bounded_loop;
