//! Brings the clock tree up to 72Mhz from the Nucleo's 8Mhz ST-LINK MCO clock, then prints
//! the bus speeds once a second using a (blocking) systick delay.

#![deny(warnings)]
#![no_std]
#![no_main]

use cortex_m::delay::Delay;
use cortex_m_rt::entry; // The runtime

use hal::{
    ClockCfg,
    clocks::{Bypass, Hse, SysClock},
};

// Import the panic handler
use panic_probe as _;

/// The ST-LINK on Nucleo-64 boards drives OSC_IN with 8Mhz; there's no crystal fitted.
type Boot = SysClock<Hse<8_000_000, Bypass>, 72_000_000>;

#[entry]
fn main() -> ! {
    rtt_target::rtt_init_defmt!();
    // Set up CPU peripherals
    let cp = cortex_m::Peripherals::take().unwrap();

    let clocks = match Boot::configure() {
        Ok(clocks) => clocks,
        Err(e) => defmt::panic!("Clock setup failed: {}", e),
    };

    defmt::println!("SYSCLK: {} Hz, PLL: {}", clocks.sysclk(), clocks.pll());

    // Setup a delay, based on the Cortex-m systick.
    let mut delay = Delay::new(cp.SYST, clocks.systick());

    loop {
        defmt::debug!("APB1: {} Hz, APB2: {} Hz", clocks.apb1(), clocks.apb2());
        delay.delay_ms(1_000);
    }
}

// same panicking *behavior* as `panic-probe` but doesn't print a panic message
// this prevents the panic message being printed *twice* when `defmt::panic` is invoked
#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}
