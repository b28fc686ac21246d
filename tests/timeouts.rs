//! Flags that never change: each wait gives up with the flag it was polling, and the
//! sequence stops where it was.

mod common;

use common::{Sim, Stall};
use stm32f334_clocks::{
    Error,
    clocks::{ClockPlan, ClockSource, Hse, Hsi, ReadyFlag, Sequencer, Stage, WaitPolicy, mhz},
    regs::rcc::{Sw, cfgr, cr},
};

const POLLS: WaitPolicy = WaitPolicy::Bounded(10);

fn run(sim: &mut Sim, plan: &ClockPlan) -> (Result<(), Error>, Stage) {
    let mut seq = Sequencer::new(sim).wait_policy(POLLS);
    let result = seq.run(plan).map(|_| ());
    (result, seq.stage())
}

fn crystal_72mhz() -> ClockPlan {
    ClockPlan::new(<Hse<8_000_000>>::SOURCE, mhz(72)).unwrap()
}

#[test]
fn dead_crystal() {
    let mut sim = Sim::new().stall(Stall::Hse);
    let (result, stage) = run(&mut sim, &crystal_72mhz());

    assert_eq!(result, Err(Error::RegisterUnchanged(ReadyFlag::Hse)));
    assert_eq!(stage, Stage::LatencySet);

    // Still on the HSI, with the PLL untouched.
    assert_eq!(sim.field(cfgr::REG, cfgr::SWS), Sw::Hsi as u32);
    assert!(sim.changed(cr::REG, cr::HSION, 0).is_none());
    assert!(!sim.touched(cfgr::REG, cfgr::PLLMUL));
}

#[test]
fn hsi_not_ready() {
    let plan = ClockPlan::new(Hsi::SOURCE, mhz(8)).unwrap();
    let mut sim = Sim::new().stall(Stall::Hsi);
    let (result, stage) = run(&mut sim, &plan);

    assert_eq!(result, Err(Error::RegisterUnchanged(ReadyFlag::Hsi)));
    assert_eq!(stage, Stage::LatencySet);
}

#[test]
fn pll_never_locks() {
    let mut sim = Sim::new().stall(Stall::PllLock);
    let (result, stage) = run(&mut sim, &crystal_72mhz());

    assert_eq!(result, Err(Error::RegisterUnchanged(ReadyFlag::PllLocked)));
    assert_eq!(stage, Stage::PllConfigured);

    assert!(sim.written(cfgr::REG, cfgr::SW, Sw::Pll as u32).is_none());
    assert_eq!(sim.field(cfgr::REG, cfgr::SWS), Sw::Hse as u32);
}

#[test]
fn pll_never_stops() {
    let mut sim = Sim::after_bootloader().stall(Stall::PllStop);
    let (result, stage) = run(&mut sim, &crystal_72mhz());

    assert_eq!(result, Err(Error::RegisterUnchanged(ReadyFlag::PllStopped)));
    assert_eq!(stage, Stage::SourceSelected);

    // Multiplier left as the bootloader set it.
    assert!(!sim.touched(cfgr::REG, cfgr::PLLMUL));
    assert_eq!(sim.field(cfgr::REG, cfgr::PLLMUL), 4);
}

#[test]
fn switch_not_acknowledged() {
    let mut sim = Sim::new().stall(Stall::Switch);
    let (result, stage) = run(&mut sim, &crystal_72mhz());

    assert_eq!(
        result,
        Err(Error::RegisterUnchanged(ReadyFlag::Switch(Sw::Hse)))
    );
    assert_eq!(stage, Stage::SourceReady);
    assert!(!sim.touched(cfgr::REG, cfgr::PLLMUL));
}

#[test]
fn switch_to_current_source_needs_no_ack() {
    // SWS already reads HSI out of reset.
    let plan = ClockPlan::new(Hsi::SOURCE, mhz(8)).unwrap();
    let mut sim = Sim::new().stall(Stall::Switch);
    let (result, stage) = run(&mut sim, &plan);

    assert_eq!(result, Ok(()));
    assert_eq!(stage, Stage::Stable);
}

#[test]
fn unbounded_wait_completes() {
    let mut sim = Sim::new();
    let mut seq = Sequencer::new(&mut sim).wait_policy(WaitPolicy::Forever);
    let clocks = seq.run(&crystal_72mhz()).unwrap();

    assert_eq!(seq.stage(), Stage::Stable);
    assert_eq!(clocks.pll().map(|p| p.multiplier()), Some(9));
}

#[test]
fn default_policy_is_bounded() {
    assert!(matches!(WaitPolicy::default(), WaitPolicy::Bounded(n) if n > 0));
}
