use cfg_aliases::cfg_aliases;

fn main() {
    cfg_aliases! {
        // Bare-metal Cortex-M; the only place `Mmio` points at real registers.
        arm_none: { all(target_arch = "arm", target_os = "none") },
    }
}
