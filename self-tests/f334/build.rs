fn main() {
    // The test harness' linker script only exists for test builds.
    println!("cargo::rustc-link-arg-tests=-Tembedded-test.x");
    println!("cargo::rerun-if-changed=memory.x");
}
