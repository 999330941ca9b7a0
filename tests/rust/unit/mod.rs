//! Public API tests for the SELECT IR.

mod query_building_tests;
mod serialization_tests;

/// Route `log` output through the test harness (`RUST_LOG=debug` to see it).
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}
