//! Test logging helpers shared by the unit test modules.
//!
//! - [`init_test_logging`]: installs a `tracing-subscriber` fmt writer once
//! - `test_phase!` / `test_complete!`: structured start/end markers
//! - `assert_with_log!`: assertion that logs expected/actual before failing
//!
//! Set `TEST_LOG_LEVEL` (`error`..`trace`) to change verbosity.

use tracing::Level;

fn level_from_env() -> Level {
    std::env::var("TEST_LOG_LEVEL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO)
}

/// Installs the test subscriber. Safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(level_from_env())
        .with_test_writer()
        .with_thread_names(true)
        .try_init();
}

/// Phase tracking macro for structured test logging.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(test = $name, "=== TEST START ===");
    };
}

/// Marks a test as completed.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = $name, "=== TEST COMPLETE ===");
    };
}

/// Assertion with logging for better test output.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        if !$cond {
            tracing::error!(
                assertion = $msg,
                expected = ?$expected,
                actual = ?$actual,
                "Assertion failed"
            );
        }
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}
