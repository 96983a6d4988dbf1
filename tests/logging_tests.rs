//! Unit tests for the logging functionality in the `hart-rs` crate.

use hart_rs::logging::{init_logger, init_logger_with_level, log_debug, log_error, log_frame, log_info, log_warn};

/// Tests that the logging helpers work as expected.
#[test]
fn test_logging() {
    // Just ensure logging functions do not panic after init.
    init_logger();
    log_error("This is an error message");
    log_warn("This is a warning message");
    log_info("This is an info message");
    log_debug("This is a debug message");
}

/// Tests that the logger tolerates repeated initialization.
#[test]
fn test_init_logger_twice() {
    init_logger();
    init_logger();
}

/// Tests that frame tracing handles empty and oversized frames.
#[test]
fn test_log_frame() {
    init_logger();
    log_frame("TX", &[]);
    log_frame("RX", &[0xFF; 300]);
}

/// Tests that an explicit level can be requested, as the `--verbose` flag does.
#[test]
fn test_init_logger_with_level() {
    init_logger_with_level(log::LevelFilter::Debug);
    init_logger();
    log_debug("debug output after an explicit level");
}
