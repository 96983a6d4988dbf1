use log::{debug, error, info, log_enabled, warn, Level};

/// Frames longer than this are truncated in debug output.
const MAX_LOG_FRAME_BYTES: usize = 64;

/// Initializes the logger with the `env_logger` crate.
///
/// The level is taken from `RUST_LOG` and defaults to `info`. Calling this more
/// than once is harmless.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

/// Initializes the logger at an explicit level, ignoring `RUST_LOG`.
pub fn init_logger_with_level(level: log::LevelFilter) {
    let _ = env_logger::Builder::new().filter_level(level).try_init();
}

/// Logs an error message.
pub fn log_error(message: &str) {
    if log_enabled!(Level::Error) {
        error!("{message}");
    }
}

/// Logs a warning message.
pub fn log_warn(message: &str) {
    if log_enabled!(Level::Warn) {
        warn!("{message}");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}

/// Logs a debug message.
pub fn log_debug(message: &str) {
    if log_enabled!(Level::Debug) {
        debug!("{message}");
    }
}

/// Logs a wire frame as spaced hex at debug level.
pub fn log_frame(direction: &str, frame: &[u8]) {
    if !log_enabled!(Level::Debug) {
        return;
    }
    let shown = &frame[..frame.len().min(MAX_LOG_FRAME_BYTES)];
    let suffix = if frame.len() > MAX_LOG_FRAME_BYTES {
        format!(" ... ({} bytes total)", frame.len())
    } else {
        String::new()
    };
    debug!("{direction}: {}{suffix}", crate::util::hex::format_hex_compact(shown));
}
