//! Logging setup for host applications

pub use log::{debug, error, info, trace, warn};

/// Initialize env_logger-backed logging. Call once from the host at startup.
pub fn init() {
    env_logger::init();
}
