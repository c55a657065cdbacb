//! Process-wide tracing setup.

pub mod tracing;

pub use self::tracing::LogFormat;

/// Install the global subscriber, configured from `RUST_LOG` and
/// `LOG_FORMAT`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    self::tracing::init(LogFormat::from_env());
}
