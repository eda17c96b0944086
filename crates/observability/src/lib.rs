//! Process-wide tracing setup for binaries and tests that embed the engine.

pub mod tracing;

pub use self::tracing::{LogFormat, LogSettings, init, init_with};
