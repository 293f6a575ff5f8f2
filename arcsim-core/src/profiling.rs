//! Tracy profiling support.
//!
//! With the `tracy` feature enabled, tick phase spans are reported to Tracy.
//!
//! ## Usage
//!
//! 1. Enable the feature: `cargo build -p arcsim --features tracy`
//! 2. Call [`init_tracy()`] early in main
//! 3. Connect the Tracy GUI or capture tool
//!
//! Every completed cycle emits a frame marker via [`frame_mark_cycle`].

/// Trace level for Tracy profiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraceLevel {
    /// Phase spans only (lowest overhead)
    #[default]
    Info,
    Debug,
    /// Per-building detail
    Trace,
}

impl std::str::FromStr for TraceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(TraceLevel::Info),
            "debug" => Ok(TraceLevel::Debug),
            "trace" => Ok(TraceLevel::Trace),
            _ => Err(format!(
                "Invalid trace level: {}. Use info, debug, or trace.",
                s
            )),
        }
    }
}

/// Initialize the Tracy tracing subscriber.
///
/// Must be called before any span is created. A no-op unless the `tracy`
/// feature is enabled.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
#[cfg(feature = "tracy")]
pub fn init_tracy(level: TraceLevel) {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::prelude::*;

    let filter = match level {
        TraceLevel::Info => LevelFilter::INFO,
        TraceLevel::Debug => LevelFilter::DEBUG,
        TraceLevel::Trace => LevelFilter::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_tracy::TracyLayer::default())
        .with(filter)
        .init();
}

/// No-op when tracy feature is disabled.
#[cfg(not(feature = "tracy"))]
pub fn init_tracy(_level: TraceLevel) {}

/// Emit a Tracy frame marker at the end of a cycle.
#[cfg(feature = "tracy")]
#[inline]
pub fn frame_mark_cycle() {
    tracy_client::secondary_frame_mark!("cycle");
}

/// No-op when tracy feature is disabled.
#[cfg(not(feature = "tracy"))]
#[inline]
pub fn frame_mark_cycle() {}
