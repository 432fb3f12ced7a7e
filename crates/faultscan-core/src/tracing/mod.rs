//! Tracing initialization and the single ordered log sink.

pub mod panic;
pub mod setup;
pub mod sink;

pub use panic::install_panic_hook;
pub use setup::{init_tracing, LogSettings};
pub use sink::{LogSink, LogSinkGuard};
