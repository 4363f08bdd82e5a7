//! # Adapters
//!
//! Port implementations used to wire regions inside one process.

pub mod in_process_peer;
pub mod log_sink;

pub use in_process_peer::{BindError, InProcessPeer};
pub use log_sink::LogSink;
