//! # Domain Layer
//!
//! - **entities**: acknowledgements, reports, transit states
//! - **retry**: bounded exponential backoff for peer sends
//! - **seen_window**: per-origin dedup window

pub mod entities;
pub mod errors;
pub mod retry;
pub mod seen_window;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use retry::*;
pub use seen_window::*;
pub use value_objects::*;
