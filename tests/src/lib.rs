//! # Cross-Region Relay Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion benchmarks (run from benches/)
//! │   ├── filter_matching.rs
//! │   └── registry_query.rs
//! │
//! └── integration/      # Multi-crate and multi-region scenarios
//!     ├── filtering.rs
//!     ├── invalidation.rs
//!     ├── cross_region.rs
//!     └── failure_handling.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p xr-tests
//! cargo test -p xr-tests integration::cross_region
//! cargo bench -p xr-tests
//! ```

pub mod benchmarks;
