//! Shared test utilities for examgen integration tests.
//!
//! Provides builders for jobs and memory-backed stores so tests exercise the
//! public API without touching the filesystem or the network.

pub mod builders;

pub use builders::*;
