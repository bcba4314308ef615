//! Shared test fixtures for the layered configuration workspace.
//!
//! Provides a [`LayeredSandbox`]: a temporary directory laid out like the
//! app, host, user and `.env` locations of one platform, plus the
//! environment overrides that redirect discovery into it. Each sandbox is
//! removed when dropped.

mod fixtures;

pub use fixtures::*;
