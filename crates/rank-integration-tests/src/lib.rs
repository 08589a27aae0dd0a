//! Integration test crate for the novelrank engine.
//!
//! This crate exists solely to run tests that span `rank-core`, `rank-store`
//! and `rank-engine`. It has no public API - all functionality is in the
//! test modules.

#![forbid(unsafe_code)]
