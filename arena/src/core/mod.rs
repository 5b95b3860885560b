//! Deterministic, pure logic shared by the match drivers.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod challenge;
pub mod format;
pub mod state;
pub mod summary;
pub mod types;
