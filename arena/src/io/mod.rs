//! I/O adapters used by the arena drivers.

pub mod config;
pub mod context;
pub mod git;
pub mod hosting;
pub mod invoker;
pub mod manifest;
pub mod process;
pub mod status;
pub mod wire;
