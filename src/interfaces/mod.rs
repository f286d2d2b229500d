//! Outer surfaces: command line and logging setup for the binary.

pub mod cli;
pub mod logging;
