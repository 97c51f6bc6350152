//! Command-line interface for slotprof
//!
//! This module contains CLI argument parsing and configuration

pub mod args;

pub use args::Args;
