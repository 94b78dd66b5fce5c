//! Duplex CLI library
//!
//! Argument parsing, configuration and command handlers behind the `duplex`
//! binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
