//! CLI commands

pub mod close;
pub mod config;
pub mod open;
pub mod sync;
pub mod unsync;
pub mod update;
pub mod utils;
