//! projdock library
//!
//! Core functionality for managing a local project workspace: a plain-text
//! settings store, disk image mounting, and folder sync to an S3-compatible
//! bucket through rclone.

pub mod config;
pub mod error;
pub mod logging;
pub mod process;
pub mod workspace;
