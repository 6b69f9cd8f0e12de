//! Core utilities shared by the nexus-cli library and binary.
//!
//! Holds the error taxonomy used across every module and the pure path helpers
//! that translate between repository asset paths and local filesystem paths.

pub mod core;

pub use core::error::{NexusError, NexusResult};
