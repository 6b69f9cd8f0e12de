//! Integration tests module
//!
//! Runs the `nexuscli` binary against local directories only. Every case here
//! fails or finishes before any request reaches a server.

pub mod common;
pub mod deps;
pub mod download;
pub mod upload;
