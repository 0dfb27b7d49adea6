//! LineUp - in-memory message queue server.
//!
//! This library exposes the queue engine, the directory and the HTTP API for
//! the server binary, benchmarking and testing.

pub mod config;
pub mod error;
pub mod http;
pub mod protocol;
pub mod queue;
pub mod telemetry;
