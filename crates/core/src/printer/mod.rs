//! Printer client abstraction.
//!
//! This module provides a `PrinterClient` trait for polling printer status and
//! starting prints, with a PrusaLink implementation using HTTP digest auth.

pub mod digest;
mod prusalink;
mod types;

pub use prusalink::PrusaLinkClient;
pub use types::*;
