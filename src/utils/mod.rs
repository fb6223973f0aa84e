//! Utility modules for common functionality.
//!
//! Currently only logging configuration lives here.

pub mod logger;
