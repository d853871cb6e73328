//! # Spillwatch Common Library
//!
//! Shared code for the Spillwatch services including:
//! - AIS data model (subscription requests, position reports)
//! - Upstream feed wire format (aisstream.io subscribe/envelope shapes)
//! - Position reduction (latest-per-vessel deduplication)
//! - Configuration loading
//! - Error types

pub mod ais;
pub mod config;
pub mod error;
pub mod reduce;
pub mod time;

pub use error::{Error, Result};
