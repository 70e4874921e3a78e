//! Core types shared across the ormrt runtime facilities
//!
//! This crate provides the small vocabulary used by both the error facility
//! and the logging facility:
//!
//! - **Correlation types**: BatchId
//! - **Schema constants**: Canonical log field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::BatchId;
