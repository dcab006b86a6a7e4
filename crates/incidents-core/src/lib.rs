//! Core types and trait definitions for the incident registry.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod error;
pub mod ids;
pub mod incident;
pub mod person;
pub mod stats;
pub mod store;
pub mod user;
pub mod validate;

pub use error::{AsDomain, Error, Result};
