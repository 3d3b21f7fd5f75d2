//! Shared types, errors, and configuration for invoicegen.
//!
//! This crate provides common types used across all other crates:
//! - Row and cell types for semi-structured invoice rows
//! - Decimal amount and tax rate parsing (no floats)
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;


pub use config::AppConfig;
pub use error::{AppError, AppResult};
