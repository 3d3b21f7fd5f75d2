//! Core value-adjustment logic for invoicegen.
//!
//! This crate contains pure business logic with ZERO file or spreadsheet
//! dependencies. Rows come in as [`invoicegen_shared::types::Row`] values
//! and go out as new rows.
//!
//! # Modules
//!
//! - `adjust` - Rate classification, integral-tax search and the row adjuster
//! - `batch` - Deterministic parallel processing of many rows

pub mod adjust;
pub mod batch;
