//! Batch adjustment of invoice rows.
//!
//! Rows are independent, so the batch is processed in parallel. Each row
//! draws from its own generator seeded with `seed + index`, which keeps the
//! output identical for a given seed regardless of thread scheduling.

pub mod processor;
pub mod types;


pub use processor::{BatchProcessor, resolve_seed};
pub use types::{BatchReport, BatchSummary};
