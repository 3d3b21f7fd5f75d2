//! Common types used across the application.

pub mod amount;
pub mod rate;
pub mod row;

pub use amount::{AmountParseError, is_blank, parse_amount, parse_number};
pub use rate::{RateParseError, TaxRate};
pub use row::{CellValue, Row, RowPatch};
