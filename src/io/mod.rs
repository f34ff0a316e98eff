//! I/O module
//!
//! Handles CSV parsing and report output.
//!
//! # Components
//!
//! - `csv_format` - Row types, row conversion and report serialization
//! - `sync_reader` - Synchronous CSV reader with iterator interface
//! - `async_reader` - Asynchronous CSV reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    parse_timestamp, write_issues_csv, write_ledger_csv, write_results_csv, BookRow, CsvRow,
    FeeRecordRow, LibraryEventRow, PaymentRow, ResultRow,
};
pub use sync_reader::{open_input, SyncReader};
