//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over the rows of one input file, converted to
//! domain values through the row type's [`CsvRow`] implementation.
//!
//! # Iterator Interface
//!
//! `SyncReader<C>` yields `Result<C::Output, ErpError>` for each CSV row:
//!
//! ```no_run
//! use campus_ledger::io::csv_format::PaymentRow;
//! use campus_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::<PaymentRow>::new(Path::new("payments.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(command) => println!("Processing: {:?}", command),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as `ErpError::ParseError` carrying the
//!   line number
//!
//! # Memory Efficiency
//!
//! Rows are read one at a time; memory use does not grow with the file.

use crate::io::csv_format::CsvRow;
use crate::types::ErpError;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::Path;

/// Open an input file, mapping a missing file to `FileNotFound`
pub fn open_input(path: &Path) -> Result<File, ErpError> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ErpError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => ErpError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        },
    })
}

/// Synchronous CSV reader over rows of type `C`
#[derive(Debug)]
pub struct SyncReader<C: CsvRow> {
    reader: csv::Reader<File>,
    line_num: u64,
    rows: PhantomData<C>,
}

impl<C: CsvRow> SyncReader<C> {
    /// Create a new SyncReader from a file path
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Allow flexible field counts (trailing optional columns may be omitted)
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Errors
    ///
    /// * `FileNotFound` if the path does not exist
    /// * `IoError` if the file could not be opened
    pub fn new(path: &Path) -> Result<Self, ErpError> {
        let file = open_input(path)?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
            rows: PhantomData,
        })
    }
}

impl<C: CsvRow> Iterator for SyncReader<C> {
    type Item = Result<C::Output, ErpError>;

    /// Read, deserialize and convert the next row
    ///
    /// # Returns
    ///
    /// * `Some(Ok(value))` - Successfully converted row
    /// * `Some(Err(ErpError::ParseError))` - Parse or conversion error with line number
    /// * `None` - End of file reached
    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<C>();
        let row = deserializer.next()?;
        self.line_num += 1;
        let line = self.line_num;

        Some(
            row.map_err(ErpError::from)
                .and_then(|row| row.convert())
                .map_err(|e| match e {
                    ErpError::ParseError { message, .. } => ErpError::ParseError {
                        line: Some(line),
                        message,
                    },
                    other => ErpError::ParseError {
                        line: Some(line),
                        message: other.to_string(),
                    },
                }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv_format::{BookRow, PaymentRow};
    use crate::types::{FeeCommand, PaymentMethod};
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_new_fails_on_missing_file() {
        let result = SyncReader::<PaymentRow>::new(Path::new("/nonexistent/payments.csv"));

        assert!(matches!(result, Err(ErpError::FileNotFound { .. })));
    }

    #[test]
    fn test_sync_reader_iterates_payments() {
        let file = create_temp_csv(
            "record,amount,method,date,transaction_id,remarks\n\
             1,1500,Cash,2024-07-01,,\n\
             2, 250.75 ,Online,2024-07-02T09:00:00Z,TXN-9,hostel\n",
        );

        let commands: Vec<_> = SyncReader::<PaymentRow>::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(commands.len(), 2);
        let FeeCommand::Pay(second) = &commands[1] else {
            panic!("expected a payment command");
        };
        assert_eq!(second.record, 2);
        assert_eq!(second.amount, Decimal::new(25075, 2));
        assert_eq!(second.payment_method, PaymentMethod::Online);
        assert_eq!(second.transaction_id.as_deref(), Some("TXN-9"));
    }

    #[test]
    fn test_sync_reader_allows_omitted_trailing_columns() {
        let file = create_temp_csv("record,amount,method,date,transaction_id,remarks\n1,100,Cash,2024-07-01\n");

        let results: Vec<_> = SyncReader::<PaymentRow>::new(file.path()).unwrap().collect();

        assert_eq!(results.len(), 1);
        assert!(results[0].is_ok());
    }

    #[test]
    fn test_sync_reader_includes_line_numbers_in_errors() {
        let file = create_temp_csv(
            "record,amount,method,date,transaction_id,remarks\n\
             1,100,Cash,2024-07-01,,\n\
             2,abc,Cash,2024-07-01,,\n",
        );

        let results: Vec<_> = SyncReader::<PaymentRow>::new(file.path()).unwrap().collect();

        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(ErpError::ParseError { line: Some(3), .. })
        ));
    }

    #[test]
    fn test_sync_reader_continues_after_error() {
        let file = create_temp_csv("book,title,copies\nB1,Algorithms,two\nB2,Databases,3\n");

        let books: Vec<_> = SyncReader::<BookRow>::new(file.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "B2");
        assert_eq!(books[0].available_copies, 3);
    }

    #[test]
    fn test_sync_reader_handles_empty_file_after_header() {
        let file = create_temp_csv("book,title,copies\n");

        let mut reader = SyncReader::<BookRow>::new(file.path()).unwrap();

        assert!(reader.next().is_none());
    }
}
