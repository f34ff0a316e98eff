//! Asynchronous CSV reader with batch interface
//!
//! Provides batch reading over the rows of one input file for the concurrent
//! pipeline.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader<C> → Batches of C::Output
//!                  ↓
//!           csv_format module
//!           (row types, CsvRow::convert)
//! ```

use crate::io::csv_format::CsvRow;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use std::marker::PhantomData;
use tracing::warn;

/// Asynchronous CSV reader over rows of type `C`
pub struct AsyncReader<R: AsyncRead + Unpin, C: CsvRow> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
    rows: PhantomData<C>,
}

impl<R, C> AsyncReader<R, C>
where
    R: AsyncRead + Unpin + Send + 'static,
    C: CsvRow + 'static,
{
    /// Create a new AsyncReader from an async reader
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
            rows: PhantomData,
        }
    }

    /// Read a batch of converted rows
    ///
    /// Reads up to `batch_size` rows. Rows that fail to parse or convert are
    /// logged with their line number and skipped.
    ///
    /// # Returns
    ///
    /// The converted rows; empty once the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<C::Output> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<C>();

        while batch.len() < batch_size {
            let Some(row) = rows.next().await else {
                break;
            };
            self.line_num += 1;

            match row {
                Ok(row) => match row.convert() {
                    Ok(value) => batch.push(value),
                    Err(e) => warn!(line = self.line_num, "Skipping row: {}", e),
                },
                Err(e) => warn!(line = self.line_num, "CSV parse error: {}", e),
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv_format::{PaymentRow, ResultRow};
    use crate::types::{Attendance, FeeCommand};
    use futures::io::Cursor;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let csv_content = "record,amount,method,date,transaction_id,remarks\n\
                           1,100,Cash,2024-07-01,,\n\
                           1,50,Cheque,2024-07-02,,\n\
                           2,200,Online,2024-07-03,,\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::<_, PaymentRow>::new(reader);

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].record(), Some(1));
        assert_eq!(batch[1].record(), Some(1));

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].record(), Some(2));

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let reader = Cursor::new("record,amount,method,date,transaction_id,remarks\n".as_bytes());
        let mut async_reader = AsyncReader::<_, PaymentRow>::new(reader);

        assert!(async_reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_rows() {
        let csv_content = "record,amount,method,date,transaction_id,remarks\n\
                           1,-,Cash,2024-07-01,,\n\
                           x,10,Cash,2024-07-01,,\n\
                           2,75.5,Cash,2024-07-01,,\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::<_, PaymentRow>::new(reader);

        let batch = async_reader.read_batch(10).await;

        assert_eq!(batch.len(), 1);
        let FeeCommand::Pay(request) = &batch[0] else {
            panic!("expected a payment command");
        };
        assert_eq!(request.amount, Decimal::new(755, 1));
    }

    #[tokio::test]
    async fn test_async_reader_reads_results() {
        let csv_content = "student,exam,subject,credits,theory_obtained,theory_total,practical_obtained,practical_total,internal_obtained,internal_total,attendance\n\
                           S1,END,Maths,4,70,100,,,18,20,\n\
                           S2,END,Maths,4,,,,,,,absent\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::<_, ResultRow>::new(reader);

        let batch = async_reader.read_batch(10).await;

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].practical_marks, None);
        assert_eq!(batch[0].internal_marks.map(|m| m.total), Some(Decimal::from(20)));
        assert_eq!(batch[1].attendance, Attendance::Absent);
    }
}
