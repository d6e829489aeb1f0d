//! Asynchronous CSV reader with batch interface
//!
//! Provides batch reading over the operations in a submission file, used by
//! the concurrent strategy to feed the dispatcher.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Operations → Dispatcher
//!                  ↓
//!           csv_format module
//!           (OperationRow, convert_operation_row)
//! ```

use crate::io::csv_format::{convert_operation_row, OperationRow};
use crate::types::Operation;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous submission-file reader
///
/// Streams rows; memory use is bounded by the batch size.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 0,
        }
    }

    /// Read up to `batch_size` operations
    ///
    /// Malformed rows are logged with their line number and skipped; they do
    /// not count toward the batch size. Returns an empty vector at end of file.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Operation> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<OperationRow>();

        while batch.len() < batch_size {
            let Some(item) = rows.next().await else {
                break;
            };
            self.line_num += 1;
            let line = self.line_num + 1;

            match item {
                Ok(row) => match convert_operation_row(row) {
                    Ok(operation) => batch.push(operation),
                    Err(e) => warn!(line, error = %e, "Skipping malformed operation row"),
                },
                Err(e) => warn!(line, error = %e, "CSV parse error"),
            }
        }

        batch
    }
}
