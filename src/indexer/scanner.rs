use eyre::WrapErr;
use futures::stream::{self, Stream, TryStreamExt};

use super::chunker::RangeChunker;
use super::client::{LogFilter, NodeClient};
use super::types::{BlockRange, LogRecord};

/// Fatal scan failures. Attached as context to the underlying error so
/// callers can `downcast_ref::<ScanError>()` on the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("failed to read the node's current block height")]
    HeadUnavailable,
    #[error("log query failed for blocks {range}, resume from block {}", .range.start)]
    ChunkQuery { range: BlockRange },
}

/// Walks a block window chunk by chunk and yields every matching log.
pub struct LogScanner<'a, C: ?Sized> {
    client: &'a C,
    filter: LogFilter,
    max_width: u64,
}

impl<'a, C: NodeClient + ?Sized> LogScanner<'a, C> {
    pub fn new(client: &'a C, filter: LogFilter, max_width: u64) -> Self {
        Self {
            client,
            filter,
            max_width,
        }
    }

    pub fn chunks(&self, window: BlockRange) -> RangeChunker {
        RangeChunker::over(window, self.max_width)
    }

    /// Lazily query each chunk of `window` in order.
    ///
    /// A chunk is only requested once every record of the previous chunk has
    /// been consumed. The first failed query is yielded as an error carrying
    /// [`ScanError::ChunkQuery`] and ends the stream.
    pub fn scan(&self, window: BlockRange) -> impl Stream<Item = eyre::Result<LogRecord>> + 'a {
        let client = self.client;
        let filter = self.filter;

        stream::try_unfold(self.chunks(window), move |mut chunks| async move {
            let Some(range) = chunks.next() else {
                return Ok::<_, eyre::Report>(None);
            };

            tracing::debug!(from = range.start, to = range.end, "Querying log range");
            let logs = client
                .filtered_logs(&filter, range)
                .await
                .wrap_err(ScanError::ChunkQuery { range })?;
            tracing::debug!(
                from = range.start,
                to = range.end,
                logs = logs.len(),
                "Log range fetched"
            );

            Ok(Some((logs, chunks)))
        })
        .map_ok(|logs| stream::iter(logs.into_iter().map(Ok)))
        .try_flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::testing::{record_at, StubNodeClient};
    use alloy::primitives::{Address, B256};
    use futures::StreamExt;

    fn filter() -> LogFilter {
        LogFilter {
            address: Address::repeat_byte(0xaa),
            topic: B256::repeat_byte(0xbb),
        }
    }

    #[tokio::test]
    async fn test_scan_preserves_chunk_and_node_order() {
        let client = StubNodeClient::new(1_000)
            .with_logs(
                BlockRange { start: 0, end: 99 },
                vec![record_at(5, 0), record_at(5, 1), record_at(90, 0)],
            )
            .with_logs(
                BlockRange { start: 200, end: 250 },
                vec![record_at(250, 3), record_at(201, 0)],
            );

        let scanner = LogScanner::new(&client, filter(), 100);
        let window = BlockRange { start: 0, end: 250 };
        let records: Vec<LogRecord> = scanner.scan(window).try_collect().await.unwrap();

        let positions: Vec<(u64, u64)> = records
            .iter()
            .map(|r| (r.block_number, r.log_index))
            .collect();
        // within-chunk order is whatever the node returned
        assert_eq!(positions, vec![(5, 0), (5, 1), (90, 0), (250, 3), (201, 0)]);

        let expected: Vec<BlockRange> = RangeChunker::new(0, 250, 100).collect();
        assert_eq!(client.queried(), expected);
        assert_eq!(client.queried().len(), 3);
    }

    #[tokio::test]
    async fn test_scan_passes_filter_through() {
        let client = StubNodeClient::new(10);
        let scanner = LogScanner::new(&client, filter(), 100);
        let _: Vec<LogRecord> = scanner
            .scan(BlockRange { start: 0, end: 10 })
            .try_collect()
            .await
            .unwrap();
        assert_eq!(client.filters(), vec![filter()]);
    }

    #[tokio::test]
    async fn test_scan_is_lazy() {
        let client = StubNodeClient::new(1_000)
            .with_logs(BlockRange { start: 0, end: 9 }, vec![record_at(1, 0)]);
        let scanner = LogScanner::new(&client, filter(), 10);

        let stream = scanner.scan(BlockRange { start: 0, end: 99 });
        futures::pin_mut!(stream);
        assert!(client.queried().is_empty());

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.block_number, 1);
        assert_eq!(client.queried(), vec![BlockRange { start: 0, end: 9 }]);
    }

    #[tokio::test]
    async fn test_failed_chunk_stops_scan() {
        let failing = BlockRange { start: 100, end: 199 };
        let client = StubNodeClient::new(1_000)
            .with_logs(BlockRange { start: 0, end: 99 }, vec![record_at(3, 0)])
            .failing_on(failing);
        let scanner = LogScanner::new(&client, filter(), 100);

        let stream = scanner.scan(BlockRange { start: 0, end: 499 });
        futures::pin_mut!(stream);

        assert!(stream.next().await.unwrap().is_ok());
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ScanError>(),
            Some(&ScanError::ChunkQuery { range: failing })
        );
        assert!(stream.next().await.is_none());
        assert_eq!(
            client.queried(),
            vec![BlockRange { start: 0, end: 99 }, failing]
        );
    }

    #[tokio::test]
    async fn test_single_block_window_issues_one_query() {
        let client = StubNodeClient::new(0);
        let scanner = LogScanner::new(&client, filter(), 100);
        let records: Vec<LogRecord> = scanner
            .scan(BlockRange { start: 0, end: 0 })
            .try_collect()
            .await
            .unwrap();
        assert!(records.is_empty());
        assert_eq!(client.queried(), vec![BlockRange { start: 0, end: 0 }]);
    }
}
