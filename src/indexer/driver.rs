use eyre::WrapErr;
use futures::TryStreamExt;

use super::client::{LogFilter, NodeClient};
use super::decoder::{DecodeError, PayloadDecoder};
use super::envelope;
use super::scanner::{LogScanner, ScanError};
use super::types::{BlockRange, LogRecord, ScannedTransfer};

pub const DEFAULT_LOOKBACK: u64 = 2000;
pub const DEFAULT_CHUNK_SIZE: u64 = 100;

/// Everything a scan needs besides the node client and decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSettings {
    pub filter: LogFilter,
    /// Blocks behind the head where the window starts.
    pub lookback: u64,
    /// Maximum blocks per log query.
    pub chunk_size: u64,
}

impl ScanSettings {
    pub fn new(filter: LogFilter) -> Self {
        Self {
            filter,
            lookback: DEFAULT_LOOKBACK,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// `[head - lookback, head]`, clamped at genesis.
pub fn scan_window(head: u64, lookback: u64) -> BlockRange {
    BlockRange {
        start: head.saturating_sub(lookback),
        end: head,
    }
}

/// Counters for one completed scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub window: Option<BlockRange>,
    pub chunks: u64,
    pub records: u64,
    pub facts: u64,
    pub foreign_topic: u64,
    pub bad_envelope: u64,
    pub unknown_selector: u64,
    pub malformed_payload: u64,
}

impl ScanReport {
    pub fn skipped(&self) -> u64 {
        self.foreign_topic + self.bad_envelope + self.unknown_selector + self.malformed_payload
    }
}

/// One-shot historical scan: resolve the window from the node head, walk it
/// chunk by chunk, and hand every decoded transfer to `emit`.
pub struct ScanDriver<C> {
    client: C,
    decoder: PayloadDecoder,
    settings: ScanSettings,
}

impl<C: NodeClient> ScanDriver<C> {
    pub fn new(client: C, decoder: PayloadDecoder, settings: ScanSettings) -> Self {
        Self {
            client,
            decoder,
            settings,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run the scan to completion or to the first fatal error.
    ///
    /// Node failures carry a [`ScanError`] context. Errors returned by `emit`
    /// are fatal as well. Records that cannot be decoded are only counted.
    pub async fn run<F>(&self, emit: F) -> eyre::Result<ScanReport>
    where
        F: FnMut(ScannedTransfer) -> eyre::Result<()>,
    {
        match self.scan(emit).await {
            Ok(report) => {
                tracing::info!(
                    records = report.records,
                    facts = report.facts,
                    skipped = report.skipped(),
                    "Scan complete"
                );
                Ok(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Scan failed");
                Err(e)
            }
        }
    }

    async fn scan<F>(&self, mut emit: F) -> eyre::Result<ScanReport>
    where
        F: FnMut(ScannedTransfer) -> eyre::Result<()>,
    {
        let head = self
            .client
            .current_height()
            .await
            .wrap_err(ScanError::HeadUnavailable)?;
        let window = scan_window(head, self.settings.lookback);

        let scanner = LogScanner::new(&self.client, self.settings.filter, self.settings.chunk_size);
        let mut report = ScanReport {
            window: Some(window),
            chunks: scanner.chunks(window).count() as u64,
            ..ScanReport::default()
        };

        tracing::info!(
            head,
            from = window.start,
            to = window.end,
            chunks = report.chunks,
            contract = %self.settings.filter.address,
            "Scanning block window"
        );

        let records = scanner.scan(window);
        futures::pin_mut!(records);

        while let Some(record) = records.try_next().await? {
            report.records += 1;
            if let Some(transfer) = self.process_record(&record, &mut report) {
                emit(transfer)?;
                report.facts += 1;
            }
        }

        Ok(report)
    }

    /// Topic check, envelope unpack, payload decode. Every failure here is
    /// per-record and only bumps a counter.
    fn process_record(&self, record: &LogRecord, report: &mut ScanReport) -> Option<ScannedTransfer> {
        if record.leading_topic() != Some(&self.settings.filter.topic) {
            report.foreign_topic += 1;
            tracing::debug!(
                block = record.block_number,
                tx_hash = %record.tx_hash,
                "Skipping log with unexpected topic"
            );
            return None;
        }

        let envelope = match envelope::unpack(record) {
            Ok(envelope) => envelope,
            Err(e) => {
                report.bad_envelope += 1;
                tracing::warn!(
                    block = record.block_number,
                    tx_hash = %record.tx_hash,
                    error = %e,
                    "Failed to unpack event envelope, skipping"
                );
                return None;
            }
        };

        match self.decoder.try_decode(&envelope.payload) {
            Ok(fact) => Some(ScannedTransfer::join(record, envelope.nonce, fact)),
            Err(e @ DecodeError::UnknownSelector(_)) => {
                report.unknown_selector += 1;
                tracing::debug!(
                    block = record.block_number,
                    tx_hash = %record.tx_hash,
                    error = %e,
                    "Skipping payload with unregistered selector"
                );
                None
            }
            Err(e) => {
                report.malformed_payload += 1;
                tracing::warn!(
                    block = record.block_number,
                    tx_hash = %record.tx_hash,
                    error = %e,
                    "Skipping malformed transfer payload"
                );
                None
            }
        }
    }
}
