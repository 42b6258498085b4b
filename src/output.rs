use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::indexer::types::ScannedTransfer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `<asset> <sender> <receiver> <amount> <tx>` per line.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
    Csv,
}

/// Flat, string-typed view of a transfer for structured output.
#[derive(Debug, Serialize)]
pub struct TransferRow {
    pub asset: String,
    pub sender: String,
    pub receiver: String,
    pub amount: String,
    pub tx_hash: String,
    pub kind: &'static str,
    pub raw_amount: String,
    pub block_number: u64,
    pub log_index: u64,
    pub nonce: Option<String>,
}

impl From<&ScannedTransfer> for TransferRow {
    fn from(t: &ScannedTransfer) -> Self {
        Self {
            asset: t.fact.asset.to_string(),
            sender: t.fact.from.to_string(),
            receiver: t.fact.to.to_string(),
            amount: t.fact.amount.to_plain_string(),
            tx_hash: t.tx_hash.to_string(),
            kind: t.fact.kind.as_str(),
            raw_amount: t.fact.raw_amount.to_string(),
            block_number: t.block_number,
            log_index: t.log_index,
            nonce: t.nonce.map(|n| n.to_string()),
        }
    }
}

/// Writes transfers to `W` in the configured format.
pub enum TransferWriter<W: Write> {
    Text(W),
    Json(W),
    Csv(csv::Writer<W>),
}

impl<W: Write> TransferWriter<W> {
    pub fn new(format: OutputFormat, writer: W) -> Self {
        match format {
            OutputFormat::Text => TransferWriter::Text(writer),
            OutputFormat::Json => TransferWriter::Json(writer),
            OutputFormat::Csv => TransferWriter::Csv(csv::Writer::from_writer(writer)),
        }
    }

    pub fn write(&mut self, transfer: &ScannedTransfer) -> eyre::Result<()> {
        match self {
            TransferWriter::Text(w) => writeln!(w, "{transfer}")?,
            TransferWriter::Json(w) => {
                serde_json::to_writer(&mut *w, &TransferRow::from(transfer))?;
                writeln!(w)?;
            }
            TransferWriter::Csv(w) => w.serialize(TransferRow::from(transfer))?,
        }
        Ok(())
    }

    pub fn finish(self) -> eyre::Result<()> {
        match self {
            TransferWriter::Text(mut w) | TransferWriter::Json(mut w) => w.flush()?,
            TransferWriter::Csv(mut w) => w.flush()?,
        }
        Ok(())
    }
}
