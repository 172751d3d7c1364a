//! CSV ingress shim.
//!
//! Parses and validates raw transaction rows so the analysis core only
//! ever sees well-formed data. The first invalid row aborts the parse
//! with a row-numbered error; rows are never silently dropped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::Transaction;

/// Errors surfaced while reading a transaction batch.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read transaction file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV input: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("row {row}: invalid account id: {value:?}")]
    InvalidAccount { row: usize, value: String },

    #[error("row {row}: invalid amount: {value:?}")]
    InvalidAmount { row: usize, value: String },

    #[error("row {row}: invalid timestamp: {value:?}")]
    InvalidTimestamp { row: usize, value: String },
}

/// Read a transaction batch from a CSV file.
///
/// Expected header: `transaction_id,sender_id,receiver_id,amount,timestamp`
/// (column order is free, extra columns are ignored).
pub fn read_transactions_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>, IngestError> {
    let file = File::open(path)?;
    let transactions = parse_transactions_csv(file)?;
    tracing::info!(
        rows = transactions.len(),
        digest = %batch_digest(&transactions),
        "ingested transaction batch"
    );
    Ok(transactions)
}

/// Parse a transaction batch from any CSV reader.
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<Vec<Transaction>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| IngestError::MissingColumn(name.to_string()))
    };
    let id_col = column("transaction_id")?;
    let sender_col = column("sender_id")?;
    let receiver_col = column("receiver_id")?;
    let amount_col = column("amount")?;
    let timestamp_col = column("timestamp")?;

    let account_pattern = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();

    let mut transactions = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = record?;
        let row = i + 2; // 1-based, counting the header line

        let sender = record.get(sender_col).unwrap_or("");
        if !account_pattern.is_match(sender) {
            return Err(IngestError::InvalidAccount {
                row,
                value: sender.to_string(),
            });
        }
        let receiver = record.get(receiver_col).unwrap_or("");
        if !account_pattern.is_match(receiver) {
            return Err(IngestError::InvalidAccount {
                row,
                value: receiver.to_string(),
            });
        }

        let raw_amount = record.get(amount_col).unwrap_or("");
        let amount: f64 = raw_amount.parse().map_err(|_| IngestError::InvalidAmount {
            row,
            value: raw_amount.to_string(),
        })?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(IngestError::InvalidAmount {
                row,
                value: raw_amount.to_string(),
            });
        }

        let raw_timestamp = record.get(timestamp_col).unwrap_or("");
        let timestamp =
            parse_timestamp(raw_timestamp).ok_or_else(|| IngestError::InvalidTimestamp {
                row,
                value: raw_timestamp.to_string(),
            })?;

        let raw_id = record.get(id_col).unwrap_or("");
        let transaction_id = if raw_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            raw_id.to_string()
        };

        transactions.push(Transaction {
            transaction_id,
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            amount,
            timestamp,
        });
    }

    Ok(transactions)
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (taken as UTC), or epoch seconds.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(seconds) = value.parse::<i64>() {
        return Utc.timestamp_opt(seconds, 0).single();
    }
    None
}

/// SHA-256 fingerprint of a batch, for tying a report back to its input in
/// audit logs.
pub fn batch_digest(transactions: &[Transaction]) -> String {
    let mut hasher = Sha256::new();
    for tx in transactions {
        hasher.update(tx.transaction_id.as_bytes());
        hasher.update([0x1f]);
        hasher.update(tx.sender_id.as_bytes());
        hasher.update([0x1f]);
        hasher.update(tx.receiver_id.as_bytes());
        hasher.update([0x1f]);
        hasher.update(tx.amount.to_bits().to_be_bytes());
        hasher.update(tx.timestamp.timestamp_millis().to_be_bytes());
        hasher.update([0x0a]);
    }
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
