//! Append-only log of raw submissions
//!
//! One record per line: `<RFC 3339 UTC timestamp>\t<submitted text>`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use cpath_common::{Error, Result};

/// One parsed log line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub data: String,
}

/// Append a raw submission to the log, creating the file if needed
pub async fn store_entry(path: &Path, data: &str) -> Result<()> {
    store_entry_at(path, data, Utc::now()).await
}

async fn store_entry_at(path: &Path, data: &str, at: DateTime<Utc>) -> Result<()> {
    if data.trim().is_empty() {
        return Err(Error::InvalidInput("empty submission".to_string()));
    }

    let line = format!(
        "{}\t{}\n",
        at.to_rfc3339_opts(SecondsFormat::Micros, true),
        single_line(data)
    );

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;

    debug!(bytes = line.len(), "Logged submission");
    Ok(())
}

/// Read every well-formed entry; a missing file reads as empty
pub async fn read_entries(path: &Path) -> Result<Vec<LogEntry>> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    // Decoded per line so one corrupt line cannot hide the rest
    let entries = content
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .enumerate()
        .filter(|(_, line)| !line.iter().all(u8::is_ascii_whitespace))
        .filter_map(|(index, line)| {
            let entry = std::str::from_utf8(line).ok().and_then(parse_line);
            if entry.is_none() {
                warn!(line = index + 1, "Skipping malformed submissions log line");
            }
            entry
        })
        .collect();

    Ok(entries)
}

/// Remove the log; returns whether a file was deleted
pub async fn delete_log(path: &Path) -> Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn parse_line(line: &str) -> Option<LogEntry> {
    let (timestamp, data) = line.split_once('\t')?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp).ok()?.with_timezone(&Utc);
    Some(LogEntry {
        timestamp,
        data: data.to_string(),
    })
}

fn single_line(data: &str) -> String {
    data.replace(['\r', '\n'], " ")
}
