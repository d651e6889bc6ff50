//! Decoder for the textual progress output `flatpak install` writes to
//! stdout.
//!
//! Each chunk handed to [`InstallMonitor::feed`] is classified exactly once,
//! in fixed priority order: an `Installing: <ref> from <remote>` announcement
//! (observed, no event), a `[<bar>] <status>` progress line (decoded into a
//! [`ProgressEvent`]), or anything else (consumed and ignored). Decoding
//! failures are swallowed: the monitor sits inside a byte-copy loop and must
//! never abort it.

use once_cell::sync::Lazy;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static INSTALLING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Installing:\s+(\S+)\s+from").expect("Invalid regex pattern"));
static PROGRESS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(.*)\]\s+(.*)").expect("Invalid regex pattern"));
static SPEED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\((-?[\d.]+) (\w+)/s\)").expect("Invalid regex pattern"));

/// One decoded progress line. Ephemeral: handed to the callback and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Fill level of the progress bar, always within `[0, 1]`.
    pub fraction: f64,
    /// Trailing text after the bar, unstripped (the speed token stays in).
    pub status: String,
    /// Transfer speed in bytes per second; 0 when no speed token decoded.
    pub bytes_per_second: i64,
}

pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum DecodeError {
    #[error("unknown byte {0:?} in progress bar")]
    UnknownBarByte(u8),

    #[error("no speed token in status text")]
    SpeedNotFound,

    #[error("malformed speed magnitude")]
    BadMagnitude,

    #[error("negative speed magnitude")]
    NegativeSpeed,

    #[error("unknown speed unit {0:?}")]
    UnknownUnit(String),
}

/// Classification of one output chunk. Matchers are tried in declaration
/// order; the first hit wins and no later pattern is evaluated.
#[derive(Debug, PartialEq, Eq)]
enum Classified<'a> {
    Installing(&'a [u8]),
    Progress { bar: &'a [u8], status: &'a [u8] },
    Unrecognized,
}

fn classify(chunk: &[u8]) -> Classified<'_> {
    if let Some(caps) = INSTALLING_RE.captures(chunk) {
        if let Some(reference) = caps.get(1) {
            return Classified::Installing(reference.as_bytes());
        }
    }

    if let Some(caps) = PROGRESS_RE.captures(chunk) {
        if let (Some(bar), Some(status)) = (caps.get(1), caps.get(2)) {
            return Classified::Progress {
                bar: bar.as_bytes(),
                status: status.as_bytes(),
            };
        }
    }

    Classified::Unrecognized
}

/// Decode a bar body into a fill fraction. Each cell carries a weight of
/// thirds: `#` = 3, `=` = 2, `-` = 1, space = 0; the denominator is
/// 3 x bar length.
fn bar_fraction(bar: &[u8]) -> Result<f64, DecodeError> {
    if bar.is_empty() {
        return Ok(0.0);
    }

    let mut total: u64 = 0;
    for &byte in bar {
        total += match byte {
            b'#' => 3,
            b'=' => 2,
            b'-' => 1,
            b' ' => 0,
            other => return Err(DecodeError::UnknownBarByte(other)),
        };
    }
    Ok(total as f64 / (bar.len() as f64 * 3.0))
}

/// Decimal (base-1000) byte multiple for a speed unit symbol.
fn data_unit(unit: &str) -> Result<f64, DecodeError> {
    match unit {
        "bytes" => Ok(1.0),
        "kB" => Ok(1000.0),
        "MB" => Ok(1000.0 * 1000.0),
        "GB" => Ok(1000.0 * 1000.0 * 1000.0),
        "TB" => Ok(1000.0 * 1000.0 * 1000.0 * 1000.0),
        other => Err(DecodeError::UnknownUnit(other.to_string())),
    }
}

/// Extract a `(<number> <unit>/s)` token from status text and convert it to
/// whole bytes per second.
fn speed_bytes(status: &[u8]) -> Result<i64, DecodeError> {
    let caps = SPEED_RE.captures(status).ok_or(DecodeError::SpeedNotFound)?;

    let magnitude = caps
        .get(1)
        .and_then(|m| std::str::from_utf8(m.as_bytes()).ok())
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or(DecodeError::BadMagnitude)?;

    if magnitude < 0.0 {
        return Err(DecodeError::NegativeSpeed);
    }

    let unit = caps
        .get(2)
        .and_then(|m| std::str::from_utf8(m.as_bytes()).ok())
        .ok_or(DecodeError::BadMagnitude)?;

    Ok((magnitude * data_unit(unit)?) as i64)
}

/// Write-sink attached to the stdout of a running `flatpak install`,
/// translating recognized progress lines into callback invocations.
///
/// The callback runs synchronously inside [`feed`](Self::feed); a slow
/// callback backpressures the copy loop driving the monitor.
pub struct InstallMonitor {
    callback: ProgressCallback,
}

impl InstallMonitor {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Consume one output chunk. All bytes are always consumed; parse
    /// failures are dropped silently.
    pub fn feed(&self, chunk: &[u8]) {
        match classify(chunk) {
            Classified::Installing(reference) => {
                tracing::debug!("Installing {}", String::from_utf8_lossy(reference));
            }
            Classified::Progress { bar, status } => {
                let fraction = match bar_fraction(bar) {
                    Ok(fraction) => fraction,
                    Err(err) => {
                        tracing::trace!("Discarding progress line: {}", err);
                        return;
                    }
                };

                // A missing or malformed speed token must not suppress the
                // event, unlike a bad bar.
                let bytes_per_second = speed_bytes(status).unwrap_or(0);

                (self.callback)(ProgressEvent {
                    fraction,
                    status: String::from_utf8_lossy(status).into_owned(),
                    bytes_per_second,
                });
            }
            Classified::Unrecognized => {}
        }
    }
}
