//! Human-readable byte sizes ("500MB", "5GB").

use serde::{Deserialize, Deserializer};

use crate::error::GuardError;

/// Parse a size string (e.g. "10GB", "500MB", "1024") to bytes.
///
/// Units are binary (1 KB = 1024 bytes). A bare number is taken as bytes.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn parse_size(s: &str) -> Result<u64, GuardError> {
    let s = s.trim().to_uppercase();
    if s.is_empty() {
        return Err(GuardError::validation("empty size"));
    }

    let (num, unit) = if let Some(n) = s.strip_suffix("TB") {
        (n, 1u64 << 40)
    } else if let Some(n) = s.strip_suffix("GB") {
        (n, 1u64 << 30)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1u64 << 20)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1u64 << 10)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s.as_str(), 1)
    };

    let value: f64 = num
        .trim()
        .parse()
        .map_err(|_| GuardError::validation(format!("invalid size: {s}")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(GuardError::validation(format!("invalid size: {s}")));
    }
    Ok((value * unit as f64) as u64)
}

/// Format bytes to human readable string.
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Serde helper accepting either an integer byte count or a size string.
pub fn deserialize_size<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bytes(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Bytes(n) => Ok(n),
        Raw::Text(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}
