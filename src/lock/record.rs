//! Lock record codec.
//!
//! The on-disk format is a plain-text block of `key=value` lines:
//!
//! ```text
//! pid=12345
//! timestamp=1700000000
//! tag=nightly build
//! ```
//!
//! Readers ignore unknown keys so newer writers can add fields. Writers sanitize
//! the tag so that every output contains exactly one line per known key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const KEY_PID: &str = "pid";
const KEY_TIMESTAMP: &str = "timestamp";
const KEY_TAG: &str = "tag";

/// Why a lock file could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required key never appeared.
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// A required key appeared but its value is not a non-negative integer.
    #[error("invalid value for field '{field}': '{value}'")]
    InvalidField { field: &'static str, value: String },
}

impl ParseError {
    /// Name of the field that failed.
    pub fn field(&self) -> &'static str {
        match self {
            ParseError::MissingField(field) => field,
            ParseError::InvalidField { field, .. } => field,
        }
    }
}

/// Logical content of a lock file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Process ID of the holder.
    pub pid: u32,

    /// Unix seconds at acquisition time.
    pub timestamp: u64,

    /// Optional caller-supplied description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl LockRecord {
    pub fn new(pid: u32, timestamp: u64, tag: Option<String>) -> Self {
        Self {
            pid,
            timestamp,
            tag,
        }
    }

    /// Serialize to lock-file content.
    ///
    /// The tag is passed through [`sanitize_tag`] first, so control characters
    /// become spaces and the tag is cut to `max_tag_length` characters.
    pub fn serialize(&self, max_tag_length: usize) -> String {
        let mut content = format!(
            "{KEY_PID}={}\n{KEY_TIMESTAMP}={}\n",
            self.pid, self.timestamp
        );
        if let Some(tag) = &self.tag {
            content.push_str(KEY_TAG);
            content.push('=');
            content.push_str(&sanitize_tag(tag, max_tag_length));
            content.push('\n');
        }
        content
    }

    /// Parse lock-file content.
    ///
    /// Fails unless both `pid` and `timestamp` are present and numeric. When a
    /// key repeats, the last occurrence wins.
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let mut pid: Option<&str> = None;
        let mut timestamp: Option<&str> = None;
        let mut tag: Option<&str> = None;

        for line in content.split('\n') {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            match key {
                KEY_PID => pid = Some(value),
                KEY_TIMESTAMP => timestamp = Some(value),
                KEY_TAG => tag = Some(value),
                _ => {} // Forward compatibility
            }
        }

        let pid = parse_field(KEY_PID, pid)?;
        let timestamp = parse_field(KEY_TIMESTAMP, timestamp)?;

        Ok(Self {
            pid,
            timestamp,
            tag: tag.map(str::to_string),
        })
    }

    /// Seconds elapsed since acquisition, or `None` if the timestamp lies in the future.
    pub fn age_at(&self, now_seconds: u64) -> Option<u64> {
        now_seconds.checked_sub(self.timestamp)
    }

    /// Whether the record is older than `timeout_ms` at `now_seconds`.
    ///
    /// A future timestamp (clock skew) is never stale.
    pub fn is_stale_at(&self, timeout_ms: u64, now_seconds: u64) -> bool {
        match self.age_at(now_seconds) {
            Some(age) => u128::from(age) * 1000 > u128::from(timeout_ms),
            None => false,
        }
    }

    /// Acquisition time as a UTC datetime, if representable.
    pub fn acquired_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self, now_seconds: u64) -> String {
        let Some(age) = self.age_at(now_seconds) else {
            return "in the future".to_string();
        };
        let minutes = age / 60;
        let hours = age / 3600;
        let days = age / 86_400;

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m", minutes)
        } else {
            format!("{}s", age)
        }
    }
}

fn parse_field<T: std::str::FromStr>(
    field: &'static str,
    raw: Option<&str>,
) -> Result<T, ParseError> {
    let raw = raw.ok_or(ParseError::MissingField(field))?;
    let invalid = || ParseError::InvalidField {
        field,
        value: raw.to_string(),
    };

    // `FromStr` for integers also takes a leading '+'
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    raw.parse().map_err(|_| invalid())
}

/// Make a tag safe to persist.
///
/// Every ASCII control character (C0 and DEL, which includes `\n` and `\r`) is
/// replaced by a single space, then the result is cut to `max_length` characters.
pub fn sanitize_tag(tag: &str, max_length: usize) -> String {
    tag.chars()
        .map(|c| if c.is_ascii_control() { ' ' } else { c })
        .take(max_length)
        .collect()
}
