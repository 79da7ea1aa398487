//! Config loading, validation, and builder-style helpers.

use super::model::SemaphoreConfig;
use crate::error::{Result, SemaphoreError};
use std::path::Path;
use std::time::Duration;

impl SemaphoreConfig {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(SemaphoreConfig)` - Successfully loaded and validated config
    /// * `Err(SemaphoreError::InvalidConfig)` - Read, parse, or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            SemaphoreError::InvalidConfig(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as a map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: SemaphoreConfig = serde_yaml::from_str(yaml).map_err(|e| {
            SemaphoreError::InvalidConfig(format!("failed to parse config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            SemaphoreError::InvalidConfig(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values.
    ///
    /// - `retry_interval_ms` must be positive, or blocking acquisition would spin
    /// - `max_tag_length` must be positive
    pub fn validate(&self) -> Result<()> {
        if self.retry_interval_ms == 0 {
            return Err(SemaphoreError::InvalidConfig(
                "retry_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.max_tag_length == 0 {
            return Err(SemaphoreError::InvalidConfig(
                "max_tag_length must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Set or clear the staleness threshold.
    pub fn with_stale_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stale_timeout_ms = timeout.map(duration_to_ms);
        self
    }

    /// Set the poll interval.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval_ms = duration_to_ms(interval);
        self
    }

    /// Set or clear the blocking-acquire cap.
    pub fn with_acquire_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.acquire_timeout_ms = timeout.map(duration_to_ms);
        self
    }

    /// Set the tag length cap.
    pub fn with_max_tag_length(mut self, max: usize) -> Self {
        self.max_tag_length = max;
        self
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
