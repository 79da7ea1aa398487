//! Semaphore configuration.
//!
//! `SemaphoreConfig` can be built in code or loaded from a YAML file. Unknown
//! YAML keys are ignored for forward compatibility, and every missing key falls
//! back to its default.

mod model;
mod operations;


pub use model::{
    DEFAULT_MAX_TAG_LENGTH, DEFAULT_RETRY_INTERVAL_MS, DEFAULT_STALE_TIMEOUT_MS, SemaphoreConfig,
};
