//! Exit code constants for the file-semaphore CLI.
//!
//! - 0: Success (lock acquired/released, or lock is free)
//! - 1: Lock contention (already held, timeout, not held, not owned)
//! - 2: Usage error (bad arguments, rejected path, bad config)
//! - 3: IO or parse error

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// The lock is held by someone else, the wait timed out, or there was nothing to release.
pub const LOCK_HELD: i32 = 1;

/// Invalid arguments, a rejected lock path, or an invalid configuration.
pub const USAGE_ERROR: i32 = 2;

/// Filesystem or lock-file parse failure.
pub const IO_ERROR: i32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, LOCK_HELD, USAGE_ERROR, IO_ERROR];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn exit_codes_match_documented_values() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(LOCK_HELD, 1);
        assert_eq!(USAGE_ERROR, 2);
        assert_eq!(IO_ERROR, 3);
    }
}
