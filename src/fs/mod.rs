//! Filesystem primitives for file-semaphore.
//!
//! Lock files are published with create-if-absent semantics via a temporary
//! file, so a reader never observes a partially written record.

pub(crate) mod atomic;
