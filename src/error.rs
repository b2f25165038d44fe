//! Error types for the driver.
//!
//! Every failure the driver can surface maps onto one of these variants.
//! Init-step failures are caught by the lifecycle controller, logged, and
//! converted into a clean aborted-state return; they never leave partially
//! initialized state behind.

use thiserror::Error;

/// Errors that can occur while initializing or driving the synthesizer.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The SoundFont's declared format generation does not match the one
    /// this driver was built against.
    #[error("unsupported SoundFont format version {found} (expected {expected})")]
    VersionMismatch { expected: i32, found: i32 },

    /// An audio engine, output mix, or player object could not be created.
    #[error("audio resource creation failed: {0}")]
    ResourceCreation(String),

    /// The PCM staging buffer could not be sized from the library
    /// configuration.
    #[error("staging buffer allocation failed: {0}")]
    Allocation(String),

    /// `write`, `set_volume`, or `config` was called before a live
    /// session and stream existed.
    #[error("driver is not initialized")]
    NotInitialized,

    /// The real-time contract with the synthesis library or the audio
    /// queue was broken. Not recoverable.
    #[error("real-time contract violated: {0}")]
    Protocol(String),
}
