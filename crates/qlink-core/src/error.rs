//! Error taxonomy for the framing pipeline.
//!
//! Every core operation fails fast and loud: there is no retry and no silent
//! recovery anywhere in the pipeline. The orchestrator wraps failures in a
//! [`FrameError::Stage`] so the caller learns which stage gave up.

use std::path::PathBuf;

/// Result alias used throughout the crate.
pub type FrameResult<T> = Result<T, FrameError>;

/// Errors raised by framing, integrity, encryption and pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A referenced input file does not exist. Non-recoverable: there is
    /// nothing to frame or de-frame.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// The detection marker (or prefix tag) is absent from a frame that was
    /// expected to contain one, under the strict marker policy.
    #[error("detection marker not found in frame")]
    MarkerNotFound,

    /// Integrity verification failed. Carries the trailer value read from the
    /// frame (`expected`) and the locally recomputed value (`computed`).
    #[error("checksum mismatch: expected 0x{expected:08X}, got 0x{computed:08X}")]
    ChecksumMismatch { expected: u32, computed: u32 },

    /// Decrypted padding is out of range or the ciphertext is malformed.
    /// Signals a corrupted envelope or the wrong key.
    #[error("invalid padding: {0}")]
    Padding(String),

    /// Input shorter than the minimum structurally required length
    /// (marker + trailer, or IV + one cipher block).
    #[error("frame too short: need at least {needed} bytes, got {got}")]
    UndersizedFrame { needed: usize, got: usize },

    /// A pipeline or framing configuration value is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A radio link was polled with no frame pending.
    #[error("link '{0}' has no pending frame")]
    LinkEmpty(String),

    /// A pipeline stage failed; carries the stage name and the original error.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<FrameError>,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Tag an error with the pipeline stage it occurred in. Already-tagged
    /// errors are left untouched so nested pipeline calls keep the innermost
    /// stage name.
    pub fn at_stage(self, stage: &'static str) -> Self {
        match self {
            FrameError::Stage { .. } => self,
            other => FrameError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }
}
