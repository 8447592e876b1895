//! Radio Link Abstraction
//!
//! The RF signal chain is an external collaborator: the pipeline hands it a
//! finished frame and asks it for a received one, nothing more. No RF
//! parameter (sample rate, symbol rate, gain) ever crosses this seam.
//!
//! Two implementations ship with the crate:
//!
//! - [`LoopbackLink`] — an in-memory TX→RX queue for testing and the
//!   simulated backend.
//! - [`FileLink`] — exchanges the wire artifact through a file, the way the
//!   original pipeline handed TMP files to the flow-graph scripts.

use std::collections::VecDeque;
use std::path::PathBuf;

use crate::error::{FrameError, FrameResult};
use crate::fileops;

/// Frame transport collaborator.
///
/// Implementations treat the frame as an opaque byte payload.
pub trait RadioLink {
    /// Human-readable link name for reports and logs.
    fn name(&self) -> &str;

    /// Hand a complete frame to the transport.
    fn transmit(&mut self, frame: &[u8]) -> FrameResult<()>;

    /// Fetch the next received frame.
    fn receive(&mut self) -> FrameResult<Vec<u8>>;
}

/// In-memory loopback: every transmitted frame is queued for reception in
/// FIFO order.
#[derive(Debug, Default)]
pub struct LoopbackLink {
    queue: VecDeque<Vec<u8>>,
}

impl LoopbackLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames waiting to be received.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl RadioLink for LoopbackLink {
    fn name(&self) -> &str {
        "loopback"
    }

    fn transmit(&mut self, frame: &[u8]) -> FrameResult<()> {
        self.queue.push_back(frame.to_vec());
        Ok(())
    }

    fn receive(&mut self) -> FrameResult<Vec<u8>> {
        self.queue
            .pop_front()
            .ok_or_else(|| FrameError::LinkEmpty("loopback".to_string()))
    }
}

/// File-based link: `transmit` writes the wire artifact, `receive` reads it.
///
/// A retried transmit overwrites the artifact rather than appending. Parent
/// directories are created as needed.
#[derive(Debug, Clone)]
pub struct FileLink {
    path: PathBuf,
    name: String,
}

impl FileLink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }

    /// The wire artifact location.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl RadioLink for FileLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn transmit(&mut self, frame: &[u8]) -> FrameResult<()> {
        fileops::write_output(&self.path, frame)
    }

    fn receive(&mut self) -> FrameResult<Vec<u8>> {
        fileops::read_input(&self.path)
    }
}
