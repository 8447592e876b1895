//! # qlink-core
//!
//! Framing, integrity and encryption pipeline for a simulated wireless
//! transceiver. The crate turns an arbitrary payload into a
//! self-delimiting, integrity-protected (and optionally encrypted) byte
//! frame, and recovers the payload on the other side:
//!
//! ```text
//! TX:  payload ──► [encrypt?] ──► [frame] ──► [checksum] ──► wire frame
//!                                                                │
//!                                                          RadioLink
//!                                                                │
//! RX:  payload ◄── [decrypt?] ◄── [deframe] ◄── [verify] ◄── wire frame
//! ```
//!
//! The byte-level building blocks live in their own modules and are usable
//! standalone:
//!
//! - [`crc`] — table-driven CRC-32 (IEEE 802.3), incremental or one-shot.
//! - [`preamble`] — frame delimiting: bracketed preamble + marker runs, or a
//!   compact prefix tag for local simulation.
//! - [`integrity`] — the 4-byte big-endian CRC trailer.
//! - [`crypto`] — AES-128-CBC envelope with a random IV per encryption.
//! - [`fileops`] — path-based counterparts of each transform.
//!
//! [`pipeline`] composes them in the fixed stage order, [`config`] supplies
//! the shared TX/RX settings and [`link`] is the seam to the transport.
//!
//! ## Quick Start
//!
//! ```rust
//! use qlink_core::{LoopbackLink, PipelineConfig, RxPipeline, TxPipeline};
//!
//! let config = PipelineConfig::simulated();
//! let tx = TxPipeline::new(config.clone())?;
//! let rx = RxPipeline::new(config)?;
//!
//! let mut link = LoopbackLink::new();
//! tx.transmit(b"HELLO", &mut link)?;
//! assert_eq!(rx.receive(&mut link)?.payload, b"HELLO");
//! # Ok::<(), qlink_core::FrameError>(())
//! ```

pub mod config;
pub mod crc;
pub mod crypto;
pub mod error;
pub mod fileops;
pub mod integrity;
pub mod link;
pub mod pipeline;
pub mod preamble;

pub use config::{Backend, PipelineConfig};
pub use crc::Crc32;
pub use error::{FrameError, FrameResult};
pub use integrity::{ChecksumScope, IntegrityEnvelope};
pub use link::{FileLink, LoopbackLink, RadioLink};
pub use pipeline::{RxOutcome, RxPipeline, StageReport, TxFrame, TxPipeline};
pub use preamble::{FrameLayout, FramingConfig, MarkerPolicy, PreambleCodec};
