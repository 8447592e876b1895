//! Pipeline Orchestrator
//!
//! Composes the encryption envelope, preamble codec and integrity envelope in
//! the fixed order each direction requires:
//!
//! ```text
//! TX: Idle → Encrypted? → Framed → Checksummed → Done
//! RX: Idle → DeChecksummed → DeFramed → Decrypted? → Done
//! ```
//!
//! Only the encryption stage is skippable (via
//! `PipelineConfig::encryption_enabled`); framing and checksum are mandatory.
//! With [`ChecksumScope::PayloadOnly`] the trailer is appended before framing
//! and stripped after de-framing, so the checksummed byte range stays
//! identical on both sides either way.
//!
//! Every stage either fully produces the next stage's input or fails with a
//! stage-tagged error and the pipeline halts; nothing half-transformed is
//! handed onward, and file outputs are only written after all stages
//! succeeded. Each stage also yields a human-readable [`StageReport`].
//!
//! ## Example
//!
//! ```rust
//! use qlink_core::config::PipelineConfig;
//! use qlink_core::link::{LoopbackLink, RadioLink};
//! use qlink_core::pipeline::{RxPipeline, TxPipeline};
//!
//! let config = PipelineConfig::simulated();
//! let tx = TxPipeline::new(config.clone()).unwrap();
//! let rx = RxPipeline::new(config).unwrap();
//!
//! let mut link = LoopbackLink::new();
//! tx.transmit(b"HELLO", &mut link).unwrap();
//! let outcome = rx.receive(&mut link).unwrap();
//! assert_eq!(outcome.payload, b"HELLO");
//! ```

use std::fmt;
use std::path::Path;

use tracing::info;

use crate::config::PipelineConfig;
use crate::crypto;
use crate::error::{FrameError, FrameResult};
use crate::fileops;
use crate::integrity::{ChecksumScope, IntegrityEnvelope, TRAILER_LEN};
use crate::link::RadioLink;
use crate::preamble::PreambleCodec;

/// Outcome of one stage, for observability.
#[derive(Debug, Clone)]
pub struct StageReport {
    /// Stage name (`encrypt`, `frame`, `checksum`, …).
    pub stage: &'static str,
    /// Human-readable detail: byte counts, checksum value, key/IV sizes.
    pub detail: String,
}

impl StageReport {
    fn new(stage: &'static str, detail: String) -> Self {
        info!(stage, "{detail}");
        Self { stage, detail }
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.stage, self.detail)
    }
}

/// A finished transmit frame plus the per-stage reports.
#[derive(Debug, Clone)]
pub struct TxFrame {
    pub frame: Vec<u8>,
    pub reports: Vec<StageReport>,
}

/// A recovered payload plus the per-stage reports.
#[derive(Debug, Clone)]
pub struct RxOutcome {
    pub payload: Vec<u8>,
    pub reports: Vec<StageReport>,
}

fn stage<T>(name: &'static str, result: FrameResult<T>) -> FrameResult<T> {
    result.map_err(|e| e.at_stage(name))
}

/// Transmit-side orchestrator: payload in, wire frame out.
#[derive(Debug, Clone)]
pub struct TxPipeline {
    config: PipelineConfig,
    codec: PreambleCodec,
    integrity: IntegrityEnvelope,
}

impl TxPipeline {
    /// Build a transmit pipeline from a validated configuration.
    pub fn new(config: PipelineConfig) -> FrameResult<Self> {
        config.validate()?;
        let codec = PreambleCodec::new(config.framing.clone())?;
        let integrity = integrity_for(&config);
        Ok(Self {
            config,
            codec,
            integrity,
        })
    }

    /// Run the TX stages over a payload and return the finished frame.
    ///
    /// When encryption is enabled the freshly generated key is written to the
    /// configured key path as part of the encrypt stage (write-once per
    /// session).
    pub fn process(&self, payload: &[u8]) -> FrameResult<TxFrame> {
        let mut reports = Vec::new();

        let body = if self.config.encryption_enabled {
            let key_path = self.config.key_path.as_deref().ok_or_else(|| {
                FrameError::InvalidConfig("encryption enabled without key_path".to_string())
            })?;
            let key = crypto::generate_key();
            let envelope = crypto::encrypt(payload, &key);
            stage("encrypt", fileops::write_output(key_path, &key))?;
            reports.push(StageReport::new(
                "encrypt",
                format!(
                    "{} plaintext bytes -> {} byte envelope ({}-byte IV); {}-byte key saved to {}",
                    payload.len(),
                    envelope.len(),
                    crypto::IV_LEN,
                    crypto::KEY_LEN,
                    key_path.display()
                ),
            ));
            envelope
        } else {
            payload.to_vec()
        };

        let frame = match self.config.checksum_scope {
            ChecksumScope::FullFrame => {
                let framed = self.codec.wrap(&body);
                reports.push(StageReport::new(
                    "frame",
                    format!("{} -> {} bytes (framing added)", body.len(), framed.len()),
                ));
                let crc = self.integrity.checksum(&framed);
                let out = self.integrity.append(&framed);
                reports.push(StageReport::new(
                    "checksum",
                    format!("CRC32 appended=0x{:08X}, frame {} bytes", crc, out.len()),
                ));
                out
            }
            ChecksumScope::PayloadOnly => {
                let crc = self.integrity.checksum(&body);
                let checked = self.integrity.append(&body);
                reports.push(StageReport::new(
                    "checksum",
                    format!("CRC32 appended=0x{:08X}, body {} bytes", crc, checked.len()),
                ));
                let out = self.codec.wrap(&checked);
                reports.push(StageReport::new(
                    "frame",
                    format!("{} -> {} bytes (framing added)", checked.len(), out.len()),
                ));
                out
            }
        };

        Ok(TxFrame { frame, reports })
    }

    /// Process a payload and hand the frame to the link.
    pub fn transmit(&self, payload: &[u8], link: &mut dyn RadioLink) -> FrameResult<TxFrame> {
        let mut tx = self.process(payload)?;
        stage("transmit", link.transmit(&tx.frame))?;
        tx.reports.push(StageReport::new(
            "transmit",
            format!("{} bytes handed to link '{}'", tx.frame.len(), link.name()),
        ));
        Ok(tx)
    }

    /// Read a payload file and transmit it.
    pub fn transmit_file(&self, input: &Path, link: &mut dyn RadioLink) -> FrameResult<TxFrame> {
        let payload = stage("read", fileops::read_input(input))?;
        self.transmit(&payload, link)
    }
}

/// Receive-side orchestrator: wire frame in, payload out.
#[derive(Debug, Clone)]
pub struct RxPipeline {
    config: PipelineConfig,
    codec: PreambleCodec,
    integrity: IntegrityEnvelope,
}

impl RxPipeline {
    /// Build a receive pipeline from a validated configuration. Must use the
    /// same configuration value as the TX side of the session.
    pub fn new(config: PipelineConfig) -> FrameResult<Self> {
        config.validate()?;
        let codec = PreambleCodec::new(config.framing.clone())?;
        let integrity = integrity_for(&config);
        Ok(Self {
            config,
            codec,
            integrity,
        })
    }

    /// Run the RX stages over a received frame and recover the payload.
    pub fn process(&self, frame: &[u8]) -> FrameResult<RxOutcome> {
        let mut reports = Vec::new();

        let body = match self.config.checksum_scope {
            ChecksumScope::FullFrame => {
                let body = stage("checksum", self.integrity.verify_and_strip(frame))?;
                reports.push(StageReport::new(
                    "checksum",
                    format!("CRC OK=0x{:08X}, body {} bytes", trailer_value(frame), body.len()),
                ));
                let payload = stage("deframe", self.codec.unwrap(&body))?;
                reports.push(StageReport::new(
                    "deframe",
                    format!("{} -> {} bytes (framing removed)", body.len(), payload.len()),
                ));
                payload
            }
            ChecksumScope::PayloadOnly => {
                let inner = stage("deframe", self.codec.unwrap(frame))?;
                reports.push(StageReport::new(
                    "deframe",
                    format!("{} -> {} bytes (framing removed)", frame.len(), inner.len()),
                ));
                let payload = stage("checksum", self.integrity.verify_and_strip(&inner))?;
                reports.push(StageReport::new(
                    "checksum",
                    format!("CRC OK=0x{:08X}, body {} bytes", trailer_value(&inner), payload.len()),
                ));
                payload
            }
        };

        let payload = if self.config.encryption_enabled {
            let key_path = self.config.key_path.as_deref().ok_or_else(|| {
                FrameError::InvalidConfig("encryption enabled without key_path".to_string())
            })?;
            let key_bytes = stage("decrypt", fileops::read_input(key_path))?;
            let key = stage("decrypt", crypto::key_from_slice(&key_bytes))?;
            let plaintext = stage("decrypt", crypto::decrypt(&body, &key))?;
            reports.push(StageReport::new(
                "decrypt",
                format!(
                    "{} byte envelope -> {} plaintext bytes (key from {})",
                    body.len(),
                    plaintext.len(),
                    key_path.display()
                ),
            ));
            plaintext
        } else {
            body
        };

        Ok(RxOutcome { payload, reports })
    }

    /// Fetch a frame from the link and recover the payload.
    pub fn receive(&self, link: &mut dyn RadioLink) -> FrameResult<RxOutcome> {
        let frame = stage("receive", link.receive())?;
        let mut outcome = self.process(&frame)?;
        outcome.reports.insert(
            0,
            StageReport::new(
                "receive",
                format!("{} bytes fetched from link '{}'", frame.len(), link.name()),
            ),
        );
        Ok(outcome)
    }

    /// Receive and write the recovered payload to `output`. The file is only
    /// written after every stage has succeeded.
    pub fn receive_to_file(
        &self,
        link: &mut dyn RadioLink,
        output: &Path,
    ) -> FrameResult<RxOutcome> {
        let mut outcome = self.receive(link)?;
        stage("write", fileops::write_output(output, &outcome.payload))?;
        outcome.reports.push(StageReport::new(
            "write",
            format!("{} bytes written to {}", outcome.payload.len(), output.display()),
        ));
        Ok(outcome)
    }
}

/// The integrity envelope both sides use, with the structural minimum derived
/// from the shared configuration. Single source of truth for the checksummed
/// byte range.
fn integrity_for(config: &PipelineConfig) -> IntegrityEnvelope {
    match config.checksum_scope {
        ChecksumScope::FullFrame => IntegrityEnvelope::with_min_body(config.framing.marker_len()),
        ChecksumScope::PayloadOnly => IntegrityEnvelope::new(),
    }
}

/// Big-endian trailer value of a frame whose verification already succeeded.
fn trailer_value(frame: &[u8]) -> u32 {
    let t = &frame[frame.len() - TRAILER_LEN..];
    u32::from_be_bytes([t[0], t[1], t[2], t[3]])
}
