//! Preamble Codec — synchronization bracketing for file-based frames
//!
//! Wraps a payload with the synchronization lead-in/out expected by the
//! receive chain and locates/strips it again on the way back. Two layouts
//! are supported:
//!
//! ```text
//! Bracketed (over-the-air):
//! ┌──────────┬────────┬─────────┬────────┬──────────┐
//! │ Preamble │ Marker │ Payload │ Marker │ Preamble │
//! │ 0xAA run │ 0x33×5 │         │ 0x33×5 │ 0xAA run │
//! └──────────┴────────┴─────────┴────────┴──────────┘
//!
//! Prefix (simulated / local loopback):
//! ┌──────────────────┬─────────┐
//! │ Tag              │ Payload │
//! └──────────────────┴─────────┘
//! ```
//!
//! The preamble run carries no payload information; it exists so the
//! receiver's timing recovery has something to settle on. The markers are the
//! exact-match anchors used to find the payload boundaries.
//!
//! ## Example
//!
//! ```rust
//! use qlink_core::preamble::{FramingConfig, PreambleCodec};
//!
//! let codec = PreambleCodec::new(FramingConfig::simulated()).unwrap();
//! let frame = codec.wrap(b"hello");
//! assert_eq!(codec.unwrap(&frame).unwrap(), b"hello");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{FrameError, FrameResult};

/// Frame layout variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameLayout {
    /// Symmetric bracketing: preamble + marker before the payload, marker +
    /// preamble after it. Used when the frame travels through the RF chain.
    Bracketed,
    /// Single fixed tag prefix, no trailing bracket. Used by the simulated
    /// local pipeline.
    Prefix,
}

/// What `unwrap` does when the expected marker cannot be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerPolicy {
    /// Missing marker is a fatal [`FrameError::MarkerNotFound`].
    Strict,
    /// Missing marker returns the input unchanged. Useful when the receive
    /// chain may hand over an already-clean stream.
    PassThrough,
}

/// Framing configuration shared by the TX and RX sides.
///
/// For the [`FrameLayout::Prefix`] layout the `marker` field holds the tag
/// and the preamble fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramingConfig {
    /// Frame layout variant.
    pub layout: FrameLayout,
    /// Byte repeated to form the preamble run (bracketed layout only).
    pub preamble_byte: u8,
    /// Length of each preamble run in bytes (bracketed layout only).
    pub preamble_len: usize,
    /// Detection marker (bracketed) or prefix tag (prefix layout).
    #[serde(with = "serde_bytes_vec")]
    pub marker: Vec<u8>,
    /// Policy applied when `unwrap` cannot find the marker.
    pub policy: MarkerPolicy,
}

/// Serialize the marker as a plain byte list so YAML configs stay readable.
mod serde_bytes_vec {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        bytes.serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        Vec::<u8>::deserialize(de)
    }
}

impl FramingConfig {
    /// Over-the-air bracketed framing: 200 kB of 0xAA preamble around a
    /// 5-byte 0x33 marker, pass-through on a missing marker (the receive
    /// chain may already have consumed the brackets).
    pub fn over_the_air() -> Self {
        Self {
            layout: FrameLayout::Bracketed,
            preamble_byte: 0xAA,
            preamble_len: 200_000,
            marker: vec![0x33; 5],
            policy: MarkerPolicy::PassThrough,
        }
    }

    /// Short-range bracketed framing: 3 kB preamble, 16-byte marker, strict.
    pub fn short_range() -> Self {
        Self {
            layout: FrameLayout::Bracketed,
            preamble_byte: 0xAA,
            preamble_len: 3_000,
            marker: vec![0x33; 16],
            policy: MarkerPolicy::Strict,
        }
    }

    /// Simulated/local framing: fixed 16-byte tag prefix, strict.
    pub fn simulated() -> Self {
        Self {
            layout: FrameLayout::Prefix,
            preamble_byte: 0xAA,
            preamble_len: 0,
            marker: b"PREAMBLE::QLNK::".to_vec(),
            policy: MarkerPolicy::Strict,
        }
    }

    /// Marker (or tag) length in bytes.
    pub fn marker_len(&self) -> usize {
        self.marker.len()
    }

    /// Framing overhead added by `wrap` in bytes.
    pub fn overhead(&self) -> usize {
        match self.layout {
            FrameLayout::Bracketed => 2 * (self.preamble_len + self.marker.len()),
            FrameLayout::Prefix => self.marker.len(),
        }
    }
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self::simulated()
    }
}

/// Wraps payloads into frames and locates/strips the framing on receive.
#[derive(Debug, Clone)]
pub struct PreambleCodec {
    config: FramingConfig,
}

impl PreambleCodec {
    /// Create a codec. Fails if the marker is empty.
    pub fn new(config: FramingConfig) -> FrameResult<Self> {
        if config.marker.is_empty() {
            return Err(FrameError::InvalidConfig(
                "detection marker must not be empty".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// The framing configuration in effect.
    pub fn config(&self) -> &FramingConfig {
        &self.config
    }

    /// Wrap a payload into a frame. Pure; the caller decides where the
    /// result goes.
    pub fn wrap(&self, payload: &[u8]) -> Vec<u8> {
        let cfg = &self.config;
        let mut frame = Vec::with_capacity(cfg.overhead() + payload.len());
        match cfg.layout {
            FrameLayout::Bracketed => {
                frame.extend(std::iter::repeat(cfg.preamble_byte).take(cfg.preamble_len));
                frame.extend_from_slice(&cfg.marker);
                frame.extend_from_slice(payload);
                frame.extend_from_slice(&cfg.marker);
                frame.extend(std::iter::repeat(cfg.preamble_byte).take(cfg.preamble_len));
            }
            FrameLayout::Prefix => {
                frame.extend_from_slice(&cfg.marker);
                frame.extend_from_slice(payload);
            }
        }
        frame
    }

    /// Strip the framing from `framed` and return the payload.
    ///
    /// Bracketed layout: the payload is the range strictly between the first
    /// marker occurrence (forward search) and the last occurrence (backward
    /// search). Marker-pattern runs inside the payload are harmless: interior
    /// matches are never the outermost ones, so `unwrap(wrap(p)) == p` holds
    /// for any payload.
    ///
    /// Marker absence follows the configured [`MarkerPolicy`]. Coincident or
    /// overlapping front/back matches mean the frame cannot contain a payload
    /// and are always an [`FrameError::UndersizedFrame`], regardless of
    /// policy.
    pub fn unwrap(&self, framed: &[u8]) -> FrameResult<Vec<u8>> {
        match self.config.layout {
            FrameLayout::Bracketed => self.unwrap_bracketed(framed),
            FrameLayout::Prefix => self.unwrap_prefix(framed),
        }
    }

    fn unwrap_bracketed(&self, framed: &[u8]) -> FrameResult<Vec<u8>> {
        let marker = &self.config.marker;
        let (front, back) = match (find(framed, marker), rfind(framed, marker)) {
            (Some(f), Some(b)) => (f, b),
            _ => return self.on_missing(framed),
        };
        let start = front + marker.len();
        if back < start {
            // A single marker occurrence, or two that overlap: there is no
            // room for even an empty payload between distinct markers.
            return Err(FrameError::UndersizedFrame {
                needed: start + marker.len(),
                got: framed.len(),
            });
        }
        Ok(framed[start..back].to_vec())
    }

    fn unwrap_prefix(&self, framed: &[u8]) -> FrameResult<Vec<u8>> {
        let tag = &self.config.marker;
        if framed.len() < tag.len() || &framed[..tag.len()] != tag.as_slice() {
            return self.on_missing(framed);
        }
        Ok(framed[tag.len()..].to_vec())
    }

    fn on_missing(&self, framed: &[u8]) -> FrameResult<Vec<u8>> {
        match self.config.policy {
            MarkerPolicy::Strict => Err(FrameError::MarkerNotFound),
            MarkerPolicy::PassThrough => Ok(framed.to_vec()),
        }
    }
}

/// First occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Last occurrence of `needle` in `haystack`.
fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bracketed_codec() -> PreambleCodec {
        // Small preamble keeps test frames readable.
        let config = FramingConfig {
            preamble_len: 32,
            policy: MarkerPolicy::Strict,
            ..FramingConfig::over_the_air()
        };
        PreambleCodec::new(config).unwrap()
    }

    #[test]
    fn test_bracketed_round_trip() {
        let codec = bracketed_codec();
        for payload in [&b""[..], b"x", b"hello world", &[0xAA; 50][..]] {
            let frame = codec.wrap(payload);
            assert_eq!(
                codec.unwrap(&frame).unwrap(),
                payload,
                "round trip must be lossless"
            );
        }
    }

    #[test]
    fn test_round_trip_with_marker_bytes_in_payload() {
        let codec = bracketed_codec();
        // Payload starting, ending and consisting of the marker pattern.
        let marker_run = vec![0x33u8; 12];
        let mut mixed = vec![0x33; 5];
        mixed.extend_from_slice(b"data");
        mixed.extend_from_slice(&[0x33; 5]);
        for payload in [marker_run, mixed] {
            let frame = codec.wrap(&payload);
            assert_eq!(codec.unwrap(&frame).unwrap(), payload);
        }
    }

    #[test]
    fn test_prefix_round_trip() {
        let codec = PreambleCodec::new(FramingConfig::simulated()).unwrap();
        let frame = codec.wrap(b"hello");
        assert_eq!(frame.len(), 16 + 5);
        assert_eq!(codec.unwrap(&frame).unwrap(), b"hello");
    }

    #[test]
    fn test_strict_policy_rejects_unframed_stream() {
        let codec = bracketed_codec();
        let err = codec.unwrap(b"no markers here at all").unwrap_err();
        assert!(matches!(err, FrameError::MarkerNotFound));

        let prefix = PreambleCodec::new(FramingConfig::simulated()).unwrap();
        let err = prefix.unwrap(b"wrong prefix").unwrap_err();
        assert!(matches!(err, FrameError::MarkerNotFound));
    }

    #[test]
    fn test_passthrough_policy_returns_input_unchanged() {
        let config = FramingConfig {
            policy: MarkerPolicy::PassThrough,
            preamble_len: 16,
            ..FramingConfig::over_the_air()
        };
        let codec = PreambleCodec::new(config).unwrap();
        let stream = b"already clean payload";
        assert_eq!(codec.unwrap(stream).unwrap(), stream);
    }

    #[test]
    fn test_single_marker_is_undersized_not_truncated() {
        let codec = bracketed_codec();
        // One marker occurrence only: front and back searches coincide.
        let mut frame = vec![0xAA; 8];
        frame.extend_from_slice(&[0x33; 5]);
        frame.extend(vec![0xAA; 8]);
        let err = codec.unwrap(&frame).unwrap_err();
        assert!(
            matches!(err, FrameError::UndersizedFrame { .. }),
            "coincident markers must be an explicit error, got {err:?}"
        );
    }

    #[test]
    fn test_empty_payload_brackets_are_adjacent_markers() {
        let codec = bracketed_codec();
        let frame = codec.wrap(b"");
        assert_eq!(codec.unwrap(&frame).unwrap(), b"");
    }

    #[test]
    fn test_overhead_matches_wrap() {
        for config in [
            FramingConfig::over_the_air(),
            FramingConfig::short_range(),
            FramingConfig::simulated(),
        ] {
            let overhead = config.overhead();
            let codec = PreambleCodec::new(config).unwrap();
            let frame = codec.wrap(b"abc");
            assert_eq!(frame.len(), overhead + 3);
        }
    }

    #[test]
    fn test_empty_marker_is_rejected() {
        let config = FramingConfig {
            marker: Vec::new(),
            ..FramingConfig::simulated()
        };
        assert!(matches!(
            PreambleCodec::new(config),
            Err(FrameError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_config_yaml_round_trip() {
        let config = FramingConfig::short_range();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: FramingConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, config);
    }
}
