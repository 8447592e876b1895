//! Subcommand definitions and dispatch.
//!
//! Each subcommand is one pipeline operation over files. Standalone
//! transforms (`wrap`, `crc-append`, `encrypt`, …) print the operation
//! summary on stdout; the composed `tx`/`rx` commands print one line per
//! stage.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use qlink_core::link::FileLink;
use qlink_core::pipeline::{RxPipeline, TxPipeline};
use qlink_core::preamble::{FramingConfig, MarkerPolicy, PreambleCodec};
use qlink_core::{fileops, ChecksumScope, FrameResult, IntegrityEnvelope, PipelineConfig};

/// Framing layout preset.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LayoutPreset {
    /// Compact 16-byte prefix tag, for local simulation.
    Simulated,
    /// Bracketed framing with the full over-the-air preamble run.
    OverTheAir,
    /// Bracketed framing with a short preamble run.
    ShortRange,
}

impl LayoutPreset {
    fn framing(self) -> FramingConfig {
        match self {
            LayoutPreset::Simulated => FramingConfig::simulated(),
            LayoutPreset::OverTheAir => FramingConfig::over_the_air(),
            LayoutPreset::ShortRange => FramingConfig::short_range(),
        }
    }
}

/// Receive-side behavior when no frame marker is found.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum PolicyArg {
    /// Missing marker is an error.
    Strict,
    /// Missing marker passes the input through unchanged.
    Passthrough,
}

impl From<PolicyArg> for MarkerPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Strict => MarkerPolicy::Strict,
            PolicyArg::Passthrough => MarkerPolicy::PassThrough,
        }
    }
}

/// Byte range the CRC trailer covers.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ScopeArg {
    FullFrame,
    PayloadOnly,
}

impl From<ScopeArg> for ChecksumScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::FullFrame => ChecksumScope::FullFrame,
            ScopeArg::PayloadOnly => ChecksumScope::PayloadOnly,
        }
    }
}

/// Shared pipeline settings. A `--config` file wins over the preset flags.
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// YAML pipeline configuration file (overrides the preset flags).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Framing layout preset.
    #[arg(long, value_name = "LAYOUT", default_value = "simulated")]
    pub layout: LayoutPreset,

    /// Missing-marker policy on the receive side.
    #[arg(long, value_name = "POLICY")]
    pub policy: Option<PolicyArg>,

    /// Checksum scope.
    #[arg(long, value_name = "SCOPE", default_value = "full-frame")]
    pub scope: ScopeArg,

    /// Enable the encryption stage; the key file is written by `tx` and read
    /// by `rx`.
    #[arg(long, value_name = "FILE")]
    pub key: Option<PathBuf>,
}

impl PipelineArgs {
    pub fn resolve(&self) -> FrameResult<PipelineConfig> {
        if let Some(path) = &self.config {
            return PipelineConfig::load_from(path);
        }
        let mut config = PipelineConfig {
            framing: self.layout.framing(),
            checksum_scope: self.scope.into(),
            ..PipelineConfig::simulated()
        };
        if let Some(policy) = self.policy {
            config.framing.policy = policy.into();
        }
        if let Some(key) = &self.key {
            config = config.with_encryption(key);
        }
        Ok(config)
    }

    fn codec(&self) -> FrameResult<PreambleCodec> {
        PreambleCodec::new(self.resolve()?.framing)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add framing around a payload file.
    Wrap {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Locate and strip framing from a frame file.
    Unwrap {
        input: PathBuf,
        output: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Append the CRC-32 trailer to a file in place.
    CrcAppend { file: PathBuf },
    /// Verify a file's CRC-32 trailer and write the body without it.
    CrcVerify { input: PathBuf, output: PathBuf },
    /// Encrypt a file; a fresh key is generated and saved.
    Encrypt {
        input: PathBuf,
        output: PathBuf,
        /// Where to save the generated key.
        #[arg(long, value_name = "FILE")]
        key: PathBuf,
    },
    /// Decrypt a file with a stored key.
    Decrypt {
        input: PathBuf,
        output: PathBuf,
        /// Key file to decrypt with.
        #[arg(long, value_name = "FILE")]
        key: PathBuf,
    },
    /// Run the full transmit pipeline over a payload file.
    Tx {
        input: PathBuf,
        /// Where to write the wire frame.
        #[arg(long, value_name = "FILE")]
        wire: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Run the full receive pipeline over a wire frame.
    Rx {
        output: PathBuf,
        /// Wire frame to receive.
        #[arg(long, value_name = "FILE")]
        wire: PathBuf,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

pub fn run(command: Command) -> FrameResult<()> {
    match command {
        Command::Wrap {
            input,
            output,
            pipeline,
        } => {
            let summary = fileops::add_preamble(&pipeline.codec()?, &input, &output)?;
            println!("{summary}");
        }
        Command::Unwrap {
            input,
            output,
            pipeline,
        } => {
            let summary = fileops::remove_preamble(&pipeline.codec()?, &input, &output)?;
            println!("{summary}");
        }
        Command::CrcAppend { file } => {
            let summary = fileops::append_checksum(&IntegrityEnvelope::new(), &file)?;
            println!("{summary}");
        }
        Command::CrcVerify { input, output } => {
            let summary = fileops::verify_checksum(&IntegrityEnvelope::new(), &input, &output)?;
            println!("{summary}");
        }
        Command::Encrypt { input, output, key } => {
            let summary = fileops::encrypt_file(&input, &output, &key)?;
            println!("{summary}");
        }
        Command::Decrypt { input, output, key } => {
            let summary = fileops::decrypt_file(&input, &output, &key)?;
            println!("{summary}");
        }
        Command::Tx {
            input,
            wire,
            pipeline,
        } => {
            let tx = TxPipeline::new(pipeline.resolve()?)?;
            let mut link = FileLink::new(wire);
            let frame = tx.transmit_file(&input, &mut link)?;
            for report in &frame.reports {
                println!("{report}");
            }
        }
        Command::Rx {
            output,
            wire,
            pipeline,
        } => {
            let rx = RxPipeline::new(pipeline.resolve()?)?;
            let mut link = FileLink::new(wire);
            let outcome = rx.receive_to_file(&mut link, &output)?;
            for report in &outcome.reports {
                println!("{report}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlink_core::FrameError;

    fn default_args() -> PipelineArgs {
        PipelineArgs {
            config: None,
            layout: LayoutPreset::Simulated,
            policy: None,
            scope: ScopeArg::FullFrame,
            key: None,
        }
    }

    #[test]
    fn test_tx_rx_round_trip_over_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("payload.bin");
        let wire = dir.path().join("wire.tmp");
        let output = dir.path().join("recovered.bin");
        std::fs::write(&input, b"cli round trip").unwrap();

        run(Command::Tx {
            input,
            wire: wire.clone(),
            pipeline: default_args(),
        })
        .unwrap();
        run(Command::Rx {
            output: output.clone(),
            wire,
            pipeline: default_args(),
        })
        .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"cli round trip");
    }

    #[test]
    fn test_encrypt_then_decrypt_commands() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("plain.bin");
        let cipher = dir.path().join("cipher.bin");
        let key = dir.path().join("session.key");
        let output = dir.path().join("plain_again.bin");
        std::fs::write(&input, b"secret").unwrap();

        run(Command::Encrypt {
            input,
            output: cipher.clone(),
            key: key.clone(),
        })
        .unwrap();
        run(Command::Decrypt {
            input: cipher,
            output: output.clone(),
            key,
        })
        .unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"secret");
    }

    #[test]
    fn test_rx_surfaces_pipeline_errors() {
        let dir = tempfile::tempdir().unwrap();
        let wire = dir.path().join("wire.tmp");
        std::fs::write(&wire, b"not a frame").unwrap();

        let err = run(Command::Rx {
            output: dir.path().join("out.bin"),
            wire,
            pipeline: default_args(),
        })
        .unwrap_err();
        assert!(matches!(err, FrameError::Stage { .. }));
    }

    #[test]
    fn test_config_file_overrides_preset_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        PipelineConfig::hardware().save(&path).unwrap();

        let args = PipelineArgs {
            config: Some(path),
            ..default_args()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config, PipelineConfig::hardware());
    }
}
