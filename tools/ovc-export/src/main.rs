//! ovc-export - open-vector-compression diagnostics
//!
//! Validates compression settings and inspects payloads written to a
//! compression stream.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ovc_codec::{DynamicVectorDecoder, MeshDecoder};
use ovc_export::CompressionSettings;

#[derive(Parser)]
#[command(name = "ovc-export")]
#[command(about = "open-vector-compression diagnostics")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a compression settings file
    Check {
        /// Path to the settings TOML
        #[arg(default_value = "compression.toml")]
        settings: PathBuf,
    },

    /// Decode the header of one payload inside a stream file
    Inspect {
        /// Stream file holding the payload
        stream: PathBuf,

        /// Payload byte offset (byteOffset)
        #[arg(long)]
        offset: usize,

        /// Payload byte length (count)
        #[arg(long)]
        length: usize,

        /// Payload kind
        #[arg(long, value_enum, default_value_t = PayloadKind::Mesh)]
        kind: PayloadKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PayloadKind {
    Mesh,
    Vector,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check { settings } => {
            tracing::info!("Checking settings {:?}", settings);
            let config = CompressionSettings::load(&settings)?;
            let resolved = toml::to_string(&config).context("Failed to format settings")?;
            println!("{}", resolved);
            tracing::info!("Settings are valid!");
        }

        Commands::Inspect {
            stream,
            offset,
            length,
            kind,
        } => {
            let data = std::fs::read(&stream)
                .with_context(|| format!("Failed to read stream: {}", stream.display()))?;
            let Some(end) = offset.checked_add(length).filter(|&end| end <= data.len()) else {
                bail!(
                    "Range {}+{} is outside the stream ({} bytes)",
                    offset,
                    length,
                    data.len()
                );
            };
            let payload = &data[offset..end];

            match kind {
                PayloadKind::Mesh => {
                    let decoder = MeshDecoder::new(payload).context("Failed to read mesh header")?;
                    let header = decoder.header();
                    tracing::info!(
                        "Mesh payload: {:?} stream, {} triangles, {} coords, {} normals",
                        header.stream_type,
                        header.triangle_count,
                        header.coord_count(),
                        header.normal_count()
                    );
                    for (i, attribute) in header.float_attributes.iter().enumerate() {
                        tracing::info!(
                            "  float slot {}: {:?}, {} x {} at {} bits",
                            i,
                            attribute.kind,
                            attribute.slot.count,
                            attribute.slot.dim,
                            attribute.slot.quant_bits
                        );
                    }
                }
                PayloadKind::Vector => {
                    let decoder =
                        DynamicVectorDecoder::new(payload).context("Failed to read vector header")?;
                    let header = decoder.header();
                    tracing::info!(
                        "Vector payload: {:?} stream, {} x {} at {} bits, min {:?}, max {:?}",
                        header.stream_type,
                        header.count,
                        header.dim,
                        header.quant_bits,
                        header.min,
                        header.max
                    );
                }
            }
        }
    }

    Ok(())
}
