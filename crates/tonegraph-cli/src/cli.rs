use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tonegraph_core::StyleVariant;

#[derive(Parser, Debug)]
#[command(
    name = "tonegraph",
    version,
    about = "Build and check placeholder style-transfer model artifacts"
)]
pub struct Cli {
    /// Directory for artifacts (overrides TONEGRAPH_MODEL_DIR)
    #[arg(long, global = true)]
    pub model_dir: Option<PathBuf>,

    /// Log filter (overrides TONEGRAPH_LOG / RUST_LOG)
    #[arg(long, global = true)]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write an artifact embedding one fixed transform
    Build {
        /// Transform to embed: `sepia` or `gain`
        variant: StyleVariant,

        /// Output path (defaults to the variant's file in the model directory)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Store weights as int8
        #[arg(long)]
        optimize: bool,

        /// Override input height and width
        #[arg(long)]
        size: Option<usize>,
    },
    /// Check an artifact's header and print the expected tensor contract
    Verify {
        /// Artifact path
        path: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print an artifact's declared inputs and outputs
    Inspect {
        /// Artifact path
        path: Option<PathBuf>,
    },
    /// Run an artifact on an image file
    Apply {
        /// Artifact path
        #[arg(long)]
        model: PathBuf,

        /// Source image
        #[arg(long)]
        input: PathBuf,

        /// Destination image
        #[arg(long)]
        output: PathBuf,
    },
}
