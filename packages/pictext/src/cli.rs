//! Command line arguments backing the `pictext` binary.
use clap::{Args as ClapArgs, Parser, Subcommand};
use pictext::Settings;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
  name = "pictext",
  about = "Classify images as text, formula or graph and convert them to text",
  version
)]
pub struct Args {
  #[command(subcommand)]
  pub command: Commands,
}

/// Where the image comes from. Defaults to base64 on stdin.
#[derive(ClapArgs, Debug, Clone)]
pub struct ImageSource {
  /// File holding the base64 payload (`-` for stdin)
  #[arg(long, short = 'i', conflicts_with = "image")]
  pub input: Option<PathBuf>,

  /// Raw image file (PNG, JPEG, ...), encoded before processing
  #[arg(long)]
  pub image: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Print version information
  Version,
  /// Convert an image into text, LaTeX or a caption
  Convert {
    #[command(flatten)]
    source: ImageSource,

    /// Print the full outcome as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    settings: Settings,
  },
  /// Classify an image and print the winning label
  Classify {
    #[command(flatten)]
    source: ImageSource,

    #[command(flatten)]
    settings: Settings,
  },
  /// Print the active category table as JSON
  Labels {
    #[command(flatten)]
    settings: Settings,
  },
}
