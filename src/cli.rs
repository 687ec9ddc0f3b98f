use std::path::PathBuf;

use clap::Parser;

/// playdeck - upload audio files into a playlist that survives restarts
#[derive(Parser, Debug, Default)]
#[command(name = "playdeck", version, about)]
pub struct Args {
    /// Files or directories to upload after the saved playlist is restored
    pub paths: Vec<PathBuf>,

    /// Forget the saved playlist before starting
    #[arg(long)]
    pub reset: bool,

    /// Keep the playlist in memory only for this session
    #[arg(long, conflicts_with = "store")]
    pub ephemeral: bool,

    /// Store file to use instead of the configured one
    #[arg(long, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Hide the progress bar and disable seeking
    #[arg(long)]
    pub no_seek_bar: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}
