mod app;
mod audio;
mod blob;
mod cli;
mod config;
mod media;
mod playlist;
mod runtime;
mod store;
mod ui;
mod upload;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    runtime::run(cli::Args::parse())
}
