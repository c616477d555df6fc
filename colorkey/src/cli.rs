use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "colorkey", version, about = "Make a key color transparent and browse a catalog of keyed images")]
pub struct Cli {
    /// Catalog database, overrides the configured path
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// PNG file the rendered image is written to
    #[arg(long, value_name = "PATH")]
    pub preview: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<StartCommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum StartCommand {
    /// Start with a single image file
    Open { file: PathBuf },

    /// Start with the images of a catalog group
    Group { name: String },

    /// Print the catalog groups and exit
    Groups,
}
