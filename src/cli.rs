//! CLI argument parsing for the whichscript binary.
//!
//! The CLI is a thin wrapper over the library: locate sidecars, open the
//! script that produced an output, and build archive bundles on demand.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "whichscript",
    version,
    about = "Open the script that generated an output file",
    after_help = "Commands:\n  open <output>     Open the originating script (prefers snapshot sidecars)\n  archive <output>  Bundle metadata, snapshot, and local sources into a zip\n  info <output>     Print the metadata sidecar\n\nExamples:\n  whichscript open results/plot.png\n  whichscript open results/plot.png --print-only\n  whichscript archive results/plot.png --archive-root /tmp/archive\n  whichscript info results/plot.png",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Open(OpenArgs),
    Archive(ArchiveArgs),
    Info(InfoArgs),
}

/// Open command inputs.
#[derive(Parser, Debug)]
#[command(about = "Open the script that generated an output file")]
pub struct OpenArgs {
    /// Output file with whichscript sidecars next to it
    pub output_file: PathBuf,

    /// Print the resolved script path instead of opening it
    #[arg(long)]
    pub print_only: bool,

    /// Opener command to use instead of $VISUAL/$EDITOR
    #[arg(long = "with", value_name = "CMD")]
    pub with_command: Option<String>,
}

/// Archive command inputs.
#[derive(Parser, Debug)]
#[command(about = "Build an archive bundle for an existing output")]
pub struct ArchiveArgs {
    /// Output file to bundle
    pub output_file: PathBuf,

    /// Archive root directory (defaults to the platform data dir)
    #[arg(long, value_name = "DIR")]
    pub archive_root: Option<PathBuf>,

    /// Directory whose source files count as local dependencies (repeatable)
    #[arg(long = "local-root", value_name = "DIR")]
    pub local_roots: Vec<PathBuf>,

    /// Cap on bundled dependency files
    #[arg(long, value_name = "N")]
    pub max_files: Option<usize>,

    /// Cap on bundled dependency bytes
    #[arg(long, value_name = "N")]
    pub max_bytes: Option<u64>,
}

/// Info command inputs.
#[derive(Parser, Debug)]
#[command(about = "Print the metadata sidecar for an output")]
pub struct InfoArgs {
    /// Output file with whichscript sidecars next to it
    pub output_file: PathBuf,
}
