use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::{Command as ProcessCommand, ExitCode};
use tracing_subscriber::EnvFilter;
use whichscript::archive::build_archive_for_output;
use whichscript::config::{
    default_archive_root, ArchiveOptions, DEFAULT_MAX_ARCHIVE_BYTES, DEFAULT_MAX_ARCHIVE_FILES,
};
use whichscript::metadata;
use whichscript::sidecar::SidecarPaths;

mod cli;
use cli::{ArchiveArgs, Command, InfoArgs, OpenArgs, RootArgs};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    let result = match args.command {
        Command::Open(args) => cmd_open(args),
        Command::Archive(args) => cmd_archive(args),
        Command::Info(args) => cmd_info(args),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_open(args: OpenArgs) -> Result<ExitCode> {
    if !args.output_file.exists() {
        eprintln!("Output file not found: {}", args.output_file.display());
        return Ok(ExitCode::from(2));
    }
    let Some(target) = find_target_from_sidecars(&args.output_file) else {
        eprintln!(
            "No script sidecars found. Expected '<file>.script[.<ext>]' or \
             '<file>.metadata.json' with 'script_path'."
        );
        return Ok(ExitCode::from(3));
    };
    if args.print_only {
        println!("{}", target.display());
        return Ok(ExitCode::SUCCESS);
    }
    if open_target(&target, args.with_command.as_deref())? {
        return Ok(ExitCode::SUCCESS);
    }
    eprintln!(
        "Found script at: {}\nCould not auto-open it; open it manually or rerun with --print-only.",
        target.display()
    );
    Ok(ExitCode::from(4))
}

/// Decide which script to open for an output file.
///
/// Preference order: extension-carrying snapshot, raw snapshot, then the
/// original script path recorded in metadata (only while it still exists).
fn find_target_from_sidecars(output: &Path) -> Option<PathBuf> {
    let sidecars = SidecarPaths::new(output);
    if let Some(snapshot) = sidecars.existing_snapshot() {
        return Some(snapshot);
    }
    let descriptor = metadata::read_metadata(&sidecars.metadata_path()).ok()?;
    descriptor.script_path.filter(|path| path.exists())
}

/// Try openers in order: explicit command, $VISUAL/$EDITOR, VS Code, then the
/// platform default. Returns whether any of them succeeded.
fn open_target(target: &Path, with_command: Option<&str>) -> Result<bool> {
    if let Some(raw) = with_command {
        let parts = shell_words::split(raw).with_context(|| format!("parse command {raw:?}"))?;
        return run_opener(parts, target);
    }
    for var in ["VISUAL", "EDITOR"] {
        if let Ok(value) = std::env::var(var) {
            if let Ok(parts) = shell_words::split(&value) {
                if !parts.is_empty() && run_opener(parts, target)? {
                    return Ok(true);
                }
            }
        }
    }
    if let Ok(code) = which::which("code") {
        let parts = vec![code.display().to_string(), "-g".to_string()];
        if run_opener(parts, target)? {
            return Ok(true);
        }
    }
    run_opener(platform_opener(), target)
}

fn run_opener(mut command: Vec<String>, target: &Path) -> Result<bool> {
    if command.is_empty() {
        return Ok(false);
    }
    let program = command.remove(0);
    let status = ProcessCommand::new(&program)
        .args(&command)
        .arg(target)
        .status();
    match status {
        Ok(status) => Ok(status.success()),
        Err(err) => {
            tracing::debug!(program = %program, error = %err, "opener failed to launch");
            Ok(false)
        }
    }
}

#[cfg(target_os = "macos")]
fn platform_opener() -> Vec<String> {
    vec!["open".to_string()]
}

#[cfg(windows)]
fn platform_opener() -> Vec<String> {
    // `start` treats its first quoted argument as a window title.
    vec![
        "cmd".to_string(),
        "/C".to_string(),
        "start".to_string(),
        String::new(),
    ]
}

#[cfg(not(any(target_os = "macos", windows)))]
fn platform_opener() -> Vec<String> {
    vec!["xdg-open".to_string()]
}

fn cmd_archive(args: ArchiveArgs) -> Result<ExitCode> {
    let sidecars = SidecarPaths::new(&args.output_file);
    let descriptor = metadata::read_metadata(&sidecars.metadata_path()).ok();
    let mut local_roots = args.local_roots;
    if local_roots.is_empty() {
        // Same fallback the tracker uses: the calling script's directory.
        if let Some(dir) = descriptor
            .as_ref()
            .and_then(|meta| meta.script_path.as_deref())
            .and_then(Path::parent)
        {
            local_roots.push(dir.to_path_buf());
        }
    }
    let options = ArchiveOptions {
        archive_root: args.archive_root.unwrap_or_else(default_archive_root),
        local_roots,
        max_files: args.max_files.unwrap_or(DEFAULT_MAX_ARCHIVE_FILES),
        max_bytes: args.max_bytes.unwrap_or(DEFAULT_MAX_ARCHIVE_BYTES),
    };
    match build_archive_for_output(&args.output_file, &options, descriptor.as_ref())? {
        Some(dest) => {
            println!("Wrote archive to {}", dest.display());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("Output file not found: {}", args.output_file.display());
            Ok(ExitCode::from(2))
        }
    }
}

fn cmd_info(args: InfoArgs) -> Result<ExitCode> {
    let sidecars = SidecarPaths::new(&args.output_file);
    let descriptor = metadata::read_metadata(&sidecars.metadata_path())?;
    let text = serde_json::to_string_pretty(&descriptor).context("serialize metadata")?;
    println!("{text}");
    Ok(ExitCode::SUCCESS)
}
