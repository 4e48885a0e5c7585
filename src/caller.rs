//! Caller identification via stack inspection.
//!
//! Attribution walks the active backtrace and picks the innermost frame that
//! is neither part of this crate nor part of the toolchain, answering "which
//! script wrote this file?" the way a human reading the stack would.

use backtrace::Backtrace;
use std::env;
use std::path::{Path, PathBuf};

/// This crate's own sources, baked in at compile time. Frames under this
/// prefix are never attributed as the calling script.
const CRATE_SRC: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src");

/// Return the absolute path of the source file that triggered the current
/// write, or `None` when no frame outside library code resolves (stripped
/// binaries, missing debug info).
pub fn find_calling_script() -> Option<PathBuf> {
    let trace = Backtrace::new();
    for frame in trace.frames() {
        for symbol in frame.symbols() {
            let Some(file) = symbol.filename() else {
                continue;
            };
            if is_library_path(file) {
                continue;
            }
            return Some(absolute(file));
        }
    }
    None
}

/// Whether a source path belongs to this crate, the standard library, or a
/// third-party crate rather than user code.
pub fn is_library_path(path: &Path) -> bool {
    if path.starts_with(CRATE_SRC) {
        return true;
    }
    let text = path.to_string_lossy();
    // Std frames carry the /rustc/<hash>/ prefix recorded in release debug info.
    text.starts_with("/rustc/")
        || text.contains("/.cargo/registry/")
        || text.contains("/.cargo/git/")
        || text.contains("/.rustup/toolchains/")
        || text.contains("\\.cargo\\registry\\")
        || text.contains("\\.cargo\\git\\")
        || text.contains("\\.rustup\\toolchains\\")
}

fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    joined.canonicalize().unwrap_or(joined)
}
