//! # wkhtmltopdf-locate
//!
//! Find the [wkhtmltopdf](https://wkhtmltopdf.org/) executable so callers
//! don't have to hard-code an install path per machine.
//!
//! ## How it works
//!
//! [`locate`] checks, in order:
//!
//! 1. An explicit path supplied by the caller (e.g. from `WK_HTML_TO_PDF`).
//!    It must exist; a missing explicit path is an error rather than a
//!    silent fallback.
//! 2. Every directory on `PATH`, looking for `wkhtmltopdf` (`.exe` on Windows).
//! 3. The platform's usual install locations.
//!
//! [`probe_version`] runs `<binary> --version` to confirm the executable
//! actually starts.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wkhtmltopdf_locate::{locate, probe_version};
//!
//! let binary = locate(None).expect("wkhtmltopdf not installed");
//! let version = probe_version(&binary).expect("wkhtmltopdf does not start");
//! println!("{} ({version})", binary.display());
//! ```
//!
//! ## Default install locations
//!
//! | OS      | Paths tried                                                  |
//! |---------|--------------------------------------------------------------|
//! | Windows | `C:/Program Files/wkhtmltopdf/bin/wkhtmltopdf.exe`, `C:/Program Files (x86)/…` |
//! | macOS   | `/usr/local/bin/wkhtmltopdf`, `/opt/homebrew/bin/wkhtmltopdf` |
//! | Linux   | `/usr/bin/wkhtmltopdf`, `/usr/local/bin/wkhtmltopdf`         |

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Executable file name on the current platform.
#[cfg(windows)]
pub const BINARY_NAME: &str = "wkhtmltopdf.exe";
/// Executable file name on the current platform.
#[cfg(not(windows))]
pub const BINARY_NAME: &str = "wkhtmltopdf";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by wkhtmltopdf-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// The caller named a path that does not exist.
    #[error("wkhtmltopdf not found at '{path}'")]
    ExplicitPathMissing { path: PathBuf },

    /// Nothing on PATH or in the platform install directories.
    #[error(
        "wkhtmltopdf not found on PATH or in {searched:?}\n\
Install it from https://wkhtmltopdf.org/downloads.html or set WK_HTML_TO_PDF."
    )]
    NotFound { searched: Vec<PathBuf> },

    /// The executable exists but `--version` could not be run.
    #[error("Failed to run '{path}' --version: {reason}")]
    Probe { path: PathBuf, reason: String },
}

// ── Internal: platform defaults ──────────────────────────────────────────────

fn platform_candidates() -> Vec<PathBuf> {
    let paths: &[&str] = match std::env::consts::OS {
        "windows" => &[
            "C:/Program Files/wkhtmltopdf/bin/wkhtmltopdf.exe",
            "C:/Program Files (x86)/wkhtmltopdf/bin/wkhtmltopdf.exe",
        ],
        "macos" => &[
            "/usr/local/bin/wkhtmltopdf",
            "/opt/homebrew/bin/wkhtmltopdf",
        ],
        _ => &["/usr/bin/wkhtmltopdf", "/usr/local/bin/wkhtmltopdf"],
    };
    paths.iter().map(PathBuf::from).collect()
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Resolve the wkhtmltopdf executable.
///
/// `explicit` wins when given, but only if the file exists.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, LocateError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(LocateError::ExplicitPathMissing {
            path: path.to_path_buf(),
        });
    }

    let path_var = std::env::var_os("PATH").unwrap_or_default();
    if let Some(found) = find_on_path(&path_var) {
        return Ok(found);
    }

    let candidates = platform_candidates();
    if let Some(found) = candidates.iter().find(|p| p.is_file()) {
        return Ok(found.clone());
    }

    Err(LocateError::NotFound {
        searched: candidates,
    })
}

/// Search a `PATH`-style list of directories for [`BINARY_NAME`].
pub fn find_on_path(path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .map(|dir| dir.join(BINARY_NAME))
        .find(|candidate| candidate.is_file())
}

/// Run `<binary> --version` and return its trimmed stdout.
pub fn probe_version(binary: &Path) -> Result<String, LocateError> {
    let output = Command::new(binary)
        .arg("--version")
        .output()
        .map_err(|e| LocateError::Probe {
            path: binary.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(LocateError::Probe {
            path: binary.to_path_buf(),
            reason: format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
