//! Command modules - one file per CLI command

pub mod check;
pub mod completions;
pub mod formula;
pub mod hash;
pub mod install;
pub mod resolve;
pub mod smoke;
pub mod targets;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bindesc_core::descriptor;
use bindesc_schema::FormulaDescriptor;

use crate::ops::InstallError;

/// The descriptor at `path`, or the built-in one.
pub fn load_descriptor(path: Option<&Path>) -> Result<FormulaDescriptor, InstallError> {
    let loaded = match path {
        Some(path) => descriptor::load(path)?,
        None => descriptor::builtin()?,
    };
    tracing::debug!(source = ?path, "descriptor loaded");
    Ok(loaded)
}

/// `--bin-dir` if given, else `$BINDESC_BIN_DIR` or `~/.bindesc/bin`.
pub fn bin_dir(flag: Option<&Path>) -> Result<PathBuf> {
    match flag {
        Some(dir) => Ok(dir.to_path_buf()),
        None => bindesc_core::bin_path().context("Failed to determine binary directory"),
    }
}
