//! TOML descriptor loading
//!
//! Descriptors are validated while they are parsed: a bad digest, URL,
//! version or duplicate target is a load error, never a runtime surprise.

use std::fs;
use std::path::{Path, PathBuf};

use bindesc_schema::FormulaDescriptor;
use thiserror::Error;

/// The `dbui` release descriptor shipped with this build.
pub const BUILTIN_DBUI: &str = include_str!("../descriptors/dbui.toml");

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid descriptor: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize descriptor: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// The built-in `dbui` descriptor.
pub fn builtin() -> Result<FormulaDescriptor, LoadError> {
    parse(BUILTIN_DBUI)
}

/// Parse and validate a descriptor from a TOML string.
pub fn parse(content: &str) -> Result<FormulaDescriptor, LoadError> {
    Ok(toml::from_str(content)?)
}

/// Parse and validate a descriptor file on disk.
pub fn load(path: &Path) -> Result<FormulaDescriptor, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Serialize a descriptor back to pretty TOML.
pub fn to_toml(descriptor: &FormulaDescriptor) -> Result<String, LoadError> {
    Ok(toml::to_string_pretty(descriptor)?)
}
