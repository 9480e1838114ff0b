use dirs::home_dir;
use std::io;
use std::path::PathBuf;

/// Overrides the bindesc home directory (default `~/.bindesc`).
pub const HOME_ENV: &str = "BINDESC_HOME";

/// Overrides the binary installation directory (default `<home>/bin`).
pub const BIN_DIR_ENV: &str = "BINDESC_BIN_DIR";

/// Returns the home directory, or None if the user's home cannot be resolved.
pub fn try_home() -> Option<PathBuf> {
    if let Some(val) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".bindesc"))
}

/// Returns the bindesc home directory (`~/.bindesc`).
///
/// # Errors
///
/// Fails with `NotFound` if neither `BINDESC_HOME` is set nor the user's
/// home directory can be resolved.
pub fn home() -> io::Result<PathBuf> {
    try_home().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("Could not determine home directory. Set {HOME_ENV} to override."),
        )
    })
}

/// Binary installation target: `$BINDESC_BIN_DIR` or ~/.bindesc/bin
pub fn bin_path() -> io::Result<PathBuf> {
    if let Some(val) = std::env::var_os(BIN_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(val));
    }
    Ok(home()?.join("bin"))
}

/// Staging area for downloads and extraction: ~/.bindesc/tmp
pub fn tmp_path() -> io::Result<PathBuf> {
    Ok(home()?.join("tmp"))
}
