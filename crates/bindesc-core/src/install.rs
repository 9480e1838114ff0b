//! Binary placement.
//!
//! The executable is written to a temp file inside the bin dir and renamed
//! over its final name, so `<bin_dir>/<binary>` is either absent, the old
//! file, or the complete new one. Temp files carry [`PLACEMENT_PREFIX`]; any
//! left behind by an interrupted run are removed by the next placement.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use bindesc_schema::InstallRule;
use thiserror::Error;

use crate::io::extract::{self, ArchiveFormat, ExtractError};

/// Name prefix of in-flight placement files inside the bin dir.
pub const PLACEMENT_PREFIX: &str = ".bindesc-";

#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("IO error at {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Archive does not contain '{binary}'")]
    MissingExecutable { binary: String },

    #[error("Archive contains {} files named '{binary}': {}", paths.len(), display_paths(paths))]
    AmbiguousExecutable { binary: String, paths: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

trait IoContext<T> {
    fn at(self, path: &Path) -> Result<T, PlacementError>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T, PlacementError> {
        self.map_err(|source| PlacementError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The executable as it now exists in the bin dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledBinary {
    pub path: PathBuf,
    pub size: u64,
}

/// Locate the rule's executable in `archive` and place it in `bin_dir`.
///
/// The format is `rule.format` if declared, else detected from the file
/// name. Archives are unpacked under `staging`; a raw binary download is
/// used as is. The archive must contain exactly one regular file named
/// `rule.binary`, at any depth.
///
/// # Errors
///
/// Extraction failures, a missing or ambiguous executable, or I/O errors
/// in the bin dir. The bin dir is untouched unless the final rename
/// succeeded.
pub fn install_archive(
    archive: &Path,
    rule: &InstallRule,
    staging: &Path,
    bin_dir: &Path,
) -> Result<InstalledBinary, PlacementError> {
    let format = match rule.format {
        Some(format) => format,
        None => extract::detect_format(archive)?,
    };
    let source = match format {
        ArchiveFormat::Binary => archive.to_path_buf(),
        format => {
            let unpack_dir = staging.join("unpacked");
            tracing::debug!(%format, archive = %archive.display(), "extracting");
            let files = extract::extract(format, archive, &unpack_dir)?;
            find_executable(files, &rule.binary)?
        }
    };

    place(&source, &rule.binary, bin_dir)
}

fn find_executable(
    files: Vec<extract::ExtractedFile>,
    binary: &str,
) -> Result<PathBuf, PlacementError> {
    let mut matches: Vec<_> = files
        .into_iter()
        .filter(|f| f.relative_path.file_name().is_some_and(|n| n == binary))
        .collect();

    match matches.len() {
        0 => Err(PlacementError::MissingExecutable {
            binary: binary.to_string(),
        }),
        1 => Ok(matches.remove(0).absolute_path),
        _ => Err(PlacementError::AmbiguousExecutable {
            binary: binary.to_string(),
            paths: matches.into_iter().map(|f| f.relative_path).collect(),
        }),
    }
}

fn place(source: &Path, binary: &str, bin_dir: &Path) -> Result<InstalledBinary, PlacementError> {
    fs::create_dir_all(bin_dir).at(bin_dir)?;
    remove_stale_placements(bin_dir);
    let target = bin_dir.join(binary);

    let mut tmp = tempfile::Builder::new()
        .prefix(PLACEMENT_PREFIX)
        .tempfile_in(bin_dir)
        .at(bin_dir)?;
    let mut input = File::open(source).at(source)?;
    let size = io::copy(&mut input, tmp.as_file_mut()).at(tmp.path())?;
    tmp.as_file().sync_all().at(tmp.path())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o755)).at(tmp.path())?;
    }

    tmp.persist(&target).map_err(|e| PlacementError::Io {
        path: target.clone(),
        source: e.error,
    })?;

    tracing::info!(path = %target.display(), size, "installed");
    Ok(InstalledBinary { path: target, size })
}

/// Remove placement temp files an interrupted run left in `bin_dir`.
fn remove_stale_placements(bin_dir: &Path) {
    let Ok(entries) = fs::read_dir(bin_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let stale = entry.file_name().to_string_lossy().starts_with(PLACEMENT_PREFIX)
            && entry.file_type().is_ok_and(|t| t.is_file());
        if stale {
            match fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed stale placement file"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove stale placement file"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn rule() -> InstallRule {
        InstallRule::new("dbui")
    }

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(gz);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_entry_type(tar::EntryType::Regular);
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap().flush().unwrap();
    }

    #[test]
    fn installs_binary_from_tar_gz() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("dbui_Linux_x86_64.tar.gz");
        write_tar_gz(
            &archive,
            &[("LICENSE", b"MIT"), ("dbui", b"#!/bin/sh\nexit 0\n")],
        );
        let bin_dir = dir.path().join("bin");

        let installed =
            install_archive(&archive, &rule(), &dir.path().join("stage"), &bin_dir).unwrap();

        assert_eq!(installed.path, bin_dir.join("dbui"));
        assert_eq!(installed.size, 17);
        assert_eq!(fs::read(&installed.path).unwrap(), b"#!/bin/sh\nexit 0\n");
        // Only the executable lands in the bin dir.
        assert_eq!(fs::read_dir(&bin_dir).unwrap().count(), 1);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&installed.path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn finds_binary_in_nested_directory() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("dbui.tar.gz");
        write_tar_gz(&archive, &[("dbui_0.1.2/bin/dbui", b"nested")]);
        let bin_dir = dir.path().join("bin");

        install_archive(&archive, &rule(), &dir.path().join("stage"), &bin_dir).unwrap();
        assert_eq!(fs::read(bin_dir.join("dbui")).unwrap(), b"nested");
    }

    #[test]
    fn missing_binary_leaves_bin_dir_untouched() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("dbui.tar.gz");
        write_tar_gz(&archive, &[("README.md", b"docs")]);
        let bin_dir = dir.path().join("bin");

        let err =
            install_archive(&archive, &rule(), &dir.path().join("stage"), &bin_dir).unwrap_err();
        assert!(matches!(err, PlacementError::MissingExecutable { .. }));
        assert!(!bin_dir.join("dbui").exists());
    }

    #[test]
    fn two_candidates_are_ambiguous() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("dbui.tar.gz");
        write_tar_gz(&archive, &[("a/dbui", b"one"), ("b/dbui", b"two")]);
        let bin_dir = dir.path().join("bin");

        let err =
            install_archive(&archive, &rule(), &dir.path().join("stage"), &bin_dir).unwrap_err();
        match err {
            PlacementError::AmbiguousExecutable { paths, .. } => assert_eq!(paths.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!bin_dir.join("dbui").exists());
    }

    #[test]
    fn raw_binary_is_placed_directly() {
        let dir = tempdir().unwrap();
        let download = dir.path().join("dbui_linux_amd64");
        fs::write(&download, b"raw").unwrap();
        let bin_dir = dir.path().join("bin");

        let installed =
            install_archive(&download, &rule(), &dir.path().join("stage"), &bin_dir).unwrap();
        assert_eq!(installed.path, bin_dir.join("dbui"));
        assert_eq!(fs::read(&installed.path).unwrap(), b"raw");
    }

    #[test]
    fn replaces_existing_binary() {
        let dir = tempdir().unwrap();
        let bin_dir = dir.path().join("bin");
        fs::create_dir_all(&bin_dir).unwrap();
        fs::write(bin_dir.join("dbui"), b"old").unwrap();

        let archive = dir.path().join("dbui.tar.gz");
        write_tar_gz(&archive, &[("dbui", b"new")]);
        install_archive(&archive, &rule(), &dir.path().join("stage"), &bin_dir).unwrap();

        assert_eq!(fs::read(bin_dir.join("dbui")).unwrap(), b"new");
    }

    #[test]
    fn unknown_archive_format_is_not_placed() {
        let dir = tempdir().unwrap();
        let bin_dir = dir.path().join("bin");
        fs::create_dir_all(&bin_dir).unwrap();
        fs::write(bin_dir.join("dbui"), b"working").unwrap();

        let archive = dir.path().join("dbui_Linux_x86_64.tar.xz");
        fs::write(&archive, b"\xfd7zXZ\0compressed-tarball-bytes").unwrap();

        let err =
            install_archive(&archive, &rule(), &dir.path().join("stage"), &bin_dir).unwrap_err();
        assert!(matches!(
            err,
            PlacementError::Extract(ExtractError::UnsupportedFormat(_))
        ));
        assert_eq!(fs::read(bin_dir.join("dbui")).unwrap(), b"working");
        assert_eq!(fs::read_dir(&bin_dir).unwrap().count(), 1);
    }

    #[test]
    fn declared_format_overrides_file_name() {
        let dir = tempdir().unwrap();
        let bin_dir = dir.path().join("bin");

        let download = dir.path().join("dbui-0.1.2.linux");
        fs::write(&download, b"raw").unwrap();
        let raw_rule = rule().with_format(ArchiveFormat::Binary);
        install_archive(&download, &raw_rule, &dir.path().join("stage"), &bin_dir).unwrap();
        assert_eq!(fs::read(bin_dir.join("dbui")).unwrap(), b"raw");

        let archive = dir.path().join("download");
        write_tar_gz(&archive, &[("dbui", b"from tarball")]);
        let tar_rule = rule().with_format(ArchiveFormat::TarGz);
        install_archive(&archive, &tar_rule, &dir.path().join("stage2"), &bin_dir).unwrap();
        assert_eq!(fs::read(bin_dir.join("dbui")).unwrap(), b"from tarball");
    }

    #[test]
    fn stale_placement_files_are_cleaned_up() {
        let dir = tempdir().unwrap();
        let bin_dir = dir.path().join("bin");
        fs::create_dir_all(&bin_dir).unwrap();
        let stale = bin_dir.join(format!("{PLACEMENT_PREFIX}a1b2c3"));
        fs::write(&stale, b"partial").unwrap();
        fs::write(bin_dir.join("other-tool"), b"keep").unwrap();

        let archive = dir.path().join("dbui.tar.gz");
        write_tar_gz(&archive, &[("dbui", b"new")]);
        install_archive(&archive, &rule(), &dir.path().join("stage"), &bin_dir).unwrap();

        assert!(!stale.exists());
        assert!(bin_dir.join("other-tool").exists());
        assert_eq!(fs::read_dir(&bin_dir).unwrap().count(), 2);
    }
}
