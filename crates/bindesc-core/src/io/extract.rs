//! Archive extraction module
//!
//! Handles tar.gz, tar.zst, plain tar and zip. Entries whose path would
//! escape the destination (absolute paths, `..` components) abort the
//! extraction; links and device entries are skipped.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

pub use bindesc_schema::ArchiveFormat;
use zstd::stream::Decoder as ZstdDecoder;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Unsafe path in archive: {}", .0.display())]
    UnsafePath(PathBuf),
}

/// Information about an extracted file
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    /// Path relative to extraction root
    pub relative_path: PathBuf,
    /// Absolute path on disk
    pub absolute_path: PathBuf,
    /// Whether the archive marked it executable
    pub is_executable: bool,
}

/// Detect archive format from the file name.
///
/// A query string or fragment left on a URL-derived name is ignored. A
/// name without any extension is taken to be the executable itself.
///
/// # Errors
///
/// [`ExtractError::UnsupportedFormat`] for any other extension
/// (`.tar.xz`, `.gz`, `.7z`, ...).
pub fn detect_format(path: &Path) -> Result<ArchiveFormat, ExtractError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let name = file_name.split(['?', '#']).next().unwrap_or_default();

    if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
        Ok(ArchiveFormat::TarZst)
    } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Ok(ArchiveFormat::TarGz)
    } else if name.ends_with(".tar") {
        Ok(ArchiveFormat::Tar)
    } else if name.ends_with(".zip") {
        Ok(ArchiveFormat::Zip)
    } else if !name.is_empty() && !name.contains('.') {
        Ok(ArchiveFormat::Binary)
    } else {
        Err(ExtractError::UnsupportedFormat(file_name))
    }
}

/// Extract an archive, auto-detecting format.
///
/// # Errors
///
/// See [`detect_format`] and [`extract`].
pub fn extract_auto(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    extract(detect_format(archive_path)?, archive_path, dest_dir)
}

/// Extract an archive of a known format.
///
/// # Errors
///
/// [`ExtractError::UnsupportedFormat`] for [`ArchiveFormat::Binary`], which
/// has nothing to unpack, and any read or unpack failure.
pub fn extract(
    format: ArchiveFormat,
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    match format {
        ArchiveFormat::TarZst => extract_tar_zst(archive_path, dest_dir),
        ArchiveFormat::TarGz => extract_tar_gz(archive_path, dest_dir),
        ArchiveFormat::Tar => {
            let file = File::open(archive_path)?;
            extract_tar(BufReader::new(file), dest_dir)
        }
        ArchiveFormat::Zip => extract_zip(archive_path, dest_dir),
        ArchiveFormat::Binary => Err(ExtractError::UnsupportedFormat(
            archive_path.display().to_string(),
        )),
    }
}

/// Extract a tar.zst archive to a destination directory
pub fn extract_tar_zst(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    let zstd_decoder = ZstdDecoder::new(reader)?;

    extract_tar(zstd_decoder, dest_dir)
}

/// Extract a tar.gz archive to a destination directory
pub fn extract_tar_gz(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let reader = BufReader::new(file);
    let gz_decoder = flate2::read::GzDecoder::new(reader);

    extract_tar(gz_decoder, dest_dir)
}

/// Reject absolute paths and any `..` component.
fn safe_relative(path: &Path) -> Result<PathBuf, ExtractError> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ExtractError::UnsafePath(path.to_path_buf()));
            }
        }
    }
    Ok(out)
}

/// Extract a tar archive from a reader
fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<Vec<ExtractedFile>, ExtractError> {
    fs::create_dir_all(dest_dir)?;

    let mut archive = tar::Archive::new(reader);
    let mut extracted_files = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let relative_path = safe_relative(&entry.path()?)?;
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            fs::create_dir_all(dest_dir.join(&relative_path))?;
            continue;
        }
        if !entry_type.is_file() {
            tracing::debug!(path = %relative_path.display(), "skipping non-regular tar entry");
            continue;
        }
        if relative_path.as_os_str().is_empty() {
            continue;
        }

        let absolute_path = dest_dir.join(&relative_path);
        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent)?;
        }

        entry.unpack(&absolute_path)?;

        let is_executable = entry
            .header()
            .mode()
            .map(|m| m & 0o111 != 0)
            .unwrap_or(false);

        extracted_files.push(ExtractedFile {
            relative_path,
            absolute_path,
            is_executable,
        });
    }

    Ok(extracted_files)
}

/// Extract a zip archive
pub fn extract_zip(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted_files = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;
        let relative_path = match file.enclosed_name() {
            Some(path) => path,
            None => return Err(ExtractError::UnsafePath(PathBuf::from(file.name()))),
        };

        if file.is_dir() {
            fs::create_dir_all(dest_dir.join(&relative_path))?;
            continue;
        }
        if file.unix_mode().is_some_and(|m| m & 0o170000 == 0o120000) {
            tracing::debug!(path = %relative_path.display(), "skipping zip symlink");
            continue;
        }

        let absolute_path = dest_dir.join(&relative_path);
        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        let is_executable = file.unix_mode().is_some_and(|mode| mode & 0o111 != 0);

        extracted_files.push(ExtractedFile {
            relative_path,
            absolute_path,
            is_executable,
        });
    }

    Ok(extracted_files)
}
