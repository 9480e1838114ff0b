//! Verified artifact download.
//!
//! Bytes are hashed as they are written. A file whose digest does not match
//! is deleted before the error is returned, so a partial or tampered
//! archive never survives in the staging area.

use std::path::{Path, PathBuf};

use bindesc_schema::{PackageName, Sha256Digest, Version};
use futures::StreamExt;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use super::fetch::Fetcher;
use crate::Reporter;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}

/// An archive on disk whose bytes hash to the expected digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedArchive {
    pub path: PathBuf,
    pub sha256: String,
    pub size: u64,
}

/// Request for a download operation
pub struct DownloadRequest<'a, R: Reporter + ?Sized> {
    pub fetcher: &'a dyn Fetcher,
    pub pkg_name: &'a PackageName,
    pub version: &'a Version,
    pub url: &'a str,
    pub dest: &'a Path,
    pub expected_hash: &'a Sha256Digest,
    pub reporter: &'a R,
}

impl<'a, R: Reporter + ?Sized> DownloadRequest<'a, R> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        pkg_name: &'a PackageName,
        version: &'a Version,
        url: &'a str,
        dest: &'a Path,
        expected_hash: &'a Sha256Digest,
        reporter: &'a R,
    ) -> Self {
        Self {
            fetcher,
            pkg_name,
            version,
            url,
            dest,
            expected_hash,
            reporter,
        }
    }

    /// Download to `dest` and verify the digest.
    ///
    /// # Errors
    ///
    /// Transport and I/O failures, or [`DownloadError::HashMismatch`]. In
    /// every error case `dest` does not exist afterwards.
    pub async fn execute(self) -> Result<VerifiedArchive, DownloadError> {
        let dest = self.dest;
        match download_and_verify(self).await {
            Ok(archive) => Ok(archive),
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(dest).await
                    && rm.kind() != std::io::ErrorKind::NotFound
                {
                    tracing::warn!(path = %dest.display(), error = %rm, "failed to remove partial download");
                }
                Err(e)
            }
        }
    }
}

async fn download_and_verify<R: Reporter + ?Sized>(
    req: DownloadRequest<'_, R>,
) -> Result<VerifiedArchive, DownloadError> {
    let response = req.fetcher.open(req.url).await?;
    let total_size = response.content_length;
    req.reporter
        .downloading(req.pkg_name, req.version, 0, total_size);

    let mut file = File::create(req.dest).await?;
    let mut stream = response.body;
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
        req.reporter
            .downloading(req.pkg_name, req.version, downloaded, total_size);
    }

    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    let actual_hash = hex::encode(hasher.finalize());
    if !req.expected_hash.matches(&actual_hash) {
        return Err(DownloadError::HashMismatch {
            expected: req.expected_hash.to_string(),
            actual: actual_hash,
        });
    }

    tracing::debug!(url = req.url, bytes = downloaded, "digest verified");
    req.reporter
        .verified(req.pkg_name, req.version, &actual_hash);

    Ok(VerifiedArchive {
        path: req.dest.to_path_buf(),
        sha256: actual_hash,
        size: downloaded,
    })
}
