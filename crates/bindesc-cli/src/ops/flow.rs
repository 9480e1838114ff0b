//! Installation Flow Typestate Pattern
//!
//! Models the installation pipeline as a series of explicit state transitions:
//!
//! ```text
//! NotInstalled --[download()]--> Verified --[install()]--> Installed --[test()]--> Tested
//! ```
//!
//! Each transition consumes the prior state, so an archive cannot be placed
//! before its digest matched and a binary cannot be smoke-tested before it
//! was placed. `Downloading` is the transient stage inside `download()`.
//!
//! # Usage
//!
//! ```ignore
//! use crate::ops::flow::NotInstalled;
//!
//! let pending = NotInstalled::resolve(&descriptor, target)?;
//! let verified = pending.download(&ctx).await?;
//! let installed = verified.install(&ctx).await?;
//! let tested = installed.test(&ctx).await?;
//! ```

use tempfile::TempDir;

use crate::ops::{Context, Halted, InstallError, Stage};
use bindesc_core::install::{self, InstalledBinary};
use bindesc_core::io::download::{DownloadRequest, VerifiedArchive};
use bindesc_core::selftest::{self, SelfTestOutcome};
use bindesc_schema::{ArtifactReference, Descriptor, ReleaseTarget};

/// State 1: the artifact for the requested target is known, nothing has
/// been fetched or written.
#[derive(Debug)]
pub struct NotInstalled<'d, D: Descriptor + ?Sized> {
    pub descriptor: &'d D,
    pub target: ReleaseTarget,
    pub artifact: &'d ArtifactReference,
}

/// State 2: the archive is in a private staging directory and its digest
/// matched.
#[derive(Debug)]
pub struct Verified<'d, D: Descriptor + ?Sized> {
    pub descriptor: &'d D,
    pub target: ReleaseTarget,
    pub archive: VerifiedArchive,
    /// Removed on drop, taking the archive and any extracted files with it.
    pub staging: TempDir,
}

/// State 3: the executable is in the bin dir.
#[derive(Debug)]
pub struct Installed<'d, D: Descriptor + ?Sized> {
    pub descriptor: &'d D,
    pub target: ReleaseTarget,
    pub archive_sha256: String,
    pub binary: InstalledBinary,
}

/// State 4: the installed executable ran successfully.
#[derive(Debug)]
pub struct Tested {
    pub target: ReleaseTarget,
    pub archive_sha256: String,
    pub binary: InstalledBinary,
    pub outcome: SelfTestOutcome,
}

impl<'d, D: Descriptor + ?Sized> NotInstalled<'d, D> {
    /// Look up the artifact for `target`. No network or filesystem action.
    pub fn resolve(descriptor: &'d D, target: ReleaseTarget) -> Result<Self, InstallError> {
        let artifact = descriptor.resolve_target(target)?;
        Ok(Self {
            descriptor,
            target,
            artifact,
        })
    }

    /// Fetch the archive into a fresh staging directory and verify it.
    pub async fn download(self, ctx: &Context) -> Result<Verified<'d, D>, InstallError> {
        let meta = self.descriptor.metadata();

        std::fs::create_dir_all(&ctx.staging_root)?;
        let staging = tempfile::Builder::new()
            .prefix("bindesc-")
            .tempdir_in(&ctx.staging_root)?;

        let file_name = match self.artifact.file_name() {
            "" => "artifact",
            name => name,
        };
        let dest = staging.path().join(file_name);

        tracing::debug!(release = %self.target, url = %self.artifact.url, "downloading");
        let archive = DownloadRequest::new(
            &*ctx.fetcher,
            &meta.name,
            &meta.version,
            &self.artifact.url,
            &dest,
            &self.artifact.sha256,
            &*ctx.reporter,
        )
        .execute()
        .await
        .map_err(|e| InstallError::download(&self.artifact.url, e))?;

        Ok(Verified {
            descriptor: self.descriptor,
            target: self.target,
            archive,
            staging,
        })
    }
}

impl<'d, D: Descriptor + ?Sized> Verified<'d, D> {
    /// Extract and place the executable. The staging directory is removed
    /// whether or not placement succeeds.
    pub async fn install(self, ctx: &Context) -> Result<Installed<'d, D>, InstallError> {
        let meta = self.descriptor.metadata();
        ctx.reporter.installing(&meta.name, &meta.version);

        let archive_path = self.archive.path.clone();
        let rule = self.descriptor.install_rule().clone();
        let staging_path = self.staging.path().to_path_buf();
        let bin_dir = ctx.bin_dir.clone();

        let binary = tokio::task::spawn_blocking(move || {
            install::install_archive(&archive_path, &rule, &staging_path, &bin_dir)
        })
        .await
        .map_err(|e| InstallError::Task(e.to_string()))??;

        if let Err(e) = self.staging.close() {
            tracing::warn!(error = %e, "failed to remove staging directory");
        }

        Ok(Installed {
            descriptor: self.descriptor,
            target: self.target,
            archive_sha256: self.archive.sha256,
            binary,
        })
    }
}

impl<D: Descriptor + ?Sized> Installed<'_, D> {
    /// Run the verification rule against the placed executable.
    pub async fn test(self, ctx: &Context) -> Result<Tested, InstallError> {
        let meta = self.descriptor.metadata();
        ctx.reporter.testing(&meta.name, &meta.version);

        let path = self.binary.path.clone();
        let rule = self.descriptor.verification_rule().clone();
        let outcome = tokio::task::spawn_blocking(move || selftest::run(&path, &rule))
            .await
            .map_err(|e| InstallError::Task(e.to_string()))??;

        tracing::debug!(elapsed_ms = outcome.elapsed.as_millis(), "smoke test passed");
        Ok(Tested {
            target: self.target,
            archive_sha256: self.archive_sha256,
            binary: self.binary,
            outcome,
        })
    }
}

/// How far [`run`] took the pipeline.
#[derive(Debug)]
pub enum Completed {
    /// Placed; the smoke test was skipped.
    Installed {
        archive_sha256: String,
        binary: InstalledBinary,
    },
    /// Placed and smoke-tested.
    Tested(Tested),
}

impl Completed {
    pub fn binary(&self) -> &InstalledBinary {
        match self {
            Self::Installed { binary, .. } | Self::Tested(Tested { binary, .. }) => binary,
        }
    }
}

/// Drive the whole pipeline for `target`.
///
/// # Errors
///
/// Returns [`Halted`] carrying the failing stage and the untouched
/// [`InstallError`].
pub async fn run<D: Descriptor + ?Sized>(
    descriptor: &D,
    target: ReleaseTarget,
    ctx: &Context,
    skip_test: bool,
) -> Result<Completed, Halted> {
    let pending = NotInstalled::resolve(descriptor, target).map_err(Halted::at(Stage::NotInstalled))?;
    let verified = pending
        .download(ctx)
        .await
        .map_err(Halted::at(Stage::Downloading))?;
    let installed = verified
        .install(ctx)
        .await
        .map_err(Halted::at(Stage::Verified))?;

    if skip_test {
        return Ok(Completed::Installed {
            archive_sha256: installed.archive_sha256,
            binary: installed.binary,
        });
    }

    let tested = installed
        .test(ctx)
        .await
        .map_err(Halted::at(Stage::Installed))?;
    Ok(Completed::Tested(tested))
}
