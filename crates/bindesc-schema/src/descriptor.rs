//! The installer descriptor: a static table from [`ReleaseTarget`] to
//! [`ArtifactReference`], plus the placement and smoke-test rules.
//!
//! Platform branching is data, not code: supporting a new platform means
//! adding one `[[artifact]]` entry.
//!
//! ```toml
//! [package]
//! name = "dbui"
//! description = "Terminal UI for databases"
//! homepage = "https://github.com/kenanbek/dbui"
//! version = "0.1.2"
//!
//! [[artifact]]
//! os = "darwin"
//! arch = "x86_64"
//! url = "https://github.com/KenanBek/dbui/releases/download/v0.1.2/dbui_Darwin_x86_64.tar.gz"
//! sha256 = "cba11850c2516d18271d746cc58b511634207dd79700960a6a20d34eaa198628"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arch::{Arch, Os, ReleaseTarget};
use crate::hash::Sha256Digest;
use crate::types::{
    ArchiveFormat, ArtifactError, ArtifactReference, InstallRule, PackageMetadata, PackageName,
    VerificationRule, Version,
};

/// The requested platform has no entry in the descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "{package} {version} has no release for {target} (supported: {})",
    join_targets(.supported)
)]
pub struct NotSupportedError {
    /// Package being resolved.
    pub package: PackageName,
    /// Its version.
    pub version: Version,
    /// The platform that was asked for.
    pub target: ReleaseTarget,
    /// Every platform the descriptor does list.
    pub supported: Vec<ReleaseTarget>,
}

fn join_targets(targets: &[ReleaseTarget]) -> String {
    targets
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while assembling a descriptor from its parts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Package metadata is incomplete or the version is not semver.
    #[error("Invalid package metadata: {0}")]
    Metadata(ArtifactError),

    /// An artifact entry failed validation.
    #[error("Invalid artifact for {target}: {source}")]
    Artifact {
        /// Target the entry belongs to.
        target: ReleaseTarget,
        /// What was wrong with it.
        source: ArtifactError,
    },

    /// Two entries share the same (os, arch) pair.
    #[error("Duplicate artifact entry for {0}")]
    DuplicateTarget(ReleaseTarget),

    /// The descriptor lists no artifacts at all.
    #[error("Descriptor declares no artifacts")]
    NoArtifacts,

    /// The executable name is empty or contains a path separator.
    #[error("Invalid binary name '{0}': must be a bare file name")]
    InvalidBinary(String),

    /// The smoke-test timeout is zero seconds.
    #[error("Invalid test timeout: timeout_secs must be at least 1")]
    ZeroTimeout,
}

/// Read-only view of an installer descriptor, consumed by the installer.
///
/// [`FormulaDescriptor`] is the concrete record; the trait keeps the
/// installation flow independent of where the record came from.
pub trait Descriptor {
    /// Descriptive fields (name, version, ...).
    fn metadata(&self) -> &PackageMetadata;

    /// The platform lookup table.
    fn artifacts(&self) -> &BTreeMap<ReleaseTarget, ArtifactReference>;

    /// Where the fetched executable goes.
    fn install_rule(&self) -> &InstallRule;

    /// How the installed executable is smoke-tested.
    fn verification_rule(&self) -> &VerificationRule;

    /// All platforms with a release, in sorted order.
    fn supported_targets(&self) -> Vec<ReleaseTarget> {
        self.artifacts().keys().copied().collect()
    }

    /// Look up the artifact for `target`.
    ///
    /// Pure table lookup: no network or filesystem access.
    ///
    /// # Errors
    ///
    /// Returns [`NotSupportedError`] if the descriptor has no entry for
    /// `target`.
    fn resolve_target(
        &self,
        target: ReleaseTarget,
    ) -> Result<&ArtifactReference, NotSupportedError> {
        self.artifacts()
            .get(&target)
            .ok_or_else(|| NotSupportedError {
                package: self.metadata().name.clone(),
                version: self.metadata().version.clone(),
                target,
                supported: self.supported_targets(),
            })
    }
}

/// A validated installer descriptor for one versioned release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor", into = "RawDescriptor")]
pub struct FormulaDescriptor {
    metadata: PackageMetadata,
    artifacts: BTreeMap<ReleaseTarget, ArtifactReference>,
    install: InstallRule,
    test: VerificationRule,
}

impl FormulaDescriptor {
    /// Assemble and validate a descriptor.
    ///
    /// # Errors
    ///
    /// Returns a [`DescriptorError`] if the metadata or any artifact is
    /// invalid, a target appears twice, no artifacts are given, the
    /// binary name is not a bare file name, or the test timeout is zero.
    pub fn new(
        metadata: PackageMetadata,
        install: InstallRule,
        test: VerificationRule,
        artifacts: impl IntoIterator<Item = (ReleaseTarget, ArtifactReference)>,
    ) -> Result<Self, DescriptorError> {
        metadata.validate().map_err(DescriptorError::Metadata)?;

        let binary = install.binary.as_str();
        if binary.is_empty() || binary.contains(['/', '\\']) || binary == "." || binary == ".." {
            return Err(DescriptorError::InvalidBinary(install.binary));
        }
        if test.timeout_secs == 0 {
            return Err(DescriptorError::ZeroTimeout);
        }

        let mut table = BTreeMap::new();
        for (target, artifact) in artifacts {
            artifact
                .validate()
                .map_err(|source| DescriptorError::Artifact { target, source })?;
            if table.insert(target, artifact).is_some() {
                return Err(DescriptorError::DuplicateTarget(target));
            }
        }
        if table.is_empty() {
            return Err(DescriptorError::NoArtifacts);
        }

        Ok(Self {
            metadata,
            artifacts: table,
            install,
            test,
        })
    }
}

impl Descriptor for FormulaDescriptor {
    fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    fn artifacts(&self) -> &BTreeMap<ReleaseTarget, ArtifactReference> {
        &self.artifacts
    }

    fn install_rule(&self) -> &InstallRule {
        &self.install
    }

    fn verification_rule(&self) -> &VerificationRule {
        &self.test
    }
}

/// On-disk shape: `[package]`, optional `[install]`/`[test]`, `[[artifact]]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDescriptor {
    package: PackageMetadata,
    #[serde(default)]
    install: RawInstall,
    #[serde(default)]
    test: VerificationRule,
    #[serde(default, rename = "artifact")]
    artifacts: Vec<RawArtifact>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawInstall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    binary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<ArchiveFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawArtifact {
    os: Os,
    arch: Arch,
    url: String,
    sha256: Sha256Digest,
}

impl TryFrom<RawDescriptor> for FormulaDescriptor {
    type Error = DescriptorError;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        let binary = raw
            .install
            .binary
            .unwrap_or_else(|| raw.package.name.to_string());
        let artifacts = raw.artifacts.into_iter().map(|a| {
            (
                ReleaseTarget::new(a.os, a.arch),
                ArtifactReference::new(a.url, a.sha256),
            )
        });
        let install = InstallRule {
            binary,
            format: raw.install.format,
        };
        Self::new(raw.package, install, raw.test, artifacts)
    }
}

impl From<FormulaDescriptor> for RawDescriptor {
    fn from(desc: FormulaDescriptor) -> Self {
        Self {
            package: desc.metadata,
            install: RawInstall {
                binary: Some(desc.install.binary),
                format: desc.install.format,
            },
            test: desc.test,
            artifacts: desc
                .artifacts
                .into_iter()
                .map(|(target, a)| RawArtifact {
                    os: target.os,
                    arch: target.arch,
                    url: a.url,
                    sha256: a.sha256,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DARWIN_SHA: &str = "cba11850c2516d18271d746cc58b511634207dd79700960a6a20d34eaa198628";
    const LINUX_SHA: &str = "84df2980178a7a025e75304ba041ed2a35071a4b73b3bbd15143bbc08252e869";

    fn metadata() -> PackageMetadata {
        PackageMetadata {
            name: PackageName::new("dbui"),
            description: "Terminal UI for databases".to_string(),
            homepage: "https://github.com/kenanbek/dbui".to_string(),
            version: Version::new("0.1.2"),
        }
    }

    fn artifact(file: &str, sha: &str) -> ArtifactReference {
        ArtifactReference::new(
            format!("https://github.com/KenanBek/dbui/releases/download/v0.1.2/{file}"),
            Sha256Digest::new(sha).unwrap(),
        )
    }

    fn dbui() -> FormulaDescriptor {
        FormulaDescriptor::new(
            metadata(),
            InstallRule::new("dbui"),
            VerificationRule::default(),
            [
                (
                    ReleaseTarget::new(Os::MacOs, Arch::X86_64),
                    artifact("dbui_Darwin_x86_64.tar.gz", DARWIN_SHA),
                ),
                (
                    ReleaseTarget::new(Os::Linux, Arch::X86_64),
                    artifact("dbui_Linux_x86_64.tar.gz", LINUX_SHA),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn every_declared_target_resolves_to_exactly_one_artifact() {
        let desc = dbui();
        for target in desc.supported_targets() {
            let artifact = desc.resolve_target(target).unwrap();
            assert_eq!(desc.artifacts()[&target], *artifact);
        }
        assert_eq!(desc.supported_targets().len(), 2);
    }

    #[test]
    fn darwin_x86_64_resolves_to_darwin_archive() {
        let desc = dbui();
        let artifact = desc
            .resolve_target(ReleaseTarget::new(Os::MacOs, Arch::X86_64))
            .unwrap();
        assert!(artifact.url.ends_with("dbui_Darwin_x86_64.tar.gz"));
        assert!(artifact.sha256.as_str().starts_with("cba1185"));
    }

    #[test]
    fn linux_arm64_is_not_supported() {
        let desc = dbui();
        let err = desc
            .resolve_target(ReleaseTarget::new(Os::Linux, Arch::Arm64))
            .unwrap_err();
        assert_eq!(err.target, ReleaseTarget::new(Os::Linux, Arch::Arm64));
        assert_eq!(err.supported.len(), 2);
        assert_eq!(
            err.to_string(),
            "dbui 0.1.2 has no release for linux/arm64 (supported: darwin/x86_64, linux/x86_64)"
        );
    }

    #[test]
    fn duplicate_targets_are_rejected() {
        let target = ReleaseTarget::new(Os::Linux, Arch::X86_64);
        let err = FormulaDescriptor::new(
            metadata(),
            InstallRule::new("dbui"),
            VerificationRule::default(),
            [
                (target, artifact("a.tar.gz", LINUX_SHA)),
                (target, artifact("b.tar.gz", LINUX_SHA)),
            ],
        )
        .unwrap_err();
        assert_eq!(err, DescriptorError::DuplicateTarget(target));
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = FormulaDescriptor::new(
            metadata(),
            InstallRule::new("dbui"),
            VerificationRule::default(),
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, DescriptorError::NoArtifacts);
    }

    #[test]
    fn binary_must_be_a_bare_file_name() {
        let err = FormulaDescriptor::new(
            metadata(),
            InstallRule::new("../dbui"),
            VerificationRule::default(),
            [(
                ReleaseTarget::new(Os::Linux, Arch::X86_64),
                artifact("dbui_Linux_x86_64.tar.gz", LINUX_SHA),
            )],
        )
        .unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidBinary(_)));
    }

    #[test]
    fn insecure_artifact_url_is_rejected() {
        let target = ReleaseTarget::new(Os::Linux, Arch::X86_64);
        let err = FormulaDescriptor::new(
            metadata(),
            InstallRule::new("dbui"),
            VerificationRule::default(),
            [(
                target,
                ArtifactReference::new(
                    "http://example.com/dbui.tar.gz",
                    Sha256Digest::new(LINUX_SHA).unwrap(),
                ),
            )],
        )
        .unwrap_err();
        assert!(matches!(err, DescriptorError::Artifact { target: t, .. } if t == target));
    }

    #[test]
    fn zero_test_timeout_is_rejected() {
        let err = FormulaDescriptor::new(
            metadata(),
            InstallRule::new("dbui"),
            VerificationRule {
                args: Vec::new(),
                timeout_secs: 0,
            },
            [(
                ReleaseTarget::new(Os::Linux, Arch::X86_64),
                artifact("dbui_Linux_x86_64.tar.gz", LINUX_SHA),
            )],
        )
        .unwrap_err();
        assert_eq!(err, DescriptorError::ZeroTimeout);
    }
}
