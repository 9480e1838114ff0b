//! Descriptor building blocks: artifact references, package metadata and
//! the placement and smoke-test rules.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

use crate::hash::Sha256Digest;

/// A downloadable, verifiable release archive: where to fetch it and what it
/// must hash to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReference {
    /// Download URL (HTTPS).
    pub url: String,

    /// Expected SHA256 digest of the bytes served at `url`.
    pub sha256: Sha256Digest,
}

/// Errors that can occur when validating an [`ArtifactReference`] or
/// [`PackageMetadata`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    /// A required field is empty.
    #[error("Empty field: {0}")]
    EmptyField(String),

    /// The download URL is malformed or uses an unsupported scheme.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The version is not a semantic version.
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion {
        /// The rejected version string.
        version: String,
        /// Parser message.
        reason: String,
    },
}

impl ArtifactReference {
    /// Create a reference from a URL and an already-validated digest.
    pub fn new(url: impl Into<String>, sha256: Sha256Digest) -> Self {
        Self {
            url: url.into(),
            sha256,
        }
    }

    /// Validates the URL. The digest is validated by construction.
    ///
    /// Only `https://` is accepted, except that plain `http://` is allowed
    /// for loopback hosts (local mirrors, test servers).
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::EmptyField`] if the URL is empty, or
    /// [`ArtifactError::InvalidUrl`] if its scheme is not allowed.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.url.is_empty() {
            return Err(ArtifactError::EmptyField("url".to_string()));
        }
        if self.url.starts_with("https://") {
            return Ok(());
        }
        if let Some(rest) = self.url.strip_prefix("http://")
            && matches!(url_host(rest), Some("localhost" | "127.0.0.1" | "::1"))
        {
            return Ok(());
        }
        Err(ArtifactError::InvalidUrl {
            url: self.url.clone(),
            reason: "must use https://".to_string(),
        })
    }

    /// Final path segment of the URL (e.g. `dbui_Darwin_x86_64.tar.gz`),
    /// without any query string or fragment.
    pub fn file_name(&self) -> &str {
        let path = self.url.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/').next().unwrap_or_default()
    }
}

/// Host part of a URL with its scheme already removed. Userinfo
/// (`user:pass@`) and the port are dropped.
fn url_host(rest: &str) -> Option<&str> {
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    match host_port.strip_prefix('[') {
        Some(v6) => v6.split(']').next(),
        None => host_port.split(':').next(),
    }
}

/// Descriptive package fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    /// Package (and by default executable) name.
    pub name: PackageName,
    /// One-line summary.
    pub description: String,
    /// Project homepage.
    pub homepage: String,
    /// Upstream release version.
    pub version: Version,
}

impl PackageMetadata {
    /// Checks that every field is non-empty and the version is semver.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::EmptyField`] naming the first empty field,
    /// or [`ArtifactError::InvalidVersion`].
    pub fn validate(&self) -> Result<(), ArtifactError> {
        let fields = [
            ("name", self.name.as_str()),
            ("description", self.description.as_str()),
            ("homepage", self.homepage.as_str()),
            ("version", self.version.as_str()),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ArtifactError::EmptyField((*field).to_string()));
        }
        self.version.semver().map(|_| ())
    }
}

/// Container format of a release download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// Gzip-compressed tarball (`.tar.gz`, `.tgz`).
    #[serde(rename = "tar.gz", alias = "tgz")]
    TarGz,
    /// Zstandard-compressed tarball (`.tar.zst`, `.tzst`).
    #[serde(rename = "tar.zst", alias = "tzst")]
    TarZst,
    /// Uncompressed tarball.
    #[serde(rename = "tar")]
    Tar,
    /// Zip archive.
    #[serde(rename = "zip")]
    Zip,
    /// Not an archive: the download is the executable itself.
    #[serde(rename = "binary")]
    Binary,
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::TarGz => "tar.gz",
            Self::TarZst => "tar.zst",
            Self::Tar => "tar",
            Self::Zip => "zip",
            Self::Binary => "binary",
        })
    }
}

/// Placement rule: which file of the archive becomes the installed executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRule {
    /// Name of the executable inside the archive, also its name in the
    /// binary directory.
    pub binary: String,

    /// Container format. When unset it is inferred from the download's
    /// file name; a raw binary must be declared unless the name has no
    /// extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ArchiveFormat>,
}

impl InstallRule {
    /// Rule for `binary` with the format inferred from the file name.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            format: None,
        }
    }

    /// Declare the container format explicitly.
    #[must_use]
    pub fn with_format(mut self, format: ArchiveFormat) -> Self {
        self.format = Some(format);
        self
    }
}

/// Post-install smoke test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRule {
    /// Arguments passed to the installed binary (empty: run it bare).
    #[serde(default)]
    pub args: Vec<String>,

    /// Seconds to wait before the binary is considered hung and killed.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for VerificationRule {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// A normalized package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name, normalizing the input to lowercase.
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Homebrew formula class name (`dbui` -> `Dbui`, `my-tool` -> `MyTool`).
    pub fn class_name(&self) -> String {
        self.0
            .split(['-', '_', '.'])
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars).collect()
                })
            })
            .collect()
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

/// A semantic version string.
///
/// Stored as written (e.g. `0.1.2`) so it can be substituted back into
/// release URLs; [`semver()`](Self::semver) checks it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Create a new version from the given string (stored as-is).
    pub fn new(v: &str) -> Self {
        Self(v.to_string())
    }

    /// Return the version string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse as a semantic version, tolerating a leading `v`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::InvalidVersion`] if the string is not semver.
    pub fn semver(&self) -> Result<semver::Version, ArtifactError> {
        let raw = self.0.strip_prefix('v').unwrap_or(&self.0);
        semver::Version::parse(raw).map_err(|e| ArtifactError::InvalidVersion {
            version: self.0.clone(),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for Version {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest() -> Sha256Digest {
        Sha256Digest::new("84df2980178a7a025e75304ba041ed2a35071a4b73b3bbd15143bbc08252e869")
            .unwrap()
    }

    fn metadata() -> PackageMetadata {
        PackageMetadata {
            name: PackageName::new("dbui"),
            description: "Terminal UI for databases".to_string(),
            homepage: "https://github.com/kenanbek/dbui".to_string(),
            version: Version::new("0.1.2"),
        }
    }

    #[test]
    fn https_url_is_valid() {
        let artifact = ArtifactReference::new("https://example.com/dbui.tar.gz", digest());
        assert!(artifact.validate().is_ok());
        assert_eq!(artifact.file_name(), "dbui.tar.gz");
    }

    #[test]
    fn plain_http_only_for_loopback() {
        let local = ArtifactReference::new("http://127.0.0.1:8080/dbui.tar.gz", digest());
        assert!(local.validate().is_ok());

        let local_v6 = ArtifactReference::new("http://[::1]:8080/dbui.tar.gz", digest());
        assert!(local_v6.validate().is_ok());

        let remote = ArtifactReference::new("http://example.com/dbui.tar.gz", digest());
        assert!(matches!(
            remote.validate(),
            Err(ArtifactError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn userinfo_does_not_pass_as_loopback() {
        for url in [
            "http://localhost:80@evil.example.com/dbui.tar.gz",
            "http://127.0.0.1@evil.example.com/dbui.tar.gz",
            "http://user:pw@evil.example.com:8080/dbui.tar.gz",
        ] {
            let artifact = ArtifactReference::new(url, digest());
            assert!(artifact.validate().is_err(), "accepted {url}");
        }

        let local = ArtifactReference::new("http://user@localhost:8080/dbui.tar.gz", digest());
        assert!(local.validate().is_ok());
    }

    #[test]
    fn file_name_ignores_query_and_fragment() {
        let artifact =
            ArtifactReference::new("https://example.com/v1/dbui.tar.gz?dl=1#top", digest());
        assert_eq!(artifact.file_name(), "dbui.tar.gz");
    }

    #[test]
    fn archive_format_names() {
        assert_eq!(ArchiveFormat::TarGz.to_string(), "tar.gz");
        assert_eq!(ArchiveFormat::Binary.to_string(), "binary");
        let rule = InstallRule::new("dbui").with_format(ArchiveFormat::Zip);
        assert_eq!(rule.format, Some(ArchiveFormat::Zip));
    }

    #[test]
    fn empty_url_is_rejected() {
        let artifact = ArtifactReference::new("", digest());
        assert_eq!(
            artifact.validate(),
            Err(ArtifactError::EmptyField("url".to_string()))
        );
    }

    #[test]
    fn metadata_requires_non_empty_fields() {
        assert!(metadata().validate().is_ok());

        let mut meta = metadata();
        meta.homepage = "  ".to_string();
        assert_eq!(
            meta.validate(),
            Err(ArtifactError::EmptyField("homepage".to_string()))
        );
    }

    #[test]
    fn metadata_requires_semver() {
        let mut meta = metadata();
        meta.version = Version::new("latest");
        assert!(matches!(
            meta.validate(),
            Err(ArtifactError::InvalidVersion { .. })
        ));

        meta.version = Version::new("v0.1.2");
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn package_name_normalizes_and_builds_class_name() {
        let name = PackageName::new("DBUI");
        assert_eq!(name, "dbui");
        assert_eq!(name.class_name(), "Dbui");
        assert_eq!(PackageName::new("my-db_tool").class_name(), "MyDbTool");
    }
}
