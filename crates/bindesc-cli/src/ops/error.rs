//! Domain-specific errors for installation

use std::fmt;

use bindesc_core::descriptor::LoadError;
use bindesc_core::install::PlacementError;
use bindesc_core::io::download::DownloadError;
use bindesc_core::selftest::SelfTestFailure;
use bindesc_schema::NotSupportedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    NotSupported(#[from] NotSupportedError),

    #[error("Failed to fetch {url}: {source}")]
    Network { url: String, source: DownloadError },

    #[error("Integrity check failed for {url}: expected sha256 {expected}, got {actual}")]
    Integrity {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Staging error: {0}")]
    Staging(#[from] std::io::Error),

    #[error("Install failed: {0}")]
    Filesystem(#[from] PlacementError),

    #[error("Smoke test failed: {0}")]
    SelfTest(#[from] SelfTestFailure),

    #[error("Invalid descriptor: {0}")]
    Descriptor(#[from] LoadError),

    #[error("Task panic: {0}")]
    Task(String),
}

impl InstallError {
    /// Classify a download failure for `url`.
    ///
    /// A digest mismatch is always `Integrity`, never `Network`.
    pub fn download(url: &str, err: DownloadError) -> Self {
        match err {
            DownloadError::HashMismatch { expected, actual } => Self::Integrity {
                url: url.to_string(),
                expected,
                actual,
            },
            DownloadError::Io(e) => Self::Staging(e),
            source @ (DownloadError::Http(_) | DownloadError::Transport(_)) => Self::Network {
                url: url.to_string(),
                source,
            },
        }
    }
}

/// Pipeline position; a failure halts in the stage it occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    NotInstalled,
    Downloading,
    Verified,
    Installed,
    Tested,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotInstalled => "not installed",
            Self::Downloading => "downloading",
            Self::Verified => "verified",
            Self::Installed => "installed",
            Self::Tested => "tested",
        };
        f.write_str(name)
    }
}

/// An [`InstallError`] together with the stage the pipeline stopped in.
#[derive(Error, Debug)]
#[error("Installation halted at stage '{stage}'")]
pub struct Halted {
    pub stage: Stage,
    #[source]
    pub error: InstallError,
}

impl Halted {
    pub fn at(stage: Stage) -> impl FnOnce(InstallError) -> Self {
        move |error| Self { stage, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_mismatch_is_integrity_not_network() {
        let err = InstallError::download(
            "https://example.com/dbui.tar.gz",
            DownloadError::HashMismatch {
                expected: "aa".to_string(),
                actual: "bb".to_string(),
            },
        );
        match err {
            InstallError::Integrity {
                url,
                expected,
                actual,
            } => {
                assert_eq!(url, "https://example.com/dbui.tar.gz");
                assert_eq!(expected, "aa");
                assert_eq!(actual, "bb");
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn staging_io_is_not_network() {
        let err = InstallError::download(
            "https://example.com/dbui.tar.gz",
            DownloadError::Io(std::io::Error::other("disk full")),
        );
        assert!(matches!(err, InstallError::Staging(_)));
    }

    #[test]
    fn halted_names_the_stage() {
        let halted = Halted::at(Stage::Downloading)(InstallError::Task("boom".to_string()));
        assert_eq!(
            halted.to_string(),
            "Installation halted at stage 'downloading'"
        );
        assert!(std::error::Error::source(&halted).is_some());
    }

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::NotInstalled < Stage::Downloading);
        assert!(Stage::Installed < Stage::Tested);
    }
}
