//! bindesc - install a pre-built release from a verified descriptor
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_panics_doc)]
//!
//! Installs the `dbui` terminal database client from its published release
//! archives, driven entirely by a static descriptor.
//!
//! # Architecture
//!
//! - **Lookup table**: the descriptor maps each `ReleaseTarget` (os, arch)
//!   to one archive URL and SHA-256 digest. Adding a platform is a data change.
//! - **Typestate Pattern**: installation moves through `NotInstalled` →
//!   `Verified` → `Installed` → `Tested`; each step consumes the previous state.
//! - **Collaborator seams**: downloads go through the `Fetcher` trait and
//!   progress through the `Reporter` trait, both injected via `ops::Context`.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.bindesc/
//! ├── bin/        # Installed executables (override: BINDESC_BIN_DIR)
//! └── tmp/        # Per-install staging, removed when the install ends
//! ```

pub mod cmd;
pub mod ops;
pub mod ui;

use bindesc_schema::{Arch, Os, ReleaseTarget};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "bindesc")]
#[command(author, version = env!("BINDESC_VERSION"), about = "Install pre-built dbui releases from a verified descriptor")]
pub struct Cli {
    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Descriptor file to use instead of the built-in one
    #[arg(long, global = true, env = "BINDESC_DESCRIPTOR")]
    pub descriptor: Option<PathBuf>,

    /// Directory the executable is installed into (default: ~/.bindesc/bin)
    #[arg(long, global = true, env = "BINDESC_BIN_DIR")]
    pub bin_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Platform selection; both default to the running platform.
#[derive(Debug, Clone, Copy, Args)]
pub struct TargetArgs {
    /// Operating system (darwin, linux, windows, freebsd)
    #[arg(long)]
    pub os: Option<Os>,

    /// CPU architecture (x86_64, arm64, i386)
    #[arg(long)]
    pub arch: Option<Arch>,
}

impl TargetArgs {
    /// The requested target, filling unset parts from the running platform.
    pub fn target(self) -> anyhow::Result<ReleaseTarget> {
        let os = match self.os {
            Some(os) => os,
            None => Os::current().ok_or_else(|| {
                anyhow::anyhow!(
                    "Unrecognized operating system '{}'; pass --os",
                    std::env::consts::OS
                )
            })?,
        };
        let arch = match self.arch {
            Some(arch) => arch,
            None => Arch::current().ok_or_else(|| {
                anyhow::anyhow!(
                    "Unrecognized architecture '{}'; pass --arch",
                    std::env::consts::ARCH
                )
            })?,
        };
        Ok(ReleaseTarget::new(os, arch))
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download, verify, install and smoke-test the release
    Install {
        #[command(flatten)]
        target: TargetArgs,
        /// Do not run the installed binary afterwards
        #[arg(long)]
        skip_test: bool,
    },
    /// Show the archive URL and digest for a platform
    Resolve {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// List every platform the descriptor has a release for
    Targets,
    /// Validate a descriptor file
    Check {
        /// Descriptor file to check
        path: PathBuf,
    },
    /// Run the smoke test against the installed binary
    Test,
    /// Compute SHA256 hash of a file (for descriptor authoring)
    Hash {
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the Homebrew formula for the descriptor
    Formula,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_explicit_target() {
        let cli = Cli::parse_from(["bindesc", "resolve", "--os", "macos", "--arch", "amd64"]);
        let Commands::Resolve { target } = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(
            target.target().unwrap(),
            ReleaseTarget::new(Os::MacOs, Arch::X86_64)
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["bindesc", "install", "--skip-test", "--dry-run", "--bin-dir", "/tmp/b"]);
        assert!(cli.dry_run);
        assert_eq!(cli.bin_dir, Some(PathBuf::from("/tmp/b")));
        assert!(matches!(cli.command, Commands::Install { skip_test: true, .. }));
    }

    #[test]
    fn rejects_unknown_os() {
        assert!(Cli::try_parse_from(["bindesc", "resolve", "--os", "plan9"]).is_err());
    }
}
