//! Shared installation context.
//!
//! Groups the collaborators and locations every stage needs so the
//! typestate methods take a single argument.

use bindesc_core::Reporter;
use bindesc_core::io::fetch::Fetcher;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Groups common state used during installation operations.
#[derive(Clone)]
pub struct Context {
    pub fetcher: Arc<dyn Fetcher>,
    pub reporter: Arc<dyn Reporter>,
    /// Final home of the executable.
    pub bin_dir: PathBuf,
    /// Parent of the per-install staging directories.
    pub staging_root: PathBuf,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("bin_dir", &self.bin_dir)
            .field("staging_root", &self.staging_root)
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        reporter: Arc<dyn Reporter>,
        bin_dir: PathBuf,
        staging_root: PathBuf,
    ) -> Self {
        Self {
            fetcher,
            reporter,
            bin_dir,
            staging_root,
        }
    }
}
