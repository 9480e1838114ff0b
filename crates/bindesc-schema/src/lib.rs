//! Shared types for bindesc installer descriptors.
//!
//! A descriptor is a static record for one versioned binary release: which
//! archive to download for each (OS, architecture) pair, the digest it must
//! match, where the executable goes, and how to smoke-test it.

pub mod arch;
pub mod descriptor;
pub mod hash;
pub mod types;

// Re-exports
pub use arch::*;
pub use descriptor::{Descriptor, DescriptorError, FormulaDescriptor, NotSupportedError};
pub use hash::*;
pub use types::*;
