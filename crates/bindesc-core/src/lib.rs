pub mod descriptor;
pub mod formula;
pub mod install;
pub mod io;
pub mod paths;
pub mod reporter;
pub mod selftest;

pub use paths::*;
pub use reporter::{NullReporter, Reporter};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("bindesc/", env!("CARGO_PKG_VERSION"));
