//! Installation operations: the typestate pipeline and its error taxonomy.

pub mod context;
pub mod error;
pub mod flow;

pub use context::Context;
pub use error::{Halted, InstallError, Stage};
