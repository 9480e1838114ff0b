//! Formula command

use std::path::Path;

use anyhow::Result;
use bindesc_core::formula;

/// Print the Homebrew formula for the descriptor
pub fn formula(descriptor_path: Option<&Path>) -> Result<()> {
    let descriptor = super::load_descriptor(descriptor_path)?;
    print!("{}", formula::render(&descriptor));
    Ok(())
}
