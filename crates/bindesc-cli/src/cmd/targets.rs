//! Targets command

use std::path::Path;

use anyhow::Result;
use bindesc_schema::{Descriptor, ReleaseTarget};
use crossterm::style::Stylize;

/// List every platform in the descriptor; the running one is starred.
pub fn targets(descriptor_path: Option<&Path>) -> Result<()> {
    let descriptor = super::load_descriptor(descriptor_path)?;
    let meta = descriptor.metadata();
    let current = ReleaseTarget::current();

    println!(
        "{} {}",
        meta.name.as_str().white().bold(),
        meta.version.as_str().dark_grey()
    );
    for (target, artifact) in descriptor.artifacts() {
        let marker = if Some(*target) == current { "*" } else { " " };
        println!("{marker} {:<16}{}", target.to_string(), artifact.url);
        println!("  {:<16}{}", "", artifact.sha256.as_str().dark_grey());
    }
    Ok(())
}
