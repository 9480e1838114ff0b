//! Check command

use std::path::Path;

use anyhow::{Context, Result};
use bindesc_core::descriptor;
use bindesc_schema::{Descriptor, ReleaseTarget};

use crate::ui::Output;

/// Validate a descriptor file
pub fn check(path: &Path, output: Output) -> Result<()> {
    let desc = descriptor::load(path)
        .with_context(|| format!("Failed to parse descriptor {}", path.display()))?;
    let meta = desc.metadata();

    output.success("Descriptor is valid");
    println!("  Name: {}", meta.name);
    println!("  Version: {}", meta.version);
    println!("  Binary: {}", desc.install_rule().binary);
    if let Some(format) = desc.install_rule().format {
        println!("  Format: {format}");
    }
    for target in desc.supported_targets() {
        println!("  Target: {target}");
    }

    if let Some(current) = ReleaseTarget::current()
        && desc.resolve_target(current).is_err()
    {
        output.warning(&format!("No release for this platform ({current})"));
    }
    if !desc
        .supported_targets()
        .into_iter()
        .any(bindesc_core::formula::is_brew_target)
    {
        output.warning("No target can be expressed as a Homebrew formula");
    }

    Ok(())
}
