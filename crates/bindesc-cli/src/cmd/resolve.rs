//! Resolve command

use std::path::Path;

use anyhow::Result;
use bindesc_schema::{Descriptor, ReleaseTarget};

/// Print the artifact for `target`. Pure lookup: no network access.
pub fn resolve(descriptor_path: Option<&Path>, target: ReleaseTarget) -> Result<()> {
    let descriptor = super::load_descriptor(descriptor_path)?;
    let artifact = descriptor.resolve_target(target)?;

    println!("target  {target}");
    println!("url     {}", artifact.url);
    println!("sha256  {}", artifact.sha256);
    Ok(())
}
