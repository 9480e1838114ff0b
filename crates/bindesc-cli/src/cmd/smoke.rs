//! Test command: smoke-test the installed binary

use std::path::Path;

use anyhow::{Context, Result, bail};
use bindesc_core::selftest;
use bindesc_schema::Descriptor;

use crate::ui::Output;

/// Run the verification rule against `<bin_dir>/<binary>`.
pub fn smoke_test(descriptor_path: Option<&Path>, bin_dir: Option<&Path>, output: Output) -> Result<()> {
    let descriptor = super::load_descriptor(descriptor_path)?;
    let meta = descriptor.metadata();
    let path = super::bin_dir(bin_dir)?.join(&descriptor.install_rule().binary);

    if !selftest::is_installed(&path) {
        bail!(
            "{} is not installed at {} (run 'bindesc install')",
            meta.name,
            path.display()
        );
    }

    let outcome = selftest::run(&path, descriptor.verification_rule())
        .with_context(|| format!("Smoke test of {} failed", path.display()))?;
    output.success(&format!(
        "{} {} passed ({} ms)",
        meta.name,
        meta.version,
        outcome.elapsed.as_millis()
    ));
    Ok(())
}
