//! Install command

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use bindesc_core::Reporter;
use bindesc_core::io::fetch::HttpFetcher;
use bindesc_schema::{Descriptor, ReleaseTarget};

use crate::ops::Context;
use crate::ops::flow::{self, Completed};
use crate::ui::Output;

/// Download, verify, place and smoke-test the release for `target`.
pub async fn install(
    descriptor_path: Option<&Path>,
    bin_dir: Option<&Path>,
    target: ReleaseTarget,
    skip_test: bool,
    dry_run: bool,
    output: Output,
) -> Result<()> {
    let descriptor = super::load_descriptor(descriptor_path)?;
    let meta = descriptor.metadata();
    let bin_dir = super::bin_dir(bin_dir)?;

    if dry_run {
        let artifact = descriptor.resolve_target(target)?;
        output.info(&format!(
            "Would install {} {} for {target}",
            meta.name, meta.version
        ));
        output.info(&format!("  from   {}", artifact.url));
        output.info(&format!("  sha256 {}", artifact.sha256));
        output.info(&format!(
            "  into   {}",
            bin_dir.join(&descriptor.install_rule().binary).display()
        ));
        if !skip_test {
            output.info("  then run the smoke test");
        }
        return Ok(());
    }

    let staging_root = bindesc_core::tmp_path().context("Failed to determine staging directory")?;
    let fetcher = HttpFetcher::new().context("Failed to initialize HTTP client")?;
    let ctx = Context::new(
        Arc::new(fetcher),
        Arc::new(output),
        bin_dir.clone(),
        staging_root,
    );

    // Dropping the pipeline on Ctrl-C removes its staging directory.
    let outcome = tokio::select! {
        outcome = flow::run(&descriptor, target, &ctx, skip_test) => outcome,
        Ok(()) = tokio::signal::ctrl_c() => {
            output.failed(&meta.name, &meta.version, "interrupted");
            bail!("Installation of {} {} interrupted", meta.name, meta.version);
        }
    };

    match outcome {
        Ok(done) => {
            let detail = match &done {
                Completed::Tested(_) => "installed and tested",
                Completed::Installed { .. } => "installed (smoke test skipped)",
            };
            output.done(
                &meta.name,
                &meta.version,
                detail,
                Some(done.binary().size),
            );
            output.info(&done.binary().path.display().to_string());
            if !on_path(&bin_dir) {
                output.warning(&format!(
                    "{} is not on your PATH",
                    bin_dir.display()
                ));
            }
            Ok(())
        }
        Err(halted) => {
            output.failed(&meta.name, &meta.version, &halted.error.to_string());
            Err(halted.into())
        }
    }
}

fn on_path(dir: &Path) -> bool {
    std::env::var_os("PATH").is_some_and(|paths| std::env::split_paths(&paths).any(|p| p == dir))
}
