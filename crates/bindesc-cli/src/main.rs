//! bindesc - install pre-built dbui releases from a verified descriptor

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bindesc_cli::cmd;
use bindesc_cli::ui::Output;
use bindesc_cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr, filtered by RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(cli.quiet);
    let descriptor = cli.descriptor.as_deref();
    let bin_dir = cli.bin_dir.as_deref();

    match cli.command {
        Commands::Install { target, skip_test } => {
            cmd::install::install(
                descriptor,
                bin_dir,
                target.target()?,
                skip_test,
                cli.dry_run,
                output,
            )
            .await
        }
        Commands::Resolve { target } => cmd::resolve::resolve(descriptor, target.target()?),
        Commands::Targets => cmd::targets::targets(descriptor),
        Commands::Check { path } => cmd::check::check(&path, output),
        Commands::Test => cmd::smoke::smoke_test(descriptor, bin_dir, output),
        Commands::Hash { files } => cmd::hash::hash(&files),
        Commands::Formula => cmd::formula::formula(descriptor),
        Commands::Completions { shell } => {
            cmd::completions::completions(shell);
            Ok(())
        }
    }
}
