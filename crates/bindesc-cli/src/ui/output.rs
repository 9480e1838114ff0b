//! Console output and the pipeline's progress reporter.

use bindesc_core::Reporter;
use bindesc_schema::{PackageName, Version};
use crossterm::style::Stylize;

use super::format_size;

/// Writes status lines to stderr. With `quiet`, only failures, warnings
/// and errors are shown.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    quiet: bool,
}

impl Output {
    /// Create a new output handle.
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn line(&self, line: &str) {
        if !self.quiet {
            eprintln!("{line}");
        }
    }

    /// Prints an informational message to the console.
    pub fn info(&self, msg: &str) {
        self.line(&format!("{} {msg}", "•".dark_grey()));
    }

    /// Prints a success message to the console.
    pub fn success(&self, msg: &str) {
        self.line(&format!("{} {msg}", "✓".green()));
    }

    /// Prints a warning message to the console.
    pub fn warning(&self, msg: &str) {
        eprintln!("{} {msg}", "!".yellow().bold());
    }

    /// Prints an error message to the console.
    pub fn error(&self, msg: &str) {
        eprintln!("{} {msg}", "✗".red().bold());
    }
}

impl Reporter for Output {
    fn downloading(&self, name: &PackageName, version: &Version, current: u64, total: Option<u64>) {
        if current == 0 {
            let size = total.map(format_size).unwrap_or_default();
            self.line(&format!(
                "{} {} {} {}",
                "↓".cyan(),
                name.as_str().bold(),
                version.as_str().dark_grey(),
                size.dark_grey()
            ));
        } else {
            tracing::trace!(current, ?total, "download progress");
        }
    }

    fn verified(&self, name: &PackageName, version: &Version, sha256: &str) {
        let short = sha256.get(..12).unwrap_or(sha256);
        self.line(&format!(
            "{} {} {} sha256:{}",
            "✓".green(),
            name.as_str().bold(),
            version.as_str().dark_grey(),
            short.dark_grey()
        ));
    }

    fn installing(&self, name: &PackageName, version: &Version) {
        self.line(&format!(
            "{} {} {} installing",
            "→".cyan(),
            name.as_str().bold(),
            version.as_str().dark_grey()
        ));
    }

    fn testing(&self, name: &PackageName, version: &Version) {
        self.line(&format!(
            "{} {} {} running smoke test",
            "→".cyan(),
            name.as_str().bold(),
            version.as_str().dark_grey()
        ));
    }

    fn done(&self, name: &PackageName, version: &Version, detail: &str, size: Option<u64>) {
        let size = size.map(|s| format!(" ({})", format_size(s))).unwrap_or_default();
        self.line(&format!(
            "{} {} {} {detail}{}",
            "✓".green(),
            name.as_str().bold(),
            version.as_str().dark_grey(),
            size.dark_grey()
        ));
    }

    fn failed(&self, name: &PackageName, version: &Version, reason: &str) {
        eprintln!(
            "{} {} {} {reason}",
            "✗".red().bold(),
            name.as_str().bold(),
            version.as_str().dark_grey()
        );
    }

    fn info(&self, msg: &str) {
        Output::info(self, msg);
    }

    fn success(&self, msg: &str) {
        Output::success(self, msg);
    }

    fn warning(&self, msg: &str) {
        Output::warning(self, msg);
    }

    fn error(&self, msg: &str) {
        Output::error(self, msg);
    }
}
