//! Homebrew formula rendering.
//!
//! Renders a descriptor as the Ruby formula a tap would publish, one
//! `if OS.<os>? && Hardware::CPU.<cpu>?` block per artifact.

use bindesc_schema::{Arch, Descriptor, Os, ReleaseTarget};

fn os_predicate(os: Os) -> Option<&'static str> {
    match os {
        Os::MacOs => Some("OS.mac?"),
        Os::Linux => Some("OS.linux?"),
        Os::Windows | Os::FreeBsd => None,
    }
}

fn cpu_predicate(arch: Arch) -> Option<&'static str> {
    match arch {
        Arch::X86_64 => Some("Hardware::CPU.intel?"),
        Arch::Arm64 => Some("Hardware::CPU.arm?"),
        Arch::I386 => None,
    }
}

/// Targets Homebrew can express.
pub fn is_brew_target(target: ReleaseTarget) -> bool {
    os_predicate(target.os).is_some() && cpu_predicate(target.arch).is_some()
}

/// Quote a value as a double-quoted Ruby string literal.
fn ruby_str(value: &str) -> String {
    format!("\"{}\"", ruby_escape(value))
}

/// Escape a value for use inside a double-quoted Ruby string. `#{` is
/// escaped so it is never interpolated.
fn ruby_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '#' if chars.peek() == Some(&'{') => out.push_str("\\#"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `descriptor` as a Homebrew formula.
///
/// Artifacts for platforms Homebrew does not run on are left out.
#[must_use]
#[allow(clippy::format_push_string)]
pub fn render<D: Descriptor + ?Sized>(descriptor: &D) -> String {
    let meta = descriptor.metadata();
    let binary = &descriptor.install_rule().binary;

    let mut formula = format!(
        "# typed: false\n# frozen_string_literal: true\n\nclass {} < Formula\n  desc {}\n  homepage {}\n  version {}\n",
        meta.name.class_name(),
        ruby_str(&meta.description),
        ruby_str(&meta.homepage),
        ruby_str(meta.version.as_str()),
    );

    for (target, artifact) in descriptor.artifacts() {
        let (Some(os), Some(cpu)) = (os_predicate(target.os), cpu_predicate(target.arch)) else {
            tracing::debug!(release = %target, "no Homebrew equivalent, skipping");
            continue;
        };
        formula.push_str(&format!(
            "\n  if {os} && {cpu}\n    url {}\n    sha256 {}\n  end\n",
            ruby_str(&artifact.url),
            ruby_str(artifact.sha256.as_str()),
        ));
    }

    formula.push_str(&format!(
        "\n  def install\n    bin.install {}\n  end\n",
        ruby_str(binary)
    ));

    // `#{bin}` is Ruby interpolation and must be emitted literally.
    let mut command = format!("\"#{{bin}}/{}\"", ruby_escape(binary));
    for arg in &descriptor.verification_rule().args {
        command.push_str(", ");
        command.push_str(&ruby_str(arg));
    }
    formula.push_str(&format!("\n  test do\n    system {command}\n  end\nend\n"));

    formula
}
