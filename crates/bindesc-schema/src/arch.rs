//! Platform identification: operating system, CPU architecture, and the
//! [`ReleaseTarget`] pair that keys a descriptor's artifact table.

use serde::{Deserialize, Serialize};

/// Operating system a release artifact was built for.
///
/// Serialized with the lowercase Go/Rust naming (`darwin`, `linux`, ...),
/// which is what release tooling puts in artifact file names.
///
/// # Example
///
/// ```
/// use bindesc_schema::Os;
///
/// let os: Os = "macos".parse().unwrap();
/// assert_eq!(os, Os::MacOs);
/// assert_eq!(os.release_name(), "Darwin");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Os {
    /// Apple macOS.
    #[serde(rename = "darwin", alias = "macos")]
    MacOs,
    /// Linux (any libc).
    #[serde(rename = "linux")]
    Linux,
    /// Microsoft Windows.
    #[serde(rename = "windows")]
    Windows,
    /// FreeBSD.
    #[serde(rename = "freebsd")]
    FreeBsd,
}

impl Os {
    /// Operating system of the running process, or `None` when it is not
    /// one of the known variants.
    pub fn current() -> Option<Self> {
        match std::env::consts::OS {
            "macos" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            "windows" => Some(Self::Windows),
            "freebsd" => Some(Self::FreeBsd),
            _ => None,
        }
    }

    /// Canonical lowercase name (`darwin`, `linux`, `windows`, `freebsd`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MacOs => "darwin",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::FreeBsd => "freebsd",
        }
    }

    /// Capitalized name used in release archive names
    /// (e.g. `dbui_Darwin_x86_64.tar.gz`).
    pub fn release_name(&self) -> &'static str {
        match self {
            Self::MacOs => "Darwin",
            Self::Linux => "Linux",
            Self::Windows => "Windows",
            Self::FreeBsd => "FreeBSD",
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Os {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "darwin" | "macos" | "osx" | "mac" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            "windows" | "win" => Ok(Self::Windows),
            "freebsd" => Ok(Self::FreeBsd),
            _ => Err(format!("Unknown operating system: {s}")),
        }
    }
}

/// CPU architecture a release artifact was built for.
///
/// # Example
///
/// ```
/// use bindesc_schema::Arch;
///
/// let arch: Arch = "amd64".parse().unwrap();
/// assert_eq!(arch, Arch::X86_64);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Arch {
    /// `x86_64` (Intel / AMD 64-bit).
    #[serde(rename = "x86_64", alias = "amd64")]
    X86_64,
    /// ARM64 (Apple Silicon, Graviton, Raspberry Pi 4+).
    #[serde(rename = "arm64", alias = "aarch64")]
    Arm64,
    /// 32-bit x86.
    #[serde(rename = "i386", alias = "386")]
    I386,
}

impl Arch {
    /// Architecture of the running process, or `None` when it is not one of
    /// the known variants.
    pub fn current() -> Option<Self> {
        match std::env::consts::ARCH {
            "x86_64" => Some(Self::X86_64),
            "aarch64" => Some(Self::Arm64),
            "x86" => Some(Self::I386),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Arm64 => "arm64",
            Self::I386 => "i386",
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Ok(Self::X86_64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            "i386" | "386" | "x86" | "i686" => Ok(Self::I386),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}

/// A supported platform variant: one (operating system, architecture) pair.
///
/// Release targets are the keys of a descriptor's artifact table, so they
/// are `Copy`, totally ordered and hashable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ReleaseTarget {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl ReleaseTarget {
    /// Create a target from its parts.
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Target of the running process, or `None` if either the OS or the
    /// architecture is unrecognized.
    pub fn current() -> Option<Self> {
        Some(Self::new(Os::current()?, Arch::current()?))
    }
}

impl std::fmt::Display for ReleaseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

impl std::str::FromStr for ReleaseTarget {
    type Err = String;

    /// Parses `os/arch`, `os-arch` or `os_arch` (e.g. `darwin/x86_64`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (os, arch) = s
            .split_once('/')
            .or_else(|| s.split_once('-'))
            .or_else(|| s.split_once('_'))
            .ok_or_else(|| format!("Invalid target '{s}': expected <os>/<arch>"))?;
        Ok(Self::new(os.parse()?, arch.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_accepts_common_spellings() {
        assert_eq!("Darwin".parse::<Os>().unwrap(), Os::MacOs);
        assert_eq!("macos".parse::<Os>().unwrap(), Os::MacOs);
        assert_eq!("LINUX".parse::<Os>().unwrap(), Os::Linux);
        assert!("plan9".parse::<Os>().is_err());
    }

    #[test]
    fn arch_accepts_go_and_rust_names() {
        assert_eq!("amd64".parse::<Arch>().unwrap(), Arch::X86_64);
        assert_eq!("aarch64".parse::<Arch>().unwrap(), Arch::Arm64);
        assert_eq!("386".parse::<Arch>().unwrap(), Arch::I386);
        assert!("riscv64".parse::<Arch>().is_err());
    }

    #[test]
    fn target_display_round_trips() {
        let target = ReleaseTarget::new(Os::MacOs, Arch::X86_64);
        assert_eq!(target.to_string(), "darwin/x86_64");
        assert_eq!("darwin/x86_64".parse::<ReleaseTarget>().unwrap(), target);
    }

    #[test]
    fn target_parses_dash_separator() {
        // x86_64 contains an underscore, so '-' must be tried before '_'
        let target: ReleaseTarget = "linux-x86_64".parse().unwrap();
        assert_eq!(target, ReleaseTarget::new(Os::Linux, Arch::X86_64));

        let target: ReleaseTarget = "linux_arm64".parse().unwrap();
        assert_eq!(target, ReleaseTarget::new(Os::Linux, Arch::Arm64));
    }

    #[test]
    fn target_rejects_missing_arch() {
        assert!("linux".parse::<ReleaseTarget>().is_err());
    }

    #[test]
    fn targets_order_by_os_then_arch() {
        let mut targets = vec![
            ReleaseTarget::new(Os::Linux, Arch::X86_64),
            ReleaseTarget::new(Os::MacOs, Arch::Arm64),
            ReleaseTarget::new(Os::MacOs, Arch::X86_64),
        ];
        targets.sort();
        assert_eq!(targets[0], ReleaseTarget::new(Os::MacOs, Arch::X86_64));
        assert_eq!(targets[2], ReleaseTarget::new(Os::Linux, Arch::X86_64));
    }
}
