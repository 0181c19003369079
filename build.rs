// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

/// Version env var packagers can set when building outside a git checkout
const VERSION_OVERRIDE: &str = "DEPTH_CAPTURE_VERSION";

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed={}", VERSION_OVERRIDE);

    let version = std::env::var(VERSION_OVERRIDE).unwrap_or_else(|_| version_from_git());
    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Position of HEAD relative to the newest `v*` tag
struct Describe<'a> {
    release: &'a str,
    commits_since: u32,
    hash: &'a str,
    dirty: bool,
}

impl<'a> Describe<'a> {
    /// Parse `v1.2.3-4-gabcdef1[-dirty]` as printed by `git describe --long --dirty`
    fn parse(text: &'a str) -> Option<Self> {
        let (text, dirty) = match text.strip_suffix("-dirty") {
            Some(rest) => (rest, true),
            None => (text, false),
        };
        let mut parts = text.rsplitn(3, '-');
        let hash = parts.next()?.strip_prefix('g')?;
        let commits_since = parts.next()?.parse().ok()?;
        let tag = parts.next()?;
        Some(Self {
            release: tag.strip_prefix('v').unwrap_or(tag),
            commits_since,
            hash,
            dirty,
        })
    }

    /// `1.2.3-abcdef1` on a tag, `1.2.3-dev.4-abcdef1` past it, `+dirty` on local edits
    fn version(&self) -> String {
        let mut version = if self.commits_since == 0 {
            format!("{}-{}", self.release, self.hash)
        } else {
            format!("{}-dev.{}-{}", self.release, self.commits_since, self.hash)
        };
        if self.dirty {
            version.push_str("+dirty");
        }
        version
    }
}

fn version_from_git() -> String {
    if let Some(describe) = git(&["describe", "--tags", "--long", "--dirty", "--match", "v*"]) {
        if let Some(parsed) = Describe::parse(&describe) {
            return parsed.version();
        }
    }

    // Untagged history or no git: crate version plus whatever commit is known
    let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
    format!("{}-{}", env!("CARGO_PKG_VERSION"), hash)
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
