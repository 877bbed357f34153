//! Discriminants: the tags tests use to pick platform-specific expected output.

use std::fmt;
use std::str::FromStr;

use target_lexicon::{OperatingSystem, Triple};

/// Tag present in every run.
pub const ALL: &str = "ALL";

/// Ordered, duplicate-free discriminant list.
///
/// Always starts with `ALL`, the platform name and the target triplet, followed by the
/// user-supplied tags in the order given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discriminants {
    tags: Vec<String>,
}

impl Discriminants {
    pub fn new(target: &TargetInfo, user: &[String]) -> Self {
        let mut discs = Self { tags: Vec::new() };
        discs.push(ALL);
        discs.push(&target.platform);
        discs.push(&target.triplet);
        for tag in user {
            discs.push(tag);
        }
        discs
    }

    fn push(&mut self, tag: &str) {
        let tag = tag.trim();
        if !tag.is_empty() && !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    /// Form passed to `run-test -d`.
    pub fn comma_joined(&self) -> String {
        self.tags.join(",")
    }

    /// Form written to the `discs` file.
    pub fn space_joined(&self) -> String {
        self.tags.join(" ")
    }
}

impl fmt::Display for Discriminants {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.comma_joined())
    }
}

/// Platform and triplet discriminants of the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    /// Short name, `<arch>-<os>` (for example `x86_64-linux`).
    pub platform: String,
    pub triplet: String,
}

impl TargetInfo {
    pub fn from_triple(triple: &Triple) -> Self {
        Self {
            platform: platform_name(triple),
            triplet: triple.to_string(),
        }
    }

    /// A target name with no known triple: both tags are the name itself.
    pub fn verbatim(name: &str) -> Self {
        Self {
            platform: name.to_string(),
            triplet: name.to_string(),
        }
    }
}

pub fn platform_name(triple: &Triple) -> String {
    format!("{}-{}", triple.architecture, triple.operating_system)
}

/// Resolve `--target`, falling back to the triple this driver was built for.
///
/// The value is handed to `run-test` as given, so it is never rejected here. Full triples
/// naming an operating system are decoded into platform and triplet. Anything else
/// (`x86-linux`, `leon3-elf`, ...) is used verbatim.
pub fn resolve_target(target: Option<&str>) -> TargetInfo {
    let Some(name) = target else {
        return TargetInfo::from_triple(&Triple::host());
    };
    match Triple::from_str(name) {
        Ok(triple) if triple.operating_system != OperatingSystem::Unknown => {
            TargetInfo::from_triple(&triple)
        }
        Ok(_) => TargetInfo::verbatim(name),
        Err(err) => {
            tracing::debug!(triple = name, "not a known triple ({err}), using it verbatim");
            TargetInfo::verbatim(name)
        }
    }
}

/// Split the `-d a,b,c` option value.
pub fn split_user_discs(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
