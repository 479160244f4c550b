use crate::error::{ReleaseError, Result};
use semver::Prerelease;
use std::cmp::Ordering;
use std::fmt;

/// Release version taken from a changelog heading.
///
/// Unlike a strict semantic version this accepts any number of numeric
/// segments (`1.0`, `1.0.0`, `0.0.1.0`). Missing trailing segments compare as
/// zero. An optional `-pre` suffix follows semver pre-release precedence and
/// `+build` metadata is ignored.
#[derive(Debug, Clone)]
pub struct ReleaseVersion {
    pub segments: Vec<u64>,
    pub pre: Prerelease,
}

impl ReleaseVersion {
    /// Create a release version from numeric segments
    pub fn new(segments: impl Into<Vec<u64>>) -> Self {
        ReleaseVersion {
            segments: segments.into(),
            pre: Prerelease::EMPTY,
        }
    }

    /// Parse a dotted numeric version such as "1.10.0" or "2.0.0-rc.1"
    pub fn parse(text: &str) -> Result<Self> {
        let without_build = match text.split_once('+') {
            Some((version, _build)) => version,
            None => text,
        };

        let (core, pre) = match without_build.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (without_build, None),
        };

        if core.is_empty() {
            return Err(ReleaseError::changelog(format!(
                "Invalid version format: '{}'",
                text
            )));
        }

        let segments = core
            .split('.')
            .map(|part| {
                part.parse::<u64>().map_err(|_| {
                    ReleaseError::changelog(format!(
                        "Invalid version segment '{}' in '{}'",
                        part, text
                    ))
                })
            })
            .collect::<Result<Vec<u64>>>()?;

        let pre = match pre {
            Some("") => {
                return Err(ReleaseError::changelog(format!(
                    "Empty pre-release in '{}'",
                    text
                )))
            }
            Some(pre) => Prerelease::new(pre).map_err(|e| {
                ReleaseError::changelog(format!("Invalid pre-release in '{}': {}", text, e))
            })?,
            None => Prerelease::EMPTY,
        };

        Ok(ReleaseVersion { segments, pre })
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let ours = self.segments.get(i).copied().unwrap_or(0);
            let theirs = other.segments.get(i).copied().unwrap_or(0);
            match ours.cmp(&theirs) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }

        match (self.pre.is_empty(), other.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.pre.cmp(&other.pre),
        }
    }
}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReleaseVersion {}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", core.join("."))?;
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        Ok(())
    }
}
