use crate::domain::version::ReleaseVersion;
use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fmt;

/// A release heading line: two hash marks, optional whitespace, then a digit.
const HEADING_PATTERN: &str = r"^##\s*\d.*$";

/// A changelog line identifying a release, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionHeading(String);

impl VersionHeading {
    /// Wrap a heading line without checking it
    pub fn new(line: impl Into<String>) -> Self {
        VersionHeading(line.into())
    }

    /// The heading exactly as it appears in the changelog
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Heading with the marker and every whitespace character removed
    /// (e.g. "##    1.0.0   " -> "1.0.0")
    pub fn version_text(&self) -> String {
        let body = self.0.strip_prefix("##").unwrap_or(&self.0);
        body.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Heading with the marker removed and surrounding whitespace trimmed
    /// (e.g. "## 1.1.0" -> "1.1.0"); this is the tag to publish
    pub fn tag_name(&self) -> String {
        let body = self.0.strip_prefix("##").unwrap_or(&self.0);
        body.trim().to_string()
    }

    /// Parse the heading into a comparable version
    pub fn version(&self) -> Result<ReleaseVersion> {
        ReleaseVersion::parse(&self.version_text())
    }
}

impl fmt::Display for VersionHeading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Collects every release heading line, in document order.
pub fn find_headings(changelog: &str) -> Result<Vec<VersionHeading>> {
    let re = Regex::new(HEADING_PATTERN)
        .map_err(|e| ReleaseError::changelog(format!("Invalid heading pattern: {}", e)))?;

    Ok(changelog
        .lines()
        .filter(|line| re.is_match(line))
        .map(VersionHeading::new)
        .collect())
}

/// The release being prepared and the one before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogVersions {
    pub desired: VersionHeading,
    /// `None` when the changelog describes its first release
    pub previous: Option<VersionHeading>,
}

impl ChangelogVersions {
    /// Pick the first two headings of the changelog.
    ///
    /// # Returns
    /// * `Ok(ChangelogVersions)` - the first heading as `desired`, the second (if any) as `previous`
    /// * `Err(ReleaseError::Changelog)` - if no heading is present
    pub fn parse(changelog: &str) -> Result<Self> {
        let mut headings = find_headings(changelog)?.into_iter();

        let desired = headings
            .next()
            .ok_or_else(|| ReleaseError::changelog("No version found in changelog"))?;

        Ok(ChangelogVersions {
            desired,
            previous: headings.next(),
        })
    }
}
