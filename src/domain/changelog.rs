use crate::domain::heading::{ChangelogVersions, VersionHeading};
use crate::error::{ReleaseError, Result};

/// Slices the change notes for `desired` out of the changelog.
///
/// Recording starts after the line equal to `desired` and stops before the
/// line equal to `previous`, or at the end of the document when there is no
/// previous release. Blank lines are dropped.
pub fn extract_changes(
    changelog: &str,
    desired: &VersionHeading,
    previous: Option<&VersionHeading>,
) -> String {
    let mut recording = false;
    let mut changes = Vec::new();

    for line in changelog.lines() {
        if line == desired.as_str() {
            recording = true;
            continue;
        }

        if previous.is_some_and(|previous| line == previous.as_str()) {
            break;
        }

        if recording && !line.trim().is_empty() {
            changes.push(line);
        }
    }

    changes.join("\n").trim_end().to_string()
}

/// Everything a backend needs to know about the release being published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDraft {
    pub desired: VersionHeading,
    pub previous: Option<VersionHeading>,
    /// Tag name derived from the desired heading
    pub tag: String,
    /// Change notes body, used as tag message or release description
    pub changes: String,
}

impl ReleaseDraft {
    /// Build a draft from raw changelog text.
    ///
    /// Fails only when the changelog has no release heading. Version ordering
    /// is checked separately with [`ReleaseDraft::validate_ordering`].
    pub fn from_changelog(changelog: &str) -> Result<Self> {
        let ChangelogVersions { desired, previous } = ChangelogVersions::parse(changelog)?;
        let changes = extract_changes(changelog, &desired, previous.as_ref());

        Ok(ReleaseDraft {
            tag: desired.tag_name(),
            desired,
            previous,
            changes,
        })
    }

    /// Ensure the desired version is strictly greater than the previous one.
    ///
    /// A first release (no previous heading) is always valid. A heading that
    /// does not parse as a version is a [`ReleaseError::Changelog`] error, never
    /// a pass.
    pub fn validate_ordering(&self) -> Result<()> {
        let Some(previous) = &self.previous else {
            return Ok(());
        };

        let desired_version = self.desired.version()?;
        let previous_version = previous.version()?;

        if desired_version > previous_version {
            Ok(())
        } else {
            Err(ReleaseError::Ordering {
                desired: desired_version.to_string(),
                previous: previous_version.to_string(),
            })
        }
    }

    pub fn is_order_valid(&self) -> bool {
        self.validate_ordering().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANGELOG: &str = "# Changelog\n\n##    1.1.0\n\n### Updated\n* An update happened\n\n##1.0.0\n\n### Added\n* Initial release\n";

    #[test]
    fn test_extract_changes_between_headings() {
        let changes = extract_changes(
            CHANGELOG,
            &VersionHeading::new("##    1.1.0"),
            Some(&VersionHeading::new("##1.0.0")),
        );
        assert_eq!(changes, "### Updated\n* An update happened");
    }

    #[test]
    fn test_extract_changes_to_end_of_document() {
        let changes = extract_changes(CHANGELOG, &VersionHeading::new("##1.0.0"), None);
        assert_eq!(changes, "### Added\n* Initial release");
    }

    #[test]
    fn test_extract_changes_drops_whitespace_only_lines() {
        let text = "## 2.0.0\n* one\n   \n\t\n* two   \n## 1.0.0\n";
        let changes = extract_changes(
            text,
            &VersionHeading::new("## 2.0.0"),
            Some(&VersionHeading::new("## 1.0.0")),
        );
        assert_eq!(changes, "* one\n* two");
    }

    #[test]
    fn test_draft_from_changelog() {
        let draft = ReleaseDraft::from_changelog(CHANGELOG).unwrap();
        assert_eq!(draft.tag, "1.1.0");
        assert_eq!(draft.previous, Some(VersionHeading::new("##1.0.0")));
        assert_eq!(draft.changes, "### Updated\n* An update happened");
        assert!(draft.is_order_valid());
    }

    #[test]
    fn test_first_release_is_always_valid() {
        let draft = ReleaseDraft::from_changelog("## 0.0.0\n* Initial release\n").unwrap();
        assert!(draft.previous.is_none());
        assert!(draft.validate_ordering().is_ok());
    }

    #[test]
    fn test_ordering_four_segments() {
        let draft = ReleaseDraft::from_changelog("## 1.0.0.0\n## 0.0.1.0\n").unwrap();
        assert!(draft.is_order_valid());
    }

    #[test]
    fn test_ordering_rejects_lower_version() {
        let draft = ReleaseDraft::from_changelog("## 1.10.0\n## 2.0.1\n").unwrap();
        let err = draft.validate_ordering().unwrap_err();
        assert!(matches!(err, ReleaseError::Ordering { .. }));
    }

    #[test]
    fn test_ordering_rejects_equal_version() {
        let draft = ReleaseDraft::from_changelog("## 1.0.0\n* a\n## 1.0\n").unwrap();
        assert!(!draft.is_order_valid());
    }

    #[test]
    fn test_malformed_heading_fails_closed() {
        let draft = ReleaseDraft::from_changelog("## 1.1.0 (2020-02-02)\n## 1.0.0\n").unwrap();
        let err = draft.validate_ordering().unwrap_err();
        assert!(matches!(err, ReleaseError::Changelog(_)));
        assert!(!draft.is_order_valid());
    }
}
