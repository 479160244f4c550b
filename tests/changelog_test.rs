// tests/changelog_test.rs
use changelog_release::domain::{ChangelogVersions, ReleaseDraft, ReleaseVersion, VersionHeading};
use changelog_release::ReleaseError;
use std::fs;

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

#[test]
fn test_versions_from_changelog() {
    let versions = ChangelogVersions::parse(&fixture("Changelog.md")).unwrap();
    assert_eq!(versions.desired, VersionHeading::new("##    1.1.0"));
    assert_eq!(versions.previous, Some(VersionHeading::new("##1.0.0")));
}

#[test]
fn test_versions_from_first_changelog() {
    let versions = ChangelogVersions::parse(&fixture("FirstChangelog.md")).unwrap();
    assert_eq!(versions.desired, VersionHeading::new("##0.0.0"));
    assert_eq!(versions.previous, None);
}

#[test]
fn test_draft_from_changelog() {
    let draft = ReleaseDraft::from_changelog(&fixture("Changelog.md")).unwrap();
    assert_eq!(draft.tag, "1.1.0");
    assert_eq!(draft.changes, "### Updated\n* An update happened");
    assert!(draft.is_order_valid());
}

#[test]
fn test_draft_from_first_changelog() {
    let draft = ReleaseDraft::from_changelog(&fixture("FirstChangelog.md")).unwrap();
    assert_eq!(draft.tag, "0.0.0");
    assert_eq!(draft.changes, "### Added\n* Initial release");
    assert!(draft.validate_ordering().is_ok());
}

#[test]
fn test_regressed_changelog_fails_ordering() {
    let draft = ReleaseDraft::from_changelog(&fixture("Regressed.md")).unwrap();
    match draft.validate_ordering().unwrap_err() {
        ReleaseError::Ordering { desired, previous } => {
            assert_eq!(desired, "1.10.0");
            assert_eq!(previous, "2.0.1");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_changelog_without_headings() {
    let err = ReleaseDraft::from_changelog("# Changelog\n\nNothing released yet\n").unwrap_err();
    assert!(matches!(err, ReleaseError::Changelog(_)));
    assert!(err.to_string().contains("No version found"));
}

#[test]
fn test_parsing_is_repeatable() {
    let text = fixture("Changelog.md");
    assert_eq!(
        ReleaseDraft::from_changelog(&text).unwrap(),
        ReleaseDraft::from_changelog(&text).unwrap()
    );
}

#[test]
fn test_numeric_not_lexical_ordering() {
    let cases = [
        ("1.10.0", "1.9.0"),
        ("1.0.0.0", "0.0.1.0"),
        ("2.0.0", "1.99.99"),
        ("1.0.1", "1.0"),
        ("10.0.0", "9.0.0"),
    ];

    for (higher, lower) in cases {
        let higher_text = format!("## {}\n* new\n## {}\n* old\n", higher, lower);
        let lower_text = format!("## {}\n* new\n## {}\n* old\n", lower, higher);

        assert!(
            ReleaseDraft::from_changelog(&higher_text).unwrap().is_order_valid(),
            "{} should be accepted after {}",
            higher,
            lower
        );
        assert!(
            !ReleaseDraft::from_changelog(&lower_text).unwrap().is_order_valid(),
            "{} should be rejected after {}",
            lower,
            higher
        );
        assert!(ReleaseVersion::parse(higher).unwrap() > ReleaseVersion::parse(lower).unwrap());
    }
}

#[test]
fn test_equal_versions_are_rejected() {
    let draft = ReleaseDraft::from_changelog("## 1.2.0\n* again\n## 1.2.0\n* first\n").unwrap();
    assert!(!draft.is_order_valid());
}

#[test]
fn test_single_heading_is_always_valid() {
    for version in ["0.0.0", "0.0.1", "99.0.0"] {
        let draft = ReleaseDraft::from_changelog(&format!("## {}\n* only\n", version)).unwrap();
        assert!(draft.previous.is_none());
        assert!(draft.is_order_valid());
    }
}

#[test]
fn test_malformed_heading_fails_closed() {
    let draft = ReleaseDraft::from_changelog("## 1.x.0\n* new\n## 1.0.0\n* old\n").unwrap();
    assert!(matches!(
        draft.validate_ordering().unwrap_err(),
        ReleaseError::Changelog(_)
    ));
}
