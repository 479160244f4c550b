//! Domain logic - pure release rules independent of any backend

pub mod changelog;
pub mod heading;
pub mod tag;
pub mod version;

pub use changelog::{extract_changes, ReleaseDraft};
pub use heading::{find_headings, ChangelogVersions, VersionHeading};
pub use tag::{TagOutcome, TagState};
pub use version::ReleaseVersion;
