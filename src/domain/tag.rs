use std::fmt;

/// What a backend reports about a tag relative to the commit we want it on.
///
/// Authorization and transport failures are not states; they surface as the
/// `Err` arm of the resolving call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagState {
    /// The tag does not exist yet
    Absent,
    /// The tag exists and points at the requested commit
    Matches,
    /// The tag exists but points somewhere else
    Mismatch { actual: String },
}

impl TagState {
    pub fn does_not_exist(&self) -> bool {
        matches!(self, TagState::Absent)
    }

    pub fn exists_with_matching_target(&self) -> bool {
        matches!(self, TagState::Matches)
    }
}

/// Successful end state of an idempotent tag creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOutcome {
    /// Tag already pointed at the commit; nothing was written
    AlreadyPresent,
    /// Tag (and release note, if the backend has one) was created
    Created,
    /// The backend reported the artifact already exists when we tried to create it
    CreatedConcurrently,
}

impl fmt::Display for TagOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TagOutcome::AlreadyPresent => "already present",
            TagOutcome::Created => "created",
            TagOutcome::CreatedConcurrently => "already created by another writer",
        };
        f.write_str(text)
    }
}
