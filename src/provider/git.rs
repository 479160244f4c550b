use crate::domain::TagState;
use crate::error::Result;
use crate::git::{TagRepository, Tagger};
use crate::provider::{same_commit, CreateOutcome, ReleaseRequest, TagProvider};

/// Publishes an annotated tag straight to a git remote
pub struct GitProvider<R: TagRepository> {
    repo: R,
    tagger: Tagger,
}

impl<R: TagRepository> GitProvider<R> {
    pub fn new(repo: R, tagger: Tagger) -> Self {
        GitProvider { repo, tagger }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}

impl<R: TagRepository> TagProvider for GitProvider<R> {
    fn name(&self) -> &'static str {
        "git"
    }

    fn resolve_tag_state(&self, tag: &str, commit: &str) -> Result<TagState> {
        Ok(match self.repo.find_tag_target(tag)? {
            None => TagState::Absent,
            Some(target) if same_commit(&target, commit) => TagState::Matches,
            Some(actual) => TagState::Mismatch { actual },
        })
    }

    fn create_tag(&self, request: &ReleaseRequest) -> Result<CreateOutcome> {
        self.repo
            .create_annotated_tag(&request.tag, &request.commit, &self.tagger, &request.notes)?;
        self.repo.push_tag(&request.tag)?;
        Ok(CreateOutcome::Created)
    }
}
