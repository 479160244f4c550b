use crate::error::{ReleaseError, Result};
use crate::git::{TagRepository, Tagger};
use std::cell::RefCell;
use std::collections::HashMap;

/// A tag created through [MockRepository]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTag {
    pub name: String,
    pub commit: String,
    pub tagger: Tagger,
    pub message: String,
}

/// Mock repository for testing without a remote
#[derive(Default)]
pub struct MockRepository {
    tags: RefCell<HashMap<String, String>>,
    created: RefCell<Vec<CreatedTag>>,
    pushed: RefCell<Vec<String>>,
    reject_push: bool,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag pointing at a commit
    pub fn with_tag(self, name: impl Into<String>, commit: impl Into<String>) -> Self {
        self.tags.borrow_mut().insert(name.into(), commit.into());
        self
    }

    /// Make every push fail as if the remote refused it
    pub fn rejecting_pushes(mut self) -> Self {
        self.reject_push = true;
        self
    }

    pub fn created(&self) -> Vec<CreatedTag> {
        self.created.borrow().clone()
    }

    pub fn pushed(&self) -> Vec<String> {
        self.pushed.borrow().clone()
    }
}

impl TagRepository for MockRepository {
    fn find_tag_target(&self, tag: &str) -> Result<Option<String>> {
        Ok(self.tags.borrow().get(tag).cloned())
    }

    fn create_annotated_tag(&self, tag: &str, commit: &str, tagger: &Tagger, message: &str) -> Result<()> {
        let mut tags = self.tags.borrow_mut();
        if tags.contains_key(tag) {
            return Err(ReleaseError::remote(format!("tag '{}' already exists", tag)));
        }
        tags.insert(tag.to_string(), commit.to_string());

        self.created.borrow_mut().push(CreatedTag {
            name: tag.to_string(),
            commit: commit.to_string(),
            tagger: tagger.clone(),
            message: message.to_string(),
        });
        Ok(())
    }

    fn push_tag(&self, tag: &str) -> Result<()> {
        if self.reject_push {
            return Err(ReleaseError::remote(format!("Remote rejected refs/tags/{}", tag)));
        }
        self.pushed.borrow_mut().push(tag.to_string());
        Ok(())
    }
}
