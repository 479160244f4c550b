//! Tag-resolution protocol shared by every backend
//!
//! A backend implements [TagProvider]: it can tell whether a tag exists at a
//! commit ([TagProvider::resolve_tag_state]) and it can perform the raw write
//! ([TagProvider::create_tag]). The idempotency rule that decides whether a
//! write is needed lives once, in [ensure_tag].
//!
//! Backends:
//!
//! - [bitbucket::BitbucketProvider]: tag object is the resource
//! - [bitbucket_server::BitbucketServerProvider]: self-hosted, tag carries the notes as its message
//! - [gitlab::GitlabProvider]: tag and release note are separate resources
//! - [github::GithubProvider]: creating a release implies the tag
//! - [git::GitProvider]: direct git transport, no hosted API

pub mod bitbucket;
pub mod bitbucket_server;
pub mod git;
pub mod github;
pub mod gitlab;

pub use bitbucket::BitbucketProvider;
pub use bitbucket_server::BitbucketServerProvider;
pub use git::GitProvider;
pub use github::GithubProvider;
pub use gitlab::GitlabProvider;

use crate::domain::{TagOutcome, TagState};
use crate::error::{ReleaseError, Result};
use crate::http::HttpResponse;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, info, warn};

/// Which backend a release targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Github,
    Gitlab,
    Bitbucket,
    /// Self-hosted Bitbucket Server; needs a host
    #[serde(rename = "bitbucket-server")]
    BitbucketServer,
    /// Any git remote reached over HTTPS, SSH or a local path
    Git,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Github => "github",
            ProviderKind::Gitlab => "gitlab",
            ProviderKind::Bitbucket => "bitbucket",
            ProviderKind::BitbucketServer => "bitbucket-server",
            ProviderKind::Git => "git",
        }
    }

    pub fn is_hosted(&self) -> bool {
        !matches!(self, ProviderKind::Git)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The tag to publish, where, and with which notes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub tag: String,
    /// Full commit hash the tag must point at
    pub commit: String,
    /// Change notes, used as release body or tag message
    pub notes: String,
}

impl ReleaseRequest {
    pub fn new(tag: impl Into<String>, commit: impl Into<String>, notes: impl Into<String>) -> Self {
        ReleaseRequest {
            tag: tag.into(),
            commit: commit.into(),
            notes: notes.into(),
        }
    }
}

/// Result of a backend write that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The vendor reported the artifact already exists
    AlreadyExists,
}

/// Capability interface every backend implements
pub trait TagProvider {
    /// Short backend name used in diagnostics
    fn name(&self) -> &'static str;

    /// Report whether `tag` exists and whether it points at `commit`.
    ///
    /// # Returns
    /// * `Ok(TagState::Absent)` - backend reports the tag is not found
    /// * `Ok(TagState::Matches)` - tag exists at `commit`
    /// * `Ok(TagState::Mismatch)` - tag exists at another commit
    /// * `Err` - authorization failure or any other backend/transport failure;
    ///   never to be read as permission to create
    fn resolve_tag_state(&self, tag: &str, commit: &str) -> Result<TagState>;

    /// Perform the backend write unconditionally.
    ///
    /// Callers go through [ensure_tag], which only calls this after the tag
    /// was resolved as absent.
    fn create_tag(&self, request: &ReleaseRequest) -> Result<CreateOutcome>;
}

impl<P: TagProvider + ?Sized> TagProvider for &P {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resolve_tag_state(&self, tag: &str, commit: &str) -> Result<TagState> {
        (**self).resolve_tag_state(tag, commit)
    }

    fn create_tag(&self, request: &ReleaseRequest) -> Result<CreateOutcome> {
        (**self).create_tag(request)
    }
}

impl<P: TagProvider + ?Sized> TagProvider for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resolve_tag_state(&self, tag: &str, commit: &str) -> Result<TagState> {
        (**self).resolve_tag_state(tag, commit)
    }

    fn create_tag(&self, request: &ReleaseRequest) -> Result<CreateOutcome> {
        (**self).create_tag(request)
    }
}

/// Idempotently make sure `request.tag` exists at `request.commit`.
///
/// - tag already at the commit: success, no write
/// - tag absent: write; a vendor "already exists" answer is still success
/// - tag at another commit: [ReleaseError::TagConflict], no write
/// - resolution failed: the error is returned, no write
pub fn ensure_tag<P: TagProvider + ?Sized>(provider: &P, request: &ReleaseRequest) -> Result<TagOutcome> {
    match resolve(provider, request)? {
        TagState::Matches => {
            info!(provider = provider.name(), tag = %request.tag, "tag already present at commit");
            Ok(TagOutcome::AlreadyPresent)
        }
        TagState::Absent => match provider.create_tag(request) {
            Ok(CreateOutcome::Created) => {
                info!(provider = provider.name(), tag = %request.tag, commit = %request.commit, "tag created");
                Ok(TagOutcome::Created)
            }
            Ok(CreateOutcome::AlreadyExists) => {
                warn!(provider = provider.name(), tag = %request.tag, "tag was created concurrently");
                Ok(TagOutcome::CreatedConcurrently)
            }
            Err(e) => {
                error!(provider = provider.name(), tag = %request.tag, "tag creation failed: {}", e);
                Err(e)
            }
        },
        TagState::Mismatch { actual } => Err(ReleaseError::TagConflict {
            tag: request.tag.clone(),
            expected: request.commit.clone(),
            actual,
        }),
    }
}

/// Check that the tag could be published: it is either absent or already at the commit.
pub fn check_tag<P: TagProvider + ?Sized>(provider: &P, request: &ReleaseRequest) -> Result<TagState> {
    match resolve(provider, request)? {
        TagState::Mismatch { actual } => Err(ReleaseError::TagConflict {
            tag: request.tag.clone(),
            expected: request.commit.clone(),
            actual,
        }),
        state => Ok(state),
    }
}

fn resolve<P: TagProvider + ?Sized>(provider: &P, request: &ReleaseRequest) -> Result<TagState> {
    provider
        .resolve_tag_state(&request.tag, &request.commit)
        .inspect_err(|e| match e {
            ReleaseError::Auth { .. } => warn!(provider = provider.name(), "{}", e),
            _ => error!(provider = provider.name(), tag = %request.tag, "cannot resolve tag: {}", e),
        })
}

/// Commit hashes are compared case-insensitively
pub fn same_commit(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Turn a response the provider did not expect into an error, keeping the
/// vendor's message verbatim.
pub(crate) fn unexpected_response(provider: &str, response: &HttpResponse) -> ReleaseError {
    let message = response.vendor_message();
    match response.status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ReleaseError::Auth {
            provider: provider.to_string(),
            message,
        },
        StatusCode::NOT_FOUND => ReleaseError::NotFound {
            provider: provider.to_string(),
            message,
        },
        status => ReleaseError::Api {
            provider: provider.to_string(),
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct FakeProvider {
        state: RefCell<Option<Result<TagState>>>,
        create: RefCell<Option<Result<CreateOutcome>>>,
        creates: Cell<usize>,
    }

    impl FakeProvider {
        fn new(state: Result<TagState>, create: Result<CreateOutcome>) -> Self {
            FakeProvider {
                state: RefCell::new(Some(state)),
                create: RefCell::new(Some(create)),
                creates: Cell::new(0),
            }
        }
    }

    impl TagProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn resolve_tag_state(&self, _tag: &str, _commit: &str) -> Result<TagState> {
            self.state.borrow_mut().take().unwrap()
        }

        fn create_tag(&self, _request: &ReleaseRequest) -> Result<CreateOutcome> {
            self.creates.set(self.creates.get() + 1);
            self.create.borrow_mut().take().unwrap()
        }
    }

    fn request() -> ReleaseRequest {
        ReleaseRequest::new("1.1.0", "abc", "* notes")
    }

    #[test]
    fn test_matching_tag_skips_write() {
        let provider = FakeProvider::new(Ok(TagState::Matches), Ok(CreateOutcome::Created));
        assert_eq!(ensure_tag(&provider, &request()).unwrap(), TagOutcome::AlreadyPresent);
        assert_eq!(provider.creates.get(), 0);
    }

    #[test]
    fn test_absent_tag_is_created() {
        let provider = FakeProvider::new(Ok(TagState::Absent), Ok(CreateOutcome::Created));
        assert_eq!(ensure_tag(&provider, &request()).unwrap(), TagOutcome::Created);
        assert_eq!(provider.creates.get(), 1);
    }

    #[test]
    fn test_already_exists_on_create_is_success() {
        let provider = FakeProvider::new(Ok(TagState::Absent), Ok(CreateOutcome::AlreadyExists));
        assert_eq!(
            ensure_tag(&provider, &request()).unwrap(),
            TagOutcome::CreatedConcurrently
        );
    }

    #[test]
    fn test_create_failure_is_failure() {
        let provider = FakeProvider::new(
            Ok(TagState::Absent),
            Err(ReleaseError::transport("connection reset")),
        );
        assert!(ensure_tag(&provider, &request()).is_err());
    }

    #[test]
    fn test_mismatch_never_writes() {
        let provider = FakeProvider::new(
            Ok(TagState::Mismatch {
                actual: "def".to_string(),
            }),
            Ok(CreateOutcome::Created),
        );
        let err = ensure_tag(&provider, &request()).unwrap_err();
        assert!(matches!(err, ReleaseError::TagConflict { .. }));
        assert_eq!(provider.creates.get(), 0);
    }

    #[test]
    fn test_auth_failure_never_writes() {
        let provider = FakeProvider::new(
            Err(ReleaseError::Auth {
                provider: "fake".to_string(),
                message: "bad token".to_string(),
            }),
            Ok(CreateOutcome::Created),
        );
        let err = ensure_tag(&provider, &request()).unwrap_err();
        assert!(matches!(err, ReleaseError::Auth { .. }));
        assert_eq!(provider.creates.get(), 0);
    }

    #[test]
    fn test_check_tag() {
        let absent = FakeProvider::new(Ok(TagState::Absent), Ok(CreateOutcome::Created));
        assert_eq!(check_tag(&absent, &request()).unwrap(), TagState::Absent);

        let matches = FakeProvider::new(Ok(TagState::Matches), Ok(CreateOutcome::Created));
        assert_eq!(check_tag(&matches, &request()).unwrap(), TagState::Matches);

        let mismatch = FakeProvider::new(
            Ok(TagState::Mismatch {
                actual: "def".to_string(),
            }),
            Ok(CreateOutcome::Created),
        );
        assert!(check_tag(&mismatch, &request()).is_err());
        assert_eq!(mismatch.creates.get(), 0);
    }

    #[test]
    fn test_provider_kind_names() {
        #[derive(Deserialize)]
        struct Holder {
            provider: ProviderKind,
        }

        let parsed: Holder = toml::from_str("provider = \"bitbucket-server\"").unwrap();
        assert_eq!(parsed.provider, ProviderKind::BitbucketServer);
        assert_eq!(ProviderKind::BitbucketServer.to_string(), "bitbucket-server");
        assert!(ProviderKind::BitbucketServer.is_hosted());
        assert!(!ProviderKind::Git.is_hosted());

        use clap::ValueEnum;
        let from_flag = ProviderKind::from_str("bitbucket-server", false).unwrap();
        assert_eq!(from_flag, ProviderKind::BitbucketServer);
    }

    #[test]
    fn test_same_commit() {
        assert!(same_commit("ABCDEF", "abcdef"));
        assert!(!same_commit("abc", "abd"));
    }

    #[test]
    fn test_unexpected_response_mapping() {
        let unauthorized = HttpResponse::new(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(
            unexpected_response("github", &unauthorized),
            ReleaseError::Auth { .. }
        ));

        let missing = HttpResponse::new(StatusCode::NOT_FOUND, r#"{"message":"Not Found"}"#);
        assert!(matches!(
            unexpected_response("github", &missing),
            ReleaseError::NotFound { .. }
        ));

        let unavailable = HttpResponse::new(StatusCode::SERVICE_UNAVAILABLE, "down");
        match unexpected_response("gitlab", &unavailable) {
            ReleaseError::Api { status, message, .. } => {
                assert_eq!(status, 503);
                assert_eq!(message, "down");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
