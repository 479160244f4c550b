//! Release workflows behind the `create` and `validate` sub-commands
//!
//! Kept apart from `main.rs` so the workflows can be driven without clap.
//! Backends are built through a `connect` closure that is only called once
//! the changelog has been validated: a bad changelog never reaches the network.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::domain::{ReleaseDraft, TagOutcome, TagState};
use crate::error::{ReleaseError, Result};
use crate::git::{GitAuth, GitSession, Tagger};
use crate::http::ReqwestTransport;
use crate::provider::{
    check_tag, ensure_tag, BitbucketProvider, BitbucketServerProvider, GitProvider, GithubProvider, GitlabProvider, ProviderKind,
    ReleaseRequest, TagProvider,
};

/// Arguments shared by `create` and `validate`, after config defaults were applied
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReleaseArgs {
    pub provider: Option<ProviderKind>,
    pub username: String,
    pub password: String,
    /// Tagger email (direct git only)
    pub email: String,
    /// "owner/name" on a hosted provider
    pub repo: String,
    /// Path of the changelog file
    pub changelog: String,
    /// Commit the tag must point at
    pub hash: String,
    pub host: Option<String>,
    /// Remote URL or path (direct git only)
    pub origin: String,
    pub ssh_key: Option<PathBuf>,
}

/// Result of a successful `create`
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowResult {
    /// The tag that now exists at the commit
    pub tag: String,
    pub outcome: TagOutcome,
}

/// Result of a successful `validate`
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub tag: String,
    /// `Absent` or `Matches`; a mismatch is an error
    pub state: TagState,
}

/// List every missing or inconsistent argument, one message per problem.
pub fn check_args(args: &ReleaseArgs) -> Vec<String> {
    let mut problems = Vec::new();

    let Some(provider) = args.provider else {
        problems.push("--provider required, valid values are github, gitlab, bitbucket, bitbucket-server, git".to_string());
        return problems;
    };

    let uses_ssh = provider == ProviderKind::Git && args.ssh_key.is_some();

    if args.username.is_empty() && provider != ProviderKind::Gitlab && !uses_ssh {
        problems.push("--username required".to_string());
    }
    if args.password.is_empty() && !uses_ssh {
        problems.push("--password required".to_string());
    }
    if provider.is_hosted() && args.repo.is_empty() {
        problems.push("--repo required".to_string());
    }
    if provider == ProviderKind::BitbucketServer && args.host.as_deref().unwrap_or_default().is_empty() {
        problems.push("--host required".to_string());
    }
    if provider == ProviderKind::Git {
        if args.email.is_empty() {
            problems.push("--email required".to_string());
        }
        if args.origin.is_empty() {
            problems.push("--origin required".to_string());
        }
    }
    if args.changelog.is_empty() {
        problems.push("--changelog required".to_string());
    }
    if args.hash.is_empty() {
        problems.push("--hash required".to_string());
    } else if provider == ProviderKind::Git && !is_full_hash(&args.hash) {
        problems.push("--hash must be a full 40 character commit hash".to_string());
    }

    problems
}

/// libgit2 zero-fills an abbreviated object id, so direct git needs the full hash
fn is_full_hash(hash: &str) -> bool {
    hash.len() == 40 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Parse the changelog and check that the desired version moves forward.
pub fn prepare_release(changelog: &str) -> Result<ReleaseDraft> {
    let draft = ReleaseDraft::from_changelog(changelog)?;
    draft.validate_ordering()?;
    Ok(draft)
}

/// Publish the changelog's desired version as a tag at `commit`.
pub fn create_release<P, F>(changelog: &str, commit: &str, connect: F) -> Result<WorkflowResult>
where
    P: TagProvider,
    F: FnOnce() -> Result<P>,
{
    let draft = prepare_release(changelog)?;
    let provider = connect()?;

    let request = ReleaseRequest::new(draft.tag, commit, draft.changes);
    let outcome = ensure_tag(&provider, &request)?;
    info!(tag = %request.tag, %outcome, "release finished");

    Ok(WorkflowResult {
        tag: request.tag,
        outcome,
    })
}

/// Check that the changelog's desired version could be published at `commit`.
pub fn validate_release<P, F>(changelog: &str, commit: &str, connect: F) -> Result<ValidationResult>
where
    P: TagProvider,
    F: FnOnce() -> Result<P>,
{
    let draft = prepare_release(changelog)?;
    let provider = connect()?;

    let request = ReleaseRequest::new(draft.tag, commit, draft.changes);
    let state = check_tag(&provider, &request)?;

    Ok(ValidationResult {
        tag: request.tag,
        state,
    })
}

/// Build the backend selected by `args.provider`.
///
/// For direct git this fetches the remote into a fresh scratch repository.
pub fn connect(args: &ReleaseArgs) -> Result<Box<dyn TagProvider>> {
    let kind = args
        .provider
        .ok_or_else(|| ReleaseError::usage("--provider required"))?;
    let host = args.host.as_deref();

    info!(provider = %kind, "connecting");
    let provider: Box<dyn TagProvider> = match kind {
        ProviderKind::Github => Box::new(GithubProvider::new(
            ReqwestTransport::new()?,
            &args.repo,
            host,
            &args.username,
            &args.password,
        )),
        ProviderKind::Gitlab => Box::new(GitlabProvider::new(
            ReqwestTransport::new()?,
            &args.repo,
            host,
            &args.password,
        )),
        ProviderKind::Bitbucket => Box::new(BitbucketProvider::new(
            ReqwestTransport::new()?,
            &args.repo,
            host,
            &args.username,
            &args.password,
        )),
        ProviderKind::BitbucketServer => Box::new(BitbucketServerProvider::new(
            ReqwestTransport::new()?,
            host.unwrap_or_default(),
            &args.repo,
            &args.username,
            &args.password,
        )),
        ProviderKind::Git => {
            let auth = GitAuth::from_credentials(&args.username, &args.password, args.ssh_key.as_deref());
            let tagger = Tagger::new(auth.username(), &args.email);
            let session = GitSession::initialize(&args.origin, auth)?;
            Box::new(GitProvider::new(session, tagger))
        }
    };

    Ok(provider)
}

fn read_changelog(args: &ReleaseArgs) -> Result<String> {
    let problems = check_args(args);
    if !problems.is_empty() {
        return Err(ReleaseError::usage(format!("missing flags:\n{}", problems.join("\n"))));
    }

    fs::read_to_string(&args.changelog)
        .map_err(|e| ReleaseError::usage(format!("Unable to read changelog {}: {}", args.changelog, e)))
}

/// `create` sub-command: check arguments, read the changelog and publish.
pub fn run_create(args: &ReleaseArgs) -> Result<WorkflowResult> {
    let changelog = read_changelog(args)?;
    create_release(&changelog, &args.hash, || connect(args))
}

/// `validate` sub-command: same inputs as `create`, never writes.
pub fn run_validate(args: &ReleaseArgs) -> Result<ValidationResult> {
    let changelog = read_changelog(args)?;
    validate_release(&changelog, &args.hash, || connect(args))
}
