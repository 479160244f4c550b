use crate::domain::TagState;
use crate::error::Result;
use crate::http::{endpoint, HttpAuth, HttpRequest, HttpTransport};
use crate::provider::{same_commit, unexpected_response, CreateOutcome, ReleaseRequest, TagProvider};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct Object {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct Reference {
    #[serde(rename = "ref")]
    name: String,
    object: Object,
}

/// `git/refs/tags/{tag}` answers with a single ref on an exact match and with
/// an array of every ref sharing the prefix otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RefLookup {
    Exact(Reference),
    Prefixed(Vec<Reference>),
}

impl RefLookup {
    fn into_exact(self, tag: &str) -> Option<Reference> {
        let wanted = format!("refs/tags/{}", tag);
        match self {
            RefLookup::Exact(reference) => Some(reference).filter(|r| r.name == wanted),
            RefLookup::Prefixed(references) => references.into_iter().find(|r| r.name == wanted),
        }
    }
}

#[derive(Debug, Serialize)]
struct Release<'a> {
    tag_name: &'a str,
    target_commitish: &'a str,
    name: &'a str,
    body: &'a str,
    draft: bool,
    prerelease: bool,
}

#[derive(Debug, Deserialize)]
pub struct ValidationError {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Deserialize)]
struct BadResponse {
    #[serde(default)]
    errors: Vec<ValidationError>,
}

/// GitHub rejects a second release for the same tag with a 422 whose
/// validation errors carry the `already_exists` code
pub fn is_release_already_exists(errors: &[ValidationError]) -> bool {
    errors.iter().any(|e| e.code == "already_exists")
}

/// GitHub: publishing a release creates the tag it names
pub struct GithubProvider<T: HttpTransport> {
    transport: T,
    base: String,
    repo: String,
    username: String,
    password: String,
}

impl<T: HttpTransport> GithubProvider<T> {
    pub fn new(
        transport: T,
        repo: impl Into<String>,
        host: Option<&str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        GithubProvider {
            transport,
            base: host.unwrap_or(DEFAULT_API_BASE).to_string(),
            repo: repo.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    fn url(&self, tail: &[&str]) -> Result<Url> {
        let mut segments = vec!["repos"];
        segments.extend(self.repo.split('/'));
        segments.extend_from_slice(tail);
        endpoint(&self.base, segments)
    }

    fn request(&self, request: HttpRequest) -> HttpRequest {
        request
            .auth(HttpAuth::Basic {
                username: self.username.clone(),
                password: self.password.clone(),
            })
            .header("Accept", ACCEPT)
    }
}

impl<T: HttpTransport> TagProvider for GithubProvider<T> {
    fn name(&self) -> &'static str {
        "github"
    }

    fn resolve_tag_state(&self, tag: &str, commit: &str) -> Result<TagState> {
        let request = self.request(HttpRequest::get(self.url(&["git", "refs", "tags", tag])?));
        let response = self.transport.send(&request)?;

        match response.status {
            StatusCode::NOT_FOUND => Ok(TagState::Absent),
            StatusCode::OK => match response.json::<RefLookup>()?.into_exact(tag) {
                None => {
                    debug!(tag, "only refs sharing the prefix exist");
                    Ok(TagState::Absent)
                }
                Some(reference) if same_commit(&reference.object.sha, commit) => Ok(TagState::Matches),
                Some(reference) => Ok(TagState::Mismatch {
                    actual: reference.object.sha,
                }),
            },
            _ => Err(unexpected_response(self.name(), &response)),
        }
    }

    fn create_tag(&self, release: &ReleaseRequest) -> Result<CreateOutcome> {
        let body = Release {
            tag_name: &release.tag,
            target_commitish: &release.commit,
            name: &release.tag,
            body: &release.notes,
            draft: false,
            prerelease: false,
        };
        let request = self.request(HttpRequest::post(self.url(&["releases"])?).json(serde_json::to_value(&body)?));
        let response = self.transport.send(&request)?;

        match response.status {
            StatusCode::CREATED => Ok(CreateOutcome::Created),
            StatusCode::UNPROCESSABLE_ENTITY => {
                let errors = response.json::<BadResponse>().map(|bad| bad.errors).unwrap_or_default();
                if is_release_already_exists(&errors) {
                    Ok(CreateOutcome::AlreadyExists)
                } else {
                    Err(unexpected_response(self.name(), &response))
                }
            }
            _ => Err(unexpected_response(self.name(), &response)),
        }
    }
}
