use crate::domain::TagState;
use crate::error::Result;
use crate::http::{endpoint, HttpAuth, HttpRequest, HttpTransport};
use crate::provider::{same_commit, unexpected_response, CreateOutcome, ReleaseRequest, TagProvider};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.bitbucket.org/2.0";

#[derive(Debug, Deserialize)]
struct Target {
    hash: String,
}

#[derive(Debug, Deserialize)]
struct Tag {
    target: Target,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct BadResponse {
    #[serde(default)]
    error: ErrorDetail,
}

/// Bitbucket refuses a duplicate tag with exactly this message
pub fn is_tag_already_exists(tag: &str, message: &str) -> bool {
    message == format!("tag \"{}\" already exists", tag)
}

/// Bitbucket Cloud: the tag object itself is the resource
pub struct BitbucketProvider<T: HttpTransport> {
    transport: T,
    base: String,
    repo: String,
    username: String,
    password: String,
}

impl<T: HttpTransport> BitbucketProvider<T> {
    /// # Arguments
    /// * `repo` - "workspace/slug"
    /// * `host` - API base override, used verbatim instead of [DEFAULT_API_BASE]
    pub fn new(
        transport: T,
        repo: impl Into<String>,
        host: Option<&str>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        BitbucketProvider {
            transport,
            base: host.unwrap_or(DEFAULT_API_BASE).to_string(),
            repo: repo.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    fn tags_url(&self, tag: Option<&str>) -> Result<Url> {
        let mut segments = vec!["repositories"];
        segments.extend(self.repo.split('/'));
        segments.extend(["refs", "tags"]);
        segments.extend(tag);
        endpoint(&self.base, segments)
    }

    fn auth(&self) -> HttpAuth {
        HttpAuth::Basic {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl<T: HttpTransport> TagProvider for BitbucketProvider<T> {
    fn name(&self) -> &'static str {
        "bitbucket"
    }

    fn resolve_tag_state(&self, tag: &str, commit: &str) -> Result<TagState> {
        let request = HttpRequest::get(self.tags_url(Some(tag))?).auth(self.auth());
        let response = self.transport.send(&request)?;

        match response.status {
            StatusCode::NOT_FOUND => Ok(TagState::Absent),
            StatusCode::OK => {
                let found: Tag = response.json()?;
                debug!(tag, target = %found.target.hash, "bitbucket tag found");
                if same_commit(&found.target.hash, commit) {
                    Ok(TagState::Matches)
                } else {
                    Ok(TagState::Mismatch {
                        actual: found.target.hash,
                    })
                }
            }
            _ => Err(unexpected_response(self.name(), &response)),
        }
    }

    fn create_tag(&self, release: &ReleaseRequest) -> Result<CreateOutcome> {
        let body = json!({
            "name": release.tag,
            "target": { "hash": release.commit },
        });
        let request = HttpRequest::post(self.tags_url(None)?)
            .auth(self.auth())
            .json(body);
        let response = self.transport.send(&request)?;

        match response.status {
            StatusCode::CREATED | StatusCode::OK => Ok(CreateOutcome::Created),
            StatusCode::BAD_REQUEST => {
                let message = response
                    .json::<BadResponse>()
                    .map(|bad| bad.error.message)
                    .unwrap_or_default();
                if is_tag_already_exists(&release.tag, &message) {
                    Ok(CreateOutcome::AlreadyExists)
                } else {
                    Err(unexpected_response(self.name(), &response))
                }
            }
            _ => Err(unexpected_response(self.name(), &response)),
        }
    }
}
