use crate::domain::TagState;
use crate::error::{ReleaseError, Result};
use crate::http::{endpoint, HttpAuth, HttpRequest, HttpTransport};
use crate::provider::{same_commit, unexpected_response, CreateOutcome, ReleaseRequest, TagProvider};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerTag {
    latest_commit: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerTagBody<'a> {
    name: &'a str,
    start_point: &'a str,
    message: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub exception_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ServerErrors {
    #[serde(default)]
    errors: Vec<ServerError>,
}

/// Bitbucket Server answers a duplicate ref with a `DuplicateRefException`
pub fn is_tag_already_exists(errors: &[ServerError]) -> bool {
    errors
        .iter()
        .any(|e| e.exception_name.ends_with(".DuplicateRefException"))
}

/// Self-hosted Bitbucket Server / Data Center, REST API 1.0
pub struct BitbucketServerProvider<T: HttpTransport> {
    transport: T,
    host: String,
    repo: String,
    username: String,
    password: String,
}

impl<T: HttpTransport> BitbucketServerProvider<T> {
    /// # Arguments
    /// * `host` - server root, e.g. `https://bitbucket.example.com`
    /// * `repo` - "PROJECT/slug"
    pub fn new(
        transport: T,
        host: impl Into<String>,
        repo: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        BitbucketServerProvider {
            transport,
            host: host.into(),
            repo: repo.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    fn tags_url(&self, tag: Option<&str>) -> Result<Url> {
        let (project, slug) = self
            .repo
            .split_once('/')
            .filter(|(project, slug)| !project.is_empty() && !slug.is_empty())
            .ok_or_else(|| {
                ReleaseError::usage(format!("--repo must be PROJECT/slug for bitbucket-server, got '{}'", self.repo))
            })?;

        let mut segments = vec!["rest", "api", "1.0", "projects", project, "repos", slug, "tags"];
        segments.extend(tag);
        endpoint(&self.host, segments)
    }

    fn auth(&self) -> HttpAuth {
        HttpAuth::Basic {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

impl<T: HttpTransport> TagProvider for BitbucketServerProvider<T> {
    fn name(&self) -> &'static str {
        "bitbucket-server"
    }

    fn resolve_tag_state(&self, tag: &str, commit: &str) -> Result<TagState> {
        let request = HttpRequest::get(self.tags_url(Some(tag))?).auth(self.auth());
        let response = self.transport.send(&request)?;

        match response.status {
            StatusCode::NOT_FOUND => Ok(TagState::Absent),
            StatusCode::OK => {
                let found: ServerTag = response.json()?;
                debug!(tag, target = %found.latest_commit, "bitbucket server tag found");
                if same_commit(&found.latest_commit, commit) {
                    Ok(TagState::Matches)
                } else {
                    Ok(TagState::Mismatch {
                        actual: found.latest_commit,
                    })
                }
            }
            _ => Err(unexpected_response(self.name(), &response)),
        }
    }

    fn create_tag(&self, release: &ReleaseRequest) -> Result<CreateOutcome> {
        let body = ServerTagBody {
            name: &release.tag,
            start_point: &release.commit,
            message: &release.notes,
        };
        let request = HttpRequest::post(self.tags_url(None)?)
            .auth(self.auth())
            .json(serde_json::to_value(body)?);
        let response = self.transport.send(&request)?;

        match response.status {
            StatusCode::OK | StatusCode::CREATED => Ok(CreateOutcome::Created),
            StatusCode::CONFLICT | StatusCode::BAD_REQUEST => {
                let errors = response.json::<ServerErrors>().unwrap_or_default().errors;
                if is_tag_already_exists(&errors) {
                    Ok(CreateOutcome::AlreadyExists)
                } else {
                    Err(unexpected_response(self.name(), &response))
                }
            }
            _ => Err(unexpected_response(self.name(), &response)),
        }
    }
}
