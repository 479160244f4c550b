use crate::domain::TagState;
use crate::error::Result;
use crate::http::{endpoint, HttpAuth, HttpRequest, HttpResponse, HttpTransport};
use crate::provider::{same_commit, unexpected_response, CreateOutcome, ReleaseRequest, TagProvider};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

pub const DEFAULT_API_BASE: &str = "https://gitlab.com/api/v4";

#[derive(Debug, Deserialize)]
struct Commit {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Tag {
    commit: Commit,
}

#[derive(Debug, Default, Deserialize)]
struct BadResponse {
    #[serde(default)]
    message: String,
}

impl BadResponse {
    fn message_of(response: &HttpResponse) -> String {
        response.json::<BadResponse>().unwrap_or_default().message
    }
}

pub fn is_tag_already_exists(tag: &str, message: &str) -> bool {
    message == format!("Tag {} already exists", tag)
}

pub fn is_release_already_exists(message: &str) -> bool {
    message == "Release already exists"
}

/// GitLab: the tag and its release note are two separate resources, both
/// written during a create.
pub struct GitlabProvider<T: HttpTransport> {
    transport: T,
    base: String,
    repo: String,
    token: String,
}

impl<T: HttpTransport> GitlabProvider<T> {
    /// `repo` is the project path ("group/project"); it is sent as one escaped segment
    pub fn new(transport: T, repo: impl Into<String>, host: Option<&str>, token: impl Into<String>) -> Self {
        GitlabProvider {
            transport,
            base: host.unwrap_or(DEFAULT_API_BASE).to_string(),
            repo: repo.into(),
            token: token.into(),
        }
    }

    fn url(&self, tail: &[&str]) -> Result<Url> {
        let mut segments = vec!["projects", self.repo.as_str(), "repository", "tags"];
        segments.extend_from_slice(tail);
        endpoint(&self.base, segments)
    }

    fn auth(&self) -> HttpAuth {
        HttpAuth::PrivateToken(self.token.clone())
    }

    fn create_release_note(&self, release: &ReleaseRequest) -> Result<()> {
        let request = HttpRequest::post(self.url(&[release.tag.as_str(), "release"])?)
            .auth(self.auth())
            .json(json!({ "description": release.notes }));
        let response = self.transport.send(&request)?;

        match response.status {
            StatusCode::CREATED => {
                info!(tag = %release.tag, "gitlab release note created");
                Ok(())
            }
            StatusCode::CONFLICT if is_release_already_exists(&BadResponse::message_of(&response)) => {
                debug!(tag = %release.tag, "gitlab release note already present");
                Ok(())
            }
            _ => Err(unexpected_response(self.name(), &response)),
        }
    }
}

impl<T: HttpTransport> TagProvider for GitlabProvider<T> {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn resolve_tag_state(&self, tag: &str, commit: &str) -> Result<TagState> {
        let request = HttpRequest::get(self.url(&[tag])?).auth(self.auth());
        let response = self.transport.send(&request)?;

        match response.status {
            StatusCode::NOT_FOUND => Ok(TagState::Absent),
            StatusCode::OK => {
                let found: Tag = response.json()?;
                if same_commit(&found.commit.id, commit) {
                    Ok(TagState::Matches)
                } else {
                    Ok(TagState::Mismatch {
                        actual: found.commit.id,
                    })
                }
            }
            _ => Err(unexpected_response(self.name(), &response)),
        }
    }

    /// Create the tag, then its release note. A tag that already exists still
    /// gets the release note; a failed release note fails the whole create.
    fn create_tag(&self, release: &ReleaseRequest) -> Result<CreateOutcome> {
        let mut url = self.url(&[])?;
        url.query_pairs_mut()
            .append_pair("tag_name", &release.tag)
            .append_pair("ref", &release.commit);

        let request = HttpRequest::post(url).auth(self.auth());
        let response = self.transport.send(&request)?;

        let outcome = match response.status {
            StatusCode::CREATED => CreateOutcome::Created,
            StatusCode::BAD_REQUEST
                if is_tag_already_exists(&release.tag, &BadResponse::message_of(&response)) =>
            {
                CreateOutcome::AlreadyExists
            }
            _ => return Err(unexpected_response(self.name(), &response)),
        };

        self.create_release_note(release)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;
    use crate::http::{Method, MockTransport};

    fn provider(mock: &MockTransport) -> GitlabProvider<&MockTransport> {
        GitlabProvider::new(mock, "org/repo", None, "token")
    }

    #[test]
    fn test_project_path_is_escaped() {
        let mock = MockTransport::new();
        assert_eq!(
            provider(&mock).url(&["1.0.0"]).unwrap().as_str(),
            "https://gitlab.com/api/v4/projects/org%2Frepo/repository/tags/1.0.0"
        );

        let hosted = GitlabProvider::new(&mock, "org/repo", Some("https://git.example.com/api/v4"), "t");
        assert_eq!(
            hosted.url(&[]).unwrap().as_str(),
            "https://git.example.com/api/v4/projects/org%2Frepo/repository/tags"
        );
    }

    #[test]
    fn test_resolve_uses_private_token() {
        let mock = MockTransport::new().reply(StatusCode::NOT_FOUND, "");
        assert_eq!(provider(&mock).resolve_tag_state("tag", "hash").unwrap(), TagState::Absent);
        assert_eq!(
            mock.requests()[0].auth,
            Some(HttpAuth::PrivateToken("token".to_string()))
        );
    }

    #[test]
    fn test_resolve_compares_commit_id() {
        let mock = MockTransport::new()
            .reply_json(StatusCode::OK, json!({"name": "tag", "commit": {"id": "hash"}}))
            .reply_json(StatusCode::OK, json!({"name": "tag", "commit": {"id": "hash"}}));
        let gitlab = provider(&mock);

        assert_eq!(gitlab.resolve_tag_state("tag", "hash").unwrap(), TagState::Matches);
        assert_eq!(
            gitlab.resolve_tag_state("tag", "other").unwrap(),
            TagState::Mismatch {
                actual: "hash".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_forbidden_is_auth_error() {
        let mock = MockTransport::new().reply_json(StatusCode::FORBIDDEN, json!({"message": "403 Forbidden"}));
        let err = provider(&mock).resolve_tag_state("tag", "hash").unwrap_err();
        assert!(matches!(err, ReleaseError::Auth { .. }));
    }

    #[test]
    fn test_create_tag_then_release_note() {
        let mock = MockTransport::new()
            .reply(StatusCode::CREATED, "{}")
            .reply(StatusCode::CREATED, "{}");
        let outcome = provider(&mock)
            .create_tag(&ReleaseRequest::new("1.1.0", "abc", "* notes"))
            .unwrap();
        assert_eq!(outcome, CreateOutcome::Created);

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url.query(), Some("tag_name=1.1.0&ref=abc"));
        assert!(requests[1].url.path().ends_with("/repository/tags/1.1.0/release"));
        assert_eq!(requests[1].body, Some(json!({"description": "* notes"})));
    }

    #[test]
    fn test_existing_tag_still_gets_release_note() {
        let mock = MockTransport::new()
            .reply_json(StatusCode::BAD_REQUEST, json!({"message": "Tag 1.1.0 already exists"}))
            .reply(StatusCode::CREATED, "{}");
        let outcome = provider(&mock)
            .create_tag(&ReleaseRequest::new("1.1.0", "abc", "notes"))
            .unwrap();
        assert_eq!(outcome, CreateOutcome::AlreadyExists);
        assert_eq!(mock.request_count(), 2);
    }

    #[test]
    fn test_existing_release_note_is_success() {
        let mock = MockTransport::new()
            .reply(StatusCode::CREATED, "{}")
            .reply_json(StatusCode::CONFLICT, json!({"message": "Release already exists"}));
        let outcome = provider(&mock)
            .create_tag(&ReleaseRequest::new("1.1.0", "abc", "notes"))
            .unwrap();
        assert_eq!(outcome, CreateOutcome::Created);
    }

    #[test]
    fn test_failed_release_note_fails_create() {
        let mock = MockTransport::new()
            .reply(StatusCode::CREATED, "{}")
            .reply_json(StatusCode::INTERNAL_SERVER_ERROR, json!({"message": "boom"}));
        let err = provider(&mock)
            .create_tag(&ReleaseRequest::new("1.1.0", "abc", "notes"))
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Api { status: 500, .. }));
    }

    #[test]
    fn test_other_bad_request_skips_release_note() {
        let mock = MockTransport::new()
            .reply_json(StatusCode::BAD_REQUEST, json!({"message": "Target abc is invalid"}));
        let err = provider(&mock)
            .create_tag(&ReleaseRequest::new("1.1.0", "abc", "notes"))
            .unwrap_err();
        assert!(err.to_string().contains("Target abc is invalid"));
        assert_eq!(mock.request_count(), 1);
    }

    #[test]
    fn test_message_matchers() {
        assert!(is_tag_already_exists("2.0.0", "Tag 2.0.0 already exists"));
        assert!(!is_tag_already_exists("2.0.0", "Tag 2.0.1 already exists"));
        assert!(is_release_already_exists("Release already exists"));
        assert!(!is_release_already_exists("Release not found"));
    }
}
