//! Direct git access for the provider that talks to a plain remote
//!
//! The [TagRepository] trait covers exactly what publishing a tag needs:
//! find where a tag points, create an annotated tag and push it. The concrete
//! implementations are:
//!
//! - [session::GitSession]: scratch repository fetched from the remote with `git2`
//! - [mock::MockRepository]: in-memory double for tests
//!
//! Code that publishes tags should depend on the trait so it can run against
//! the mock.

pub mod mock;
pub mod session;

pub use mock::MockRepository;
pub use session::GitSession;

use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};

/// Username used for SSH when none is configured
pub const DEFAULT_SSH_USER: &str = "git";

/// Credentials presented to the remote
#[derive(Clone, PartialEq, Eq)]
pub enum GitAuth {
    /// HTTPS username and password (or token)
    Basic { username: String, password: String },
    /// Private key file, with the password used as its passphrase
    SshKey {
        username: String,
        key_path: PathBuf,
        passphrase: Option<String>,
    },
}

impl GitAuth {
    /// Pick the auth method from the command-line credentials.
    ///
    /// An SSH key wins over basic auth; in that case `password` unlocks the key
    /// and an empty `username` falls back to [DEFAULT_SSH_USER].
    pub fn from_credentials(username: &str, password: &str, ssh_key: Option<&Path>) -> Self {
        match ssh_key {
            Some(key_path) => GitAuth::SshKey {
                username: if username.is_empty() {
                    DEFAULT_SSH_USER.to_string()
                } else {
                    username.to_string()
                },
                key_path: key_path.to_path_buf(),
                passphrase: Some(password.to_string()).filter(|p| !p.is_empty()),
            },
            None => GitAuth::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
        }
    }

    pub fn username(&self) -> &str {
        match self {
            GitAuth::Basic { username, .. } | GitAuth::SshKey { username, .. } => username,
        }
    }
}

impl fmt::Debug for GitAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitAuth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            GitAuth::SshKey {
                username,
                key_path,
                passphrase,
            } => f
                .debug_struct("SshKey")
                .field("username", username)
                .field("key_path", key_path)
                .field("passphrase", &passphrase.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Identity recorded on annotated tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tagger {
    pub name: String,
    pub email: String,
}

impl Tagger {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Tagger {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Tag operations against a repository mirrored from one remote
pub trait TagRepository {
    /// Commit the tag points at, peeled through annotated tag objects.
    ///
    /// # Returns
    /// * `Ok(Some(hash))` - full hex hash of the tagged commit
    /// * `Ok(None)` - no such tag
    /// * `Err` - the tag exists but cannot be read
    fn find_tag_target(&self, tag: &str) -> Result<Option<String>>;

    /// Create an annotated tag at `commit` with `message` as its body
    fn create_annotated_tag(&self, tag: &str, commit: &str, tagger: &Tagger, message: &str) -> Result<()>;

    /// Push a single tag to the remote; a rejected ref is an error
    fn push_tag(&self, tag: &str) -> Result<()>;
}
