use crate::error::{ReleaseError, Result};
use crate::git::{GitAuth, TagRepository, Tagger};
use git2::{
    Cred, CredentialType, ErrorCode, FetchOptions, ObjectType, Oid, PushOptions, RemoteCallbacks,
    Repository, Signature,
};
use tempfile::TempDir;
use tracing::{debug, info};

const REMOTE: &str = "origin";

const FETCH_REFSPECS: [&str; 2] = ["+refs/tags/*:refs/tags/*", "+refs/heads/*:refs/remotes/origin/*"];

/// Scratch bare repository mirroring the tags and branches of one remote.
///
/// The repository lives in a temporary directory owned by the session and is
/// removed when the session is dropped. Nothing is shared between sessions.
pub struct GitSession {
    repo: Repository,
    auth: GitAuth,
    // dropped after `repo`
    _dir: TempDir,
}

impl GitSession {
    /// Create the scratch repository, point `origin` at `url` and fetch
    /// every tag and branch from it.
    pub fn initialize(url: &str, auth: GitAuth) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("release-").tempdir()?;
        let repo = Repository::init_bare(dir.path())?;
        repo.remote(REMOTE, url)
            .map_err(|e| ReleaseError::remote(format!("Cannot set origin '{}': {}", url, e)))?;

        let session = GitSession {
            repo,
            auth,
            _dir: dir,
        };
        session.fetch()?;
        Ok(session)
    }

    fn fetch(&self) -> Result<()> {
        let mut remote = self.repo.find_remote(REMOTE)?;
        let mut options = FetchOptions::new();
        options.remote_callbacks(self.callbacks());

        remote
            .fetch(&FETCH_REFSPECS, Some(&mut options), None)
            .map_err(|e| ReleaseError::remote(format!("Failed to fetch from origin: {}", e)))?;

        debug!(tags = self.repo.tag_names(None)?.len(), "fetched origin");
        Ok(())
    }

    fn callbacks(&self) -> RemoteCallbacks<'_> {
        let mut callbacks = RemoteCallbacks::new();
        let auth = &self.auth;
        let mut attempts = 0;

        // libgit2 keeps asking while the remote rejects what we send
        callbacks.credentials(move |_url, _username_from_url, allowed| {
            if allowed == CredentialType::USERNAME {
                return Cred::username(auth.username());
            }
            attempts += 1;
            if attempts > 1 {
                return Err(git2::Error::from_str("Unauthorised, please check credentials"));
            }
            credentials(auth, allowed)
        });

        callbacks
    }
}

fn credentials(auth: &GitAuth, allowed: CredentialType) -> std::result::Result<Cred, git2::Error> {
    match auth {
        GitAuth::SshKey {
            username,
            key_path,
            passphrase,
        } => Cred::ssh_key(username, None, key_path, passphrase.as_deref()),
        GitAuth::Basic { username, password } if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) => {
            Cred::userpass_plaintext(username, password)
        }
        GitAuth::Basic { .. } => Cred::default(),
    }
}

impl TagRepository for GitSession {
    fn find_tag_target(&self, tag: &str) -> Result<Option<String>> {
        let reference_name = format!("refs/tags/{}", tag);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let commit = reference
                    .peel_to_commit()
                    .map_err(|e| ReleaseError::remote(format!("Cannot peel tag '{}': {}", tag, e)))?;
                Ok(Some(commit.id().to_string()))
            }
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(ReleaseError::remote(format!("Cannot find tag '{}': {}", tag, e))),
        }
    }

    fn create_annotated_tag(&self, tag: &str, commit: &str, tagger: &Tagger, message: &str) -> Result<()> {
        let oid = Oid::from_str(commit)
            .map_err(|e| ReleaseError::usage(format!("Invalid commit hash '{}': {}", commit, e)))?;
        let target = self
            .repo
            .find_object(oid, Some(ObjectType::Commit))
            .map_err(|e| ReleaseError::remote(format!("Commit {} not found on origin: {}", commit, e)))?;
        let signature = Signature::now(&tagger.name, &tagger.email)?;

        self.repo.tag(tag, &target, &signature, message, false)?;
        debug!(tag, commit, "annotated tag created locally");
        Ok(())
    }

    fn push_tag(&self, tag: &str) -> Result<()> {
        let mut remote = self.repo.find_remote(REMOTE)?;
        let refspec = format!("refs/tags/{0}:refs/tags/{0}", tag);

        let mut callbacks = self.callbacks();
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "Remote rejected {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        remote
            .push(&[refspec.as_str()], Some(&mut options))
            .map_err(|e| ReleaseError::remote(format!("Failed to push tag '{}': {}", tag, e)))?;

        info!(tag, "tag pushed to origin");
        Ok(())
    }
}
