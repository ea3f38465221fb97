//! The acting admin's login state.
//!
//! A small TOML file stands in for the browser's local storage. It is read
//! once at startup into a [`Session`] that is handed to everything that needs
//! the admin identity.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    username: String,
}

impl Session {
    pub fn new(username: &str) -> Result<Self, SessionError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(SessionError::BlankUsername);
        }
        Ok(Self { username: username.to_string() })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("username must not be blank")]
    BlankUsername,
    #[error("not logged in (no active session at `{0}`); run `reviewdesk login --username <name>`")]
    NotLoggedIn(PathBuf),
    #[error("could not read session file `{path}`: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse session file `{path}`: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("could not write session file `{path}`: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("could not encode session: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    logged_in: bool,
    #[serde(default)]
    username: String,
}

#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` when there is no file, the flag is off, or the username is blank.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SessionError::Read { path: self.path.clone(), source }),
        };

        let file: SessionFile = toml::from_str(&raw)
            .map_err(|source| SessionError::Parse { path: self.path.clone(), source })?;

        if !file.logged_in {
            return Ok(None);
        }
        Ok(Session::new(&file.username).ok())
    }

    pub fn require(&self) -> Result<Session, SessionError> {
        self.load()?.ok_or_else(|| SessionError::NotLoggedIn(self.path.clone()))
    }

    pub fn login(&self, username: &str) -> Result<Session, SessionError> {
        let session = Session::new(username)?;
        let encoded = toml::to_string(&SessionFile {
            logged_in: true,
            username: session.username().to_string(),
        })?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| SessionError::Write { path: self.path.clone(), source })?;
        }
        fs::write(&self.path, encoded)
            .map_err(|source| SessionError::Write { path: self.path.clone(), source })?;

        Ok(session)
    }

    /// Returns whether a session file was removed.
    pub fn logout(&self) -> Result<bool, SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(SessionError::Write { path: self.path.clone(), source }),
        }
    }
}
