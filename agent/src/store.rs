// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: MIT-0

//! Persistence of federated credentials between runs.
//!
//! The cache file is a small JSON object:
//!
//! ```json
//! {
//!     "AccessKeyId": "ASIA...",
//!     "SecretKey": "...",
//!     "SessionToken": "...",
//!     "Expiration": "2025-03-01T12:00:00Z"
//! }
//! ```
//!
//! Reading is lenient: a missing, truncated or otherwise unusable file is
//! reported as absent so that the caller re-federates. Writing is strict and
//! goes through a temporary file in the same directory that is renamed over
//! the cache file, so readers see either the old or the new record.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use zeroize::Zeroize;

use crate::errors::AgentError;
use crate::models::CredentialRecord;

pub trait CredentialStore: Send + Sync {
    /// Returns the stored record, or `None` if there is no usable record.
    fn load(&self) -> Option<CredentialRecord>;

    /// Replaces the stored record.
    fn save(&self, record: &CredentialRecord) -> Result<(), AgentError>;
}

/// Stores the credential record as JSON in a local file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persistence_error(&self, message: impl ToString) -> AgentError {
        AgentError::PersistenceError {
            path: self.path.display().to_string(),
            message: message.to_string(),
        }
    }

    fn write_atomically(&self, contents: &[u8]) -> Result<(), AgentError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // NamedTempFile is created with 0600 permissions on unix
        let mut file = NamedTempFile::new_in(dir).map_err(|err| self.persistence_error(err))?;
        file.write_all(contents)
            .map_err(|err| self.persistence_error(err))?;
        file.as_file()
            .sync_all()
            .map_err(|err| self.persistence_error(err))?;
        file.persist(&self.path)
            .map_err(|err| self.persistence_error(err.error))?;

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Option<CredentialRecord> {
        let mut contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("[agent] no cached credentials");
                return None;
            }
            Err(err) => {
                tracing::warn!("[agent] unable to read cached credentials: {}", err);
                return None;
            }
        };

        let parsed = serde_json::from_str::<CredentialRecord>(&contents);
        contents.zeroize();

        match parsed {
            Ok(record) if record.is_complete() => Some(record),
            Ok(_) => {
                tracing::warn!("[agent] cached credentials are incomplete, ignoring");
                None
            }
            Err(err) => {
                tracing::warn!("[agent] unable to parse cached credentials: {}", err);
                None
            }
        }
    }

    #[tracing::instrument(skip(self, record), fields(path = %self.path.display()))]
    fn save(&self, record: &CredentialRecord) -> Result<(), AgentError> {
        let mut contents =
            serde_json::to_vec_pretty(record).map_err(|err| self.persistence_error(err))?;
        let result = self.write_atomically(&contents);
        contents.zeroize();
        result?;

        tracing::debug!(
            "[agent] saved credentials, expiration: {}",
            record.expiration
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn record() -> CredentialRecord {
        CredentialRecord {
            access_key_id: "ASIAEXAMPLE".to_string(),
            secret_key: "secret".to_string(),
            session_token: "token".to_string(),
            expiration: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
                + chrono::Duration::milliseconds(125),
        }
    }

    fn store_in(dir: &TempDir) -> FileCredentialStore {
        FileCredentialStore::new(dir.path().join("creds.json"))
    }

    #[test]
    fn test_save_then_load_returns_same_record() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&record()).unwrap();
        assert_eq!(store.load(), Some(record()));
    }

    #[test]
    fn test_save_overwrites_previous_record() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&record()).unwrap();

        let mut newer = record();
        newer.access_key_id = "ASIANEWER".to_string();
        newer.expiration += chrono::Duration::hours(1);
        store.save(&newer).unwrap();

        assert_eq!(store.load(), Some(newer));
        // only the cache file remains, no temporary files
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_saved_file_uses_cache_file_keys() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&record()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(value["AccessKeyId"], "ASIAEXAMPLE");
        assert_eq!(value["SecretKey"], "secret");
        assert_eq!(value["SessionToken"], "token");
        assert_eq!(value["Expiration"], "2025-03-01T12:00:00.125Z");
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&record()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_missing_file_is_absent() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store_in(&dir).load(), None);
    }

    #[test]
    fn test_corrupted_files_are_absent() {
        let cases = [
            "",
            "not json",
            r#"{"AccessKeyId": "ASIA", "SecretKey": "s""#,
            r#"{"AccessKeyId": "ASIA", "SecretKey": "s", "SessionToken": "t"}"#,
            r#"{"AccessKeyId": "ASIA", "SecretKey": "s", "SessionToken": "t", "Expiration": "soon"}"#,
            r#"{"AccessKeyId": "ASIA", "SecretKey": "s", "SessionToken": "t", "Expiration": 1735732800}"#,
            r#"{"AccessKeyId": "", "SecretKey": "s", "SessionToken": "t", "Expiration": "2025-03-01T12:00:00Z"}"#,
            r#"["AccessKeyId"]"#,
        ];

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        for contents in cases {
            fs::write(store.path(), contents).unwrap();
            assert_eq!(store.load(), None, "contents: {contents}");
        }
    }

    #[test]
    fn test_directory_in_place_of_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::create_dir(store.path()).unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_save_into_missing_directory_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("missing").join("creds.json"));
        let err = store.save(&record()).unwrap_err();
        assert!(matches!(err, AgentError::PersistenceError { .. }));
        assert_eq!(err.stage(), "persistence");
    }
}
