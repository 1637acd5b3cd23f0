use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::User;
use crate::utils::sha256_file;

/// Externally managed `username,password,role` table. Read-only here.
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        CredentialStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Users keyed by lower-cased username. A missing file is an empty table.
    pub fn load(&self) -> Result<HashMap<String, User>> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "credential file missing, all logins will be rejected");
            return Ok(HashMap::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .with_context(|| format!("Open credentials {}", self.path.display()))?;

        let mut users = HashMap::new();
        for result in reader.deserialize::<User>() {
            let user = result.with_context(|| format!("Parse credentials {}", self.path.display()))?;
            users.insert(normalize_username(&user.username), user);
        }

        info!(path = %self.path.display(), users = users.len(), "credentials loaded");
        Ok(users)
    }

    /// Content hash of the file, `None` when it does not exist.
    pub fn fingerprint(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        sha256_file(&self.path).map(Some)
    }
}

pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn loads_users_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.csv");
        fs::write(
            &path,
            "username,password,role\nAlice,secret,admin\nbob , hunter2 , Editor\ncarol,pw,sales\n",
        )
        .unwrap();
        let users = CredentialStore::new(path).load().unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(users["alice"].role, Role::Admin);
        assert_eq!(users["bob"].password, "hunter2");
        assert_eq!(users["bob"].role, Role::Editor);
        assert_eq!(users["carol"].role, Role::Viewer);
    }

    #[test]
    fn missing_file_has_no_users() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::new(dir.path().join("users.csv"));
        assert!(store.load().unwrap().is_empty());
        assert_eq!(store.fingerprint().unwrap(), None);
    }

    #[test]
    fn fingerprint_changes_with_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.csv");
        fs::write(&path, "username,password,role\nalice,a,admin\n").unwrap();
        let store = CredentialStore::new(path.clone());
        let before = store.fingerprint().unwrap();
        fs::write(&path, "username,password,role\nalice,b,admin\n").unwrap();
        assert_ne!(before, store.fingerprint().unwrap());
    }
}
