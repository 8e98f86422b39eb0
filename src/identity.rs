//! Pseudo-anonymous client identity used for personalization calls.
//!
//! The id is created on first need, written to a small file and reused on
//! every later run. Format: `user_<unix millis>_<9 alphanumerics>`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use rand::distr::Alphanumeric;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(String);

impl UserId {
    /// A fresh timestamp-salted random id.
    pub fn generate() -> Self {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        Self(format!("user_{}_{}", Utc::now().timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where the id lives. Without a path the id only lasts for the process.
#[derive(Debug, Clone, Default)]
pub struct IdentityStore {
    path: Option<PathBuf>,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn ephemeral() -> Self {
        Self { path: None }
    }

    /// Read the stored id, or create and persist a new one.
    pub fn load_or_create(&self) -> Result<UserId> {
        let Some(path) = &self.path else {
            return Ok(UserId::generate());
        };

        if let Some(existing) = read_id(path) {
            return Ok(existing);
        }

        let id = UserId::generate();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, id.as_str())
            .with_context(|| format!("failed to write user id to {}", path.display()))?;
        Ok(id)
    }
}

fn read_id(path: &Path) -> Option<UserId> {
    let content = fs::read_to_string(path).ok()?;
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(UserId(trimmed.to_string()))
    }
}
