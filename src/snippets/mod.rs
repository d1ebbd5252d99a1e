//! Saved snippets, shared under the author's name.

use std::{fs, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{Error, Result},
    identity::Identity,
    registry,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: u64,
    pub title: String,
    pub language: String,
    pub code: String,
    pub user_id: String,
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SnippetStore {
    path: PathBuf,
}

impl SnippetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.snippets_path())
    }

    pub fn list(&self) -> Result<Vec<Snippet>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn get(&self, id: u64) -> Result<Option<Snippet>> {
        Ok(self.list()?.into_iter().find(|s| s.id == id))
    }

    pub fn create(
        &self,
        identity: Option<&Identity>,
        title: &str,
        language: &str,
        code: &str,
    ) -> Result<Snippet> {
        let identity = identity.ok_or(Error::Unauthorized)?;
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("snippet title is empty".into()));
        }
        if !registry::is_registered(language) {
            return Err(Error::InvalidInput(format!("unknown language '{}'", language)));
        }

        let mut snippets = self.list()?;
        let id = snippets.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        let snippet = Snippet {
            id,
            title: title.to_string(),
            language: language.to_string(),
            code: code.to_string(),
            user_id: identity.user_id.clone(),
            user_name: identity.name.clone(),
            created_at: Utc::now(),
        };
        snippets.push(snippet.clone());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&snippets)?)?;
        Ok(snippet)
    }
}
