//! Execution history: one audit record per run, kept in a JSON file.

use std::{fs, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{Error, Result},
    identity::Identity,
    orchestrator::ExecutionResult,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub user_id: String,
    pub language: String,
    pub code: String,
    // only one of output/error is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    length: usize,
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, length: usize) -> Self {
        Self { length, path: path.into() }
    }

    pub fn from_config(cfg: &Config) -> Self {
        let len = cfg.get_usize("HISTORY_LENGTH").unwrap_or(100);
        Self::new(cfg.history_path(), len)
    }

    fn read_all(&self) -> Result<Vec<ExecutionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn write_all(&self, records: &[ExecutionRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string(records)?)?;
        Ok(())
    }

    /// Appends a record for `result`, enforcing the account's language
    /// allowance. The oldest records beyond the configured length are dropped.
    pub fn save(
        &self,
        identity: Option<&Identity>,
        language: &str,
        result: &ExecutionResult,
    ) -> Result<ExecutionRecord> {
        let identity = identity.ok_or(Error::Unauthorized)?;
        if !identity.may_use(language) {
            return Err(Error::ProRequired { language: language.to_string() });
        }

        let record = ExecutionRecord {
            user_id: identity.user_id.clone(),
            language: language.to_string(),
            code: result.code.clone(),
            output: result.error.is_none().then(|| result.output.clone()),
            error: result.error.clone(),
            created_at: Utc::now(),
        };

        let mut records = self.read_all()?;
        records.push(record.clone());
        let over = records.len().saturating_sub(self.length);
        records.drain(..over);
        self.write_all(&records)?;
        Ok(record)
    }

    /// Records belonging to `user_id`, newest first.
    pub fn list(&self, user_id: &str) -> Result<Vec<ExecutionRecord>> {
        let mut records: Vec<_> = self
            .read_all()?
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect();
        records.reverse();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_pro: bool) -> Identity {
        Identity { user_id: "user_1".into(), name: "Ada".into(), email: None, is_pro }
    }

    fn ok(code: &str) -> ExecutionResult {
        ExecutionResult { code: code.into(), output: "1".into(), error: None }
    }

    #[test]
    fn requires_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"), 10);
        assert!(matches!(store.save(None, "javascript", &ok("x")), Err(Error::Unauthorized)));
    }

    #[test]
    fn free_user_limited_to_javascript() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"), 10);
        let free = user(false);
        match store.save(Some(&free), "python", &ok("print(1)")) {
            Err(Error::ProRequired { language }) => assert_eq!(language, "python"),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(store.save(Some(&free), "javascript", &ok("console.log(1)")).is_ok());
        assert!(store.save(Some(&user(true)), "python", &ok("print(1)")).is_ok());
    }

    #[test]
    fn records_carry_output_or_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("nested").join("history.json"), 10);
        let failed = ExecutionResult { code: "x".into(), output: String::new(), error: Some("boom".into()) };
        let rec = store.save(Some(&user(true)), "rust", &failed).unwrap();
        assert_eq!(rec.output, None);
        assert_eq!(rec.error.as_deref(), Some("boom"));

        let rec = store.save(Some(&user(true)), "rust", &ok("y")).unwrap();
        assert_eq!(rec.output.as_deref(), Some("1"));
        assert_eq!(rec.error, None);
    }

    #[test]
    fn list_is_newest_first_and_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("history.json"), 3);
        let pro = user(true);
        for code in ["a", "b", "c"] {
            store.save(Some(&pro), "go", &ok(code)).unwrap();
        }
        let other = Identity { user_id: "user_2".into(), ..user(true) };
        store.save(Some(&other), "go", &ok("d")).unwrap();

        let codes: Vec<_> = store.list("user_1").unwrap().into_iter().map(|r| r.code).collect();
        assert_eq!(codes, vec!["c", "b"]);
        assert_eq!(store.list("user_2").unwrap().len(), 1);
    }
}
