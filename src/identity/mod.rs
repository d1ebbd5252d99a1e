//! The signed-in user, as far as the local stores are concerned.

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub is_pro: bool,
}

impl Identity {
    /// `None` unless `USER_ID` is set.
    pub fn from_config(cfg: &Config) -> Option<Self> {
        let user_id = cfg.get("USER_ID").filter(|s| !s.trim().is_empty())?;
        let email = cfg.get("USER_EMAIL").filter(|s| !s.trim().is_empty());
        let name = cfg
            .get("USER_NAME")
            .filter(|s| !s.trim().is_empty())
            .or_else(|| email.clone())
            .unwrap_or_else(|| user_id.clone());
        Some(Self { user_id, name, email, is_pro: cfg.get_bool("USER_PRO") })
    }

    /// Free accounts may only run the fallback language.
    pub fn may_use(&self, language: &str) -> bool {
        self.is_pro || language == crate::registry::FALLBACK_LANGUAGE
    }
}
