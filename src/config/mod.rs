use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use directories::BaseDirs;

pub const DEFAULT_PISTON_URL: &str = "https://emkc.org/api/v2/piston";

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(&default_config_path())
    }

    /// Defaults, then the rc file at `config_path`, then the environment.
    pub fn load_from(config_path: &Path) -> Self {
        let mut map = default_map();

        if config_path.exists() {
            if let Ok(file) = fs::File::open(config_path) {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(|l| l.ok()) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        map.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
        }

        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path: config_path.to_path_buf() }
    }

    /// Builds a config from explicit values on top of the defaults, ignoring
    /// the rc file.
    #[cfg(test)]
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = default_map();
        for (k, v) in values {
            map.insert(k.into(), v.into());
        }
        Self { inner: map, config_path: default_config_path() }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.parse::<usize>().ok())
    }

    pub fn get_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).map(PathBuf::from)
    }

    pub fn piston_url(&self) -> String {
        self.get("PISTON_API_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PISTON_URL.to_string())
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.get("REQUEST_TIMEOUT")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60)
    }

    pub fn prefs_path(&self) -> PathBuf {
        self.get_path("PREFS_PATH").unwrap_or_else(|| app_dir().join("prefs"))
    }

    pub fn history_path(&self) -> PathBuf {
        self.get_path("HISTORY_PATH")
            .unwrap_or_else(|| app_dir().join("history.json"))
    }

    pub fn snippets_path(&self) -> PathBuf {
        self.get_path("SNIPPETS_PATH")
            .unwrap_or_else(|| app_dir().join("snippets.json"))
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "PISTON_API_URL",
        "REQUEST_TIMEOUT",
        "PREFS_PATH",
        "HISTORY_PATH",
        "HISTORY_LENGTH",
        "SNIPPETS_PATH",
        "DEFAULT_LANGUAGE",
        "USER_ID",
        "USER_NAME",
        "USER_EMAIL",
        "USER_PRO",
        "LOG_LEVEL",
    ];

    KEYS.contains(&k) || k.starts_with("CODERUN_")
}

fn app_dir() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("coderun")
}

fn default_config_path() -> PathBuf {
    app_dir().join(".coderunrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    let dir = app_dir();

    // Paths
    m.insert("PREFS_PATH".into(), dir.join("prefs").to_string_lossy().into_owned());
    m.insert(
        "HISTORY_PATH".into(),
        dir.join("history.json").to_string_lossy().into_owned(),
    );
    m.insert(
        "SNIPPETS_PATH".into(),
        dir.join("snippets.json").to_string_lossy().into_owned(),
    );

    // Numbers
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("HISTORY_LENGTH".into(), "100".into());

    // Strings
    m.insert("PISTON_API_URL".into(), DEFAULT_PISTON_URL.into());
    m.insert("DEFAULT_LANGUAGE".into(), "javascript".into());
    m.insert("LOG_LEVEL".into(), "warn".into());

    // Bools as strings
    m.insert("USER_PRO".into(), "false".into());

    m
}
