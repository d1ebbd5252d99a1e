//! Execution orchestrator: owns the editor session state and turns one call
//! to the execution service into one settled state transition.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{
    buffer::TextBuffer,
    config::Config,
    error::{Error, Result},
    piston::{ExecuteRequest, ExecuteResponse, PistonClient},
    registry::{self, FALLBACK_LANGUAGE},
    store::{snapshot_key, PreferenceStore, FONT_SIZE_KEY, LANGUAGE_KEY, THEME_KEY},
};

pub const DEFAULT_FONT_SIZE: u32 = 16;
pub const DEFAULT_THEME: &str = "vs-dark";

/// Settled record of the last execution. `output` is empty on failure and
/// `error` is `None` on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub code: String,
    pub output: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionState {
    pub language: String,
    pub font_size: u32,
    pub theme: String,
    pub is_running: bool,
    pub output: String,
    pub error: Option<String>,
    pub execution_result: Option<ExecutionResult>,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self {
            language: FALLBACK_LANGUAGE.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            theme: DEFAULT_THEME.to_string(),
            is_running: false,
            output: String::new(),
            error: None,
            execution_result: None,
        }
    }
}

impl ExecutionState {
    /// Defaults overlaid with whatever valid preferences the store holds.
    pub fn hydrate(store: &dyn PreferenceStore, default_language: &str) -> Self {
        let fallback = if registry::is_registered(default_language) {
            default_language
        } else {
            FALLBACK_LANGUAGE
        };
        let language = store
            .get(LANGUAGE_KEY)
            .filter(|l| registry::is_registered(l))
            .unwrap_or_else(|| fallback.to_string());
        let font_size = store
            .get(FONT_SIZE_KEY)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_FONT_SIZE);
        let theme = store
            .get(THEME_KEY)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_THEME.to_string());

        Self { language, font_size, theme, ..Self::default() }
    }
}

/// Maps a service response onto exactly one outcome tier.
///
/// Priority: service message, then compile failure, then run failure.
/// `Ok` carries the trimmed program output.
pub fn classify(response: &ExecuteResponse) -> Result<String> {
    if let Some(message) = response.message.as_ref().filter(|m| !m.trim().is_empty()) {
        return Err(Error::Service(message.clone()));
    }
    if let Some(compile) = response.compile.as_ref().filter(|c| c.failed()) {
        return Err(Error::Compile(compile.failure_message("compilation")));
    }
    let run = response.run.as_ref().ok_or_else(|| Error::Transport {
        message: "response has neither a message nor a run stage".into(),
        source: None,
    })?;
    if run.failed() {
        return Err(Error::Runtime(run.failure_message("process")));
    }
    // `output` interleaves stderr, so it only stands in when stdout is absent
    let stdout = run.stdout.as_deref().unwrap_or(&run.output);
    Ok(stdout.trim().to_string())
}

struct Inner {
    state: ExecutionState,
    store: Box<dyn PreferenceStore>,
    buffer: Option<Weak<dyn TextBuffer>>,
    latest_run: u64,
}

impl Inner {
    fn persist(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!(key, error = %e, "failed to persist preference");
        }
    }
}

pub struct Orchestrator {
    client: PistonClient,
    inner: Mutex<Inner>,
}

impl Orchestrator {
    pub fn new(client: PistonClient, store: impl PreferenceStore + 'static) -> Self {
        Self::with_default_language(client, store, FALLBACK_LANGUAGE)
    }

    pub fn with_default_language(
        client: PistonClient,
        store: impl PreferenceStore + 'static,
        default_language: &str,
    ) -> Self {
        let state = ExecutionState::hydrate(&store, default_language);
        debug!(language = %state.language, "session state hydrated");
        Self {
            client,
            inner: Mutex::new(Inner {
                state,
                store: Box::new(store),
                buffer: None,
                latest_run: 0,
            }),
        }
    }

    pub fn from_config(cfg: &Config, store: impl PreferenceStore + 'static) -> Result<Self> {
        let client = PistonClient::from_config(cfg)?;
        let default_language = cfg
            .get("DEFAULT_LANGUAGE")
            .unwrap_or_else(|| FALLBACK_LANGUAGE.to_string());
        Ok(Self::with_default_language(client, store, &default_language))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cloned view of the observable state.
    pub fn state(&self) -> ExecutionState {
        self.lock().state.clone()
    }

    pub fn language(&self) -> String {
        self.lock().state.language.clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock().state.is_running
    }

    pub fn execution_result(&self) -> Option<ExecutionResult> {
        self.lock().state.execution_result.clone()
    }

    /// Text of the attached buffer, or empty when none is attached (or it
    /// has been dropped by its owner).
    pub fn current_code(&self) -> String {
        let buffer = self.lock().buffer.clone();
        buffer
            .and_then(|weak| weak.upgrade())
            .map(|b| b.get_text())
            .unwrap_or_default()
    }

    pub fn snapshot(&self, language: &str) -> Option<String> {
        self.lock().store.get(&snapshot_key(language))
    }

    /// Stores a weak reference to `buffer` and restores the current
    /// language's snapshot into it, if one exists.
    pub fn attach_buffer<B: TextBuffer + 'static>(&self, buffer: &Arc<B>) {
        let weak = Arc::downgrade(buffer) as Weak<dyn TextBuffer>;
        let saved = {
            let mut inner = self.lock();
            inner.buffer = Some(weak);
            let key = snapshot_key(&inner.state.language);
            inner.store.get(&key)
        };
        if let Some(code) = saved.filter(|c| !c.is_empty()) {
            debug!(bytes = code.len(), "restoring snapshot into buffer");
            buffer.set_text(&code);
        }
    }

    /// Switches language, saving the outgoing language's code first.
    pub fn set_language(&self, language: &str) -> Result<()> {
        registry::lookup(language)?;
        let code = self.current_code();

        let mut inner = self.lock();
        if !code.is_empty() {
            let key = snapshot_key(&inner.state.language);
            inner.persist(&key, &code);
        }
        inner.persist(LANGUAGE_KEY, language);
        inner.state.language = language.to_string();
        inner.state.output.clear();
        inner.state.error = None;
        Ok(())
    }

    /// Saves the buffer under the current language's snapshot key.
    pub fn save_snapshot(&self) {
        let code = self.current_code();
        if code.is_empty() {
            return;
        }
        let mut inner = self.lock();
        let key = snapshot_key(&inner.state.language);
        inner.persist(&key, &code);
    }

    pub fn set_theme(&self, theme: &str) {
        let mut inner = self.lock();
        inner.persist(THEME_KEY, theme);
        inner.state.theme = theme.to_string();
    }

    pub fn set_font_size(&self, font_size: u32) {
        let mut inner = self.lock();
        inner.persist(FONT_SIZE_KEY, &font_size.to_string());
        inner.state.font_size = font_size;
    }

    /// Runs the buffer's code. Never fails: every outcome lands in state.
    ///
    /// Each invocation takes a sequence number; only the most recent one
    /// may settle state or clear `is_running`.
    pub async fn run(&self) {
        let code = self.current_code();
        if code.is_empty() {
            self.lock().state.error = Some(Error::EmptyInput.to_string());
            return;
        }

        let (seq, language) = {
            let mut inner = self.lock();
            inner.latest_run += 1;
            inner.state.is_running = true;
            inner.state.error = None;
            inner.state.output.clear();
            (inner.latest_run, inner.state.language.clone())
        };
        let _guard = RunGuard { inner: &self.inner, seq };

        let outcome = self.execute(&language, &code).await;
        self.settle(seq, code, outcome);
    }

    async fn execute(&self, language: &str, code: &str) -> Result<String> {
        let runtime = registry::lookup(language).map_err(|e| {
            error!(language, "session holds an unregistered language");
            Error::Transport { message: e.to_string(), source: None }
        })?;
        let request = ExecuteRequest::new(runtime, code);
        let response = self.client.execute(&request).await?;
        classify(&response)
    }

    fn settle(&self, seq: u64, code: String, outcome: Result<String>) {
        let mut inner = self.lock();
        if inner.latest_run != seq {
            debug!(seq, latest = inner.latest_run, "discarding stale run");
            return;
        }

        let result = match outcome {
            Ok(output) => {
                debug!(seq, "run succeeded");
                ExecutionResult { code, output, error: None }
            }
            Err(err) => {
                if let Error::Transport { message, source } = &err {
                    warn!(seq, message = %message, cause = ?source, "run failed to reach the execution service");
                } else {
                    debug!(seq, error = %err, "run failed");
                }
                ExecutionResult { code, output: String::new(), error: Some(err.to_string()) }
            }
        };
        inner.state.output = result.output.clone();
        inner.state.error = result.error.clone();
        inner.state.execution_result = Some(result);
    }
}

/// Clears `is_running` on every exit path of `run`.
struct RunGuard<'a> {
    inner: &'a Mutex<Inner>,
    seq: u64,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.latest_run == self.seq {
            inner.state.is_running = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piston::StageResult;
    use crate::store::MemoryStore;

    fn stage(code: i64, stdout: &str, stderr: &str) -> StageResult {
        StageResult {
            code: Some(code),
            stdout: Some(stdout.into()),
            stderr: stderr.into(),
            ..Default::default()
        }
    }

    #[test]
    fn message_wins_over_other_tiers() {
        let resp = ExecuteResponse {
            message: Some("Invalid version".into()),
            compile: Some(stage(1, "", "boom")),
            run: Some(stage(1, "", "boom")),
        };
        assert!(matches!(classify(&resp), Err(Error::Service(m)) if m == "Invalid version"));
    }

    #[test]
    fn compile_failure_prefers_stderr() {
        let resp = ExecuteResponse {
            compile: Some(stage(1, "ignored", "SyntaxError")),
            ..Default::default()
        };
        assert!(matches!(classify(&resp), Err(Error::Compile(m)) if m == "SyntaxError"));
    }

    #[test]
    fn runtime_failure_falls_back_to_stdout() {
        let resp = ExecuteResponse {
            compile: Some(stage(0, "", "")),
            run: Some(stage(1, "Traceback", "")),
            ..Default::default()
        };
        assert!(matches!(classify(&resp), Err(Error::Runtime(m)) if m == "Traceback"));
    }

    #[test]
    fn success_trims_output_field() {
        let resp = ExecuteResponse {
            run: Some(StageResult { code: Some(0), output: "  42\n".into(), ..Default::default() }),
            ..Default::default()
        };
        assert_eq!(classify(&resp).unwrap(), "42");
    }

    #[test]
    fn success_ignores_stderr_in_combined_output() {
        let resp: ExecuteResponse = serde_json::from_str(
            r#"{"run":{"code":0,"stdout":"","stderr":"DeprecationWarning: x\n","output":"DeprecationWarning: x\n"}}"#,
        )
        .unwrap();
        assert_eq!(classify(&resp).unwrap(), "");
    }

    #[test]
    fn blank_message_is_not_a_service_error() {
        let resp: ExecuteResponse =
            serde_json::from_str(r#"{"message":"  ","run":{"code":0,"stdout":"ok"}}"#).unwrap();
        assert_eq!(classify(&resp).unwrap(), "ok");
    }

    #[test]
    fn missing_run_stage_is_transport_error() {
        let resp = ExecuteResponse { compile: Some(stage(0, "", "")), ..Default::default() };
        let err = classify(&resp).unwrap_err();
        assert_eq!(err.to_string(), "Error running code");
    }

    #[test]
    fn hydrate_ignores_invalid_preferences() {
        let mut store = MemoryStore::new();
        store.set(LANGUAGE_KEY, "cobol").unwrap();
        store.set(FONT_SIZE_KEY, "huge").unwrap();
        let state = ExecutionState::hydrate(&store, "python");
        assert_eq!(state.language, "python");
        assert_eq!(state.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(state.theme, DEFAULT_THEME);
        assert!(!state.is_running);

        store.set(LANGUAGE_KEY, "rust").unwrap();
        store.set(FONT_SIZE_KEY, "20").unwrap();
        store.set(THEME_KEY, "monokai").unwrap();
        let state = ExecutionState::hydrate(&store, "nonsense");
        assert_eq!(state.language, "rust");
        assert_eq!(state.font_size, 20);
        assert_eq!(state.theme, "monokai");
    }
}
