//! Text buffer capability. The orchestrator reads code through this and only
//! writes to it when restoring a snapshot.

use std::sync::Mutex;

pub trait TextBuffer: Send + Sync {
    fn get_text(&self) -> String;
    fn set_text(&self, text: &str);
}

#[derive(Debug, Default)]
pub struct MemoryBuffer {
    text: Mutex<String>,
}

impl MemoryBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: Mutex::new(text.into()) }
    }
}

impl TextBuffer for MemoryBuffer {
    fn get_text(&self) -> String {
        self.text.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_text(&self, text: &str) {
        let mut guard = self.text.lock().unwrap_or_else(|e| e.into_inner());
        guard.clear();
        guard.push_str(text);
    }
}
