//! Client-side orchestration for running code on a Piston execution service.
//!
//! [`orchestrator::Orchestrator`] owns the session: the selected language,
//! the attached text buffer, and the outcome of the last run. Preferences and
//! per-language code snapshots go through a [`store::PreferenceStore`].

pub mod buffer;
pub mod config;
pub mod error;
pub mod history;
pub mod identity;
pub mod orchestrator;
pub mod piston;
pub mod printer;
pub mod registry;
pub mod snippets;
pub mod store;

pub use error::{Error, Result};
pub use orchestrator::{ExecutionResult, ExecutionState, Orchestrator};
