mod cli;

use std::{
    io::{self, Read},
    process::ExitCode,
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use coderun::{
    buffer::{MemoryBuffer, TextBuffer},
    config::Config,
    error::Error,
    history::HistoryStore,
    identity::Identity,
    orchestrator::ExecutionResult,
    printer::{print_error, print_heading, print_result, print_warning},
    registry,
    snippets::SnippetStore,
    store::FileStore,
    Orchestrator,
};
use is_terminal::IsTerminal;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_tracing(cfg: &Config) {
    let level = cfg.get("LOG_LEVEL").unwrap_or_else(|| "warn".into());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = cli::Cli::parse();
    let cfg = Config::load();
    init_tracing(&cfg);

    let color = !args.no_color && io::stdout().is_terminal();
    let identity = Identity::from_config(&cfg);

    // Listing shortcuts
    if args.list_languages {
        for d in registry::all() {
            println!("{:<12} {:<12} {} {}", d.id, d.label, d.service_language, d.service_version);
        }
        return Ok(ExitCode::SUCCESS);
    }
    if args.list_snippets {
        for s in SnippetStore::from_config(&cfg).list()? {
            println!("{:>4}  {:<12} {}  ({})", s.id, s.language, s.title, s.user_name);
        }
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(id) = args.show_snippet {
        let snippet = SnippetStore::from_config(&cfg)
            .get(id)?
            .ok_or_else(|| anyhow!("snippet not found: {}", id))?;
        print_heading(&format!("# {} [{}] by {}", snippet.title, snippet.language, snippet.user_name), color);
        println!("{}", snippet.code);
        return Ok(ExitCode::SUCCESS);
    }
    if args.history {
        let identity = identity
            .as_ref()
            .ok_or_else(|| anyhow!("Set USER_ID to see your execution history"))?;
        for r in HistoryStore::from_config(&cfg).list(&identity.user_id)? {
            print_heading(&format!("## {} {}", r.created_at.format("%Y-%m-%d %H:%M:%S"), r.language), color);
            println!("{}", r.code.trim_end());
            let result = ExecutionResult {
                code: r.code,
                output: r.output.unwrap_or_default(),
                error: r.error,
            };
            print_result(&result, color);
            println!();
        }
        return Ok(ExitCode::SUCCESS);
    }

    let store = FileStore::from_config(&cfg).context("failed to open preference store")?;
    let orchestrator = Orchestrator::from_config(&cfg, store)?;

    if let Some(theme) = args.theme.as_deref() {
        orchestrator.set_theme(theme);
    }
    if let Some(size) = args.font_size {
        orchestrator.set_font_size(size);
    }

    let buffer = Arc::new(MemoryBuffer::default());
    orchestrator.attach_buffer(&buffer);
    if let Some(language) = args.language.as_deref() {
        if language != orchestrator.language() {
            orchestrator.set_language(language)?;
            // restore whatever was last written in the new language
            buffer.set_text("");
            orchestrator.attach_buffer(&buffer);
        }
    }

    if args.show_prefs {
        let state = orchestrator.state();
        println!("language:  {}", state.language);
        println!("theme:     {}", state.theme);
        println!("font size: {}", state.font_size);
        let saved: Vec<_> = registry::all()
            .iter()
            .filter(|d| orchestrator.snapshot(d.id).is_some_and(|c| !c.is_empty()))
            .map(|d| d.id)
            .collect();
        println!("snapshots: {}", if saved.is_empty() { "-".to_string() } else { saved.join(", ") });
        return Ok(ExitCode::SUCCESS);
    }

    let input = if let Some(path) = args.file.as_deref() {
        Some(std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?)
    } else if !io::stdin().is_terminal() {
        let mut code = String::new();
        io::stdin().read_to_string(&mut code)?;
        Some(code)
    } else {
        None
    };
    let runtime = registry::lookup(&orchestrator.language())?;
    buffer.set_text(&resolve_source(input, buffer.get_text(), runtime.default_code));

    if let Some(title) = args.save_snippet.as_deref() {
        let snippet = SnippetStore::from_config(&cfg).create(
            identity.as_ref(),
            title,
            &orchestrator.language(),
            &orchestrator.current_code(),
        )?;
        orchestrator.save_snapshot();
        println!("Saved snippet {}: {}", snippet.id, snippet.title);
        return Ok(ExitCode::SUCCESS);
    }

    orchestrator.run().await;
    orchestrator.save_snapshot();

    let state = orchestrator.state();
    match &state.execution_result {
        Some(result) => print_result(result, color),
        None => {
            if let Some(err) = &state.error {
                print_error(err, color);
            }
        }
    }

    if let (Some(result), false) = (&state.execution_result, args.no_save) {
        match HistoryStore::from_config(&cfg).save(identity.as_ref(), &state.language, result) {
            Ok(_) => {}
            Err(Error::Unauthorized) => debug!("no identity configured; run not recorded"),
            Err(e @ Error::ProRequired { .. }) => {
                print_warning(&format!("Not recorded: {}", e), color);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(if state.error.is_some() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Code to load into the buffer: explicit input (FILE or piped stdin) as
/// given, even when empty; otherwise the restored snapshot; otherwise the
/// language's starter program.
fn resolve_source(input: Option<String>, restored: String, starter: &str) -> String {
    match input {
        Some(code) => code,
        None if !restored.is_empty() => restored,
        None => {
            debug!("no saved code; using starter program");
            starter.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_kept_empty() {
        assert_eq!(resolve_source(Some(String::new()), "saved".into(), "starter"), "");
        assert_eq!(resolve_source(Some("print(1)".into()), "saved".into(), "starter"), "print(1)");
    }

    #[test]
    fn snapshot_then_starter_without_input() {
        assert_eq!(resolve_source(None, "saved".into(), "starter"), "saved");
        assert_eq!(resolve_source(None, String::new(), "starter"), "starter");
    }
}
