use clap::{ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "coderun", about = "Run code on a Piston execution service", version)]
#[command(group(ArgGroup::new("listing").args(["list_languages", "show_prefs", "history", "list_snippets", "show_snippet"]).multiple(false)))]
pub struct Cli {
    /// Source file to run. Falls back to stdin, then to the saved snapshot.
    #[arg(value_name = "FILE")]
    pub file: Option<String>,

    /// Switch to this language before running.
    #[arg(short = 'l', long)]
    pub language: Option<String>,

    /// Editor theme preference.
    #[arg(long)]
    pub theme: Option<String>,

    /// Editor font size preference.
    #[arg(long = "font-size", value_parser = clap::value_parser!(u32).range(1..))]
    pub font_size: Option<u32>,

    /// List supported languages and runtime versions.
    #[arg(long = "list-languages", visible_alias = "ll")]
    pub list_languages: bool,

    /// Show stored preferences.
    #[arg(long = "show-prefs")]
    pub show_prefs: bool,

    /// Show your execution history.
    #[arg(long)]
    pub history: bool,

    /// Save the code as a snippet with this title instead of running it.
    #[arg(long = "save-snippet", value_name = "TITLE")]
    pub save_snippet: Option<String>,

    /// List saved snippets.
    #[arg(long = "list-snippets", visible_alias = "ls")]
    pub list_snippets: bool,

    /// Print a saved snippet.
    #[arg(long = "show-snippet", value_name = "ID")]
    pub show_snippet: Option<u64>,

    /// Do not record this run in the execution history.
    #[arg(long = "no-save")]
    pub no_save: bool,

    /// Disable colored output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from(["coderun", "main.py", "-l", "python", "--font-size", "18", "--no-save"]).unwrap();
        assert_eq!(cli.file.as_deref(), Some("main.py"));
        assert_eq!(cli.language.as_deref(), Some("python"));
        assert_eq!(cli.font_size, Some(18));
        assert!(cli.no_save);
    }

    #[test]
    fn listing_flags_are_exclusive() {
        assert!(Cli::try_parse_from(["coderun", "--history", "--list-snippets"]).is_err());
        assert!(Cli::try_parse_from(["coderun", "--font-size", "0"]).is_err());
    }
}
