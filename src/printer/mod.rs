//! Terminal output for run results and listings.

use owo_colors::OwoColorize;

use crate::orchestrator::ExecutionResult;

/// Program output on stdout in green; errors on stderr in red.
pub fn print_result(result: &ExecutionResult, color: bool) {
    match &result.error {
        Some(err) => print_error(err, color),
        None if result.output.is_empty() => {}
        None if color => println!("{}", result.output.green()),
        None => println!("{}", result.output),
    }
}

pub fn print_error(text: &str, color: bool) {
    if color {
        eprintln!("{}", text.red());
    } else {
        eprintln!("{}", text);
    }
}

pub fn print_warning(text: &str, color: bool) {
    if color {
        eprintln!("{}", text.yellow());
    } else {
        eprintln!("{}", text);
    }
}

pub fn print_heading(text: &str, color: bool) {
    if color {
        println!("{}", text.cyan().bold());
    } else {
        println!("{}", text);
    }
}
