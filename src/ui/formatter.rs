//! Pure formatting functions for UI output.

use console::style;

use crate::domain::{TagOutcome, TagState};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().for_stderr(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    eprintln!("{} {}", style("✓").green().for_stderr(), message);
}

/// Print the tag on stdout, unstyled.
pub fn display_tag(tag: &str) {
    println!("{}", tag);
}

/// List argument problems under a heading naming the sub-command.
pub fn display_usage_problems(command: &str, problems: &[String]) {
    eprintln!("{}", style(format!("missing flags for {}:", command)).bold().for_stderr());
    for problem in problems {
        eprintln!("  {}", problem);
    }
}

pub fn outcome_message(tag: &str, outcome: TagOutcome) -> String {
    match outcome {
        TagOutcome::AlreadyPresent => format!("Tag {} already exists at the commit, nothing to do", tag),
        TagOutcome::Created => format!("Created tag {}", tag),
        TagOutcome::CreatedConcurrently => format!("Tag {} was created by another run", tag),
    }
}

pub fn validation_message(tag: &str, state: &TagState) -> String {
    match state {
        TagState::Absent => format!("Tag {} can be created", tag),
        TagState::Matches => format!("Tag {} already exists at the commit", tag),
        TagState::Mismatch { actual } => format!("Tag {} already exists at {}", tag, actual),
    }
}

/// Report how `create` ended.
pub fn display_outcome(tag: &str, outcome: TagOutcome) {
    display_success(&outcome_message(tag, outcome));
}

/// Report what `validate` found.
pub fn display_validation(tag: &str, state: &TagState) {
    display_success(&validation_message(tag, state));
}
