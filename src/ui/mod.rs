//! User-facing output.
//!
//! Only the published tag goes to stdout so the command can be used in
//! `$(...)`; every other line goes to stderr.

pub mod formatter;

pub use formatter::{
    display_error, display_outcome, display_success, display_tag, display_usage_problems,
    display_validation,
};
