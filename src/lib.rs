pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod http;
pub mod provider;
pub mod ui;

pub use error::{ReleaseError, Result};
