//! Command-line interface module.

mod args;
pub mod build;
pub mod clean;
pub mod fingerprint;
pub mod inspect;

pub use args::{Cli, Commands};
