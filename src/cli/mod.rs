//! Command-line interface: argument definitions and command drivers.

pub mod args;
pub mod build;
pub mod validate;

pub use args::{Cli, Commands};
