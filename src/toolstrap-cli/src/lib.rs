//! Toolstrap CLI - CI entry point for the bootstrap installer.
//!
//! Thin glue around `toolstrap-installer`: parses inputs, sets up logging,
//! runs the install and hands the result to the CI runner.

pub mod ci;
pub mod cli;
pub mod logging;
