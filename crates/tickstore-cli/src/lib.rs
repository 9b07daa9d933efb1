//! # tickstore CLI
//!
//! Argument definitions, command dispatch, output rendering and exit-code
//! mapping behind the `tickstore` binary.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cli`] | clap argument definitions |
//! | [`commands`] | Command dispatch and [`CommandResult`] |
//! | [`output`] | JSON and table rendering |
//! | [`error`] | [`CliError`] and exit codes |

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Command, OutputFormat};
pub use commands::{run, CommandResult};
pub use error::CliError;
