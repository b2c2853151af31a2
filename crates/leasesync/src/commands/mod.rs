//! Command dispatch: bridges CLI args -> engine and lease table -> output formatting.

pub mod config_cmd;
pub mod replay;
pub mod table;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::config::Settings;
use crate::error::CliError;

/// Dispatch a table-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    settings: &Settings,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Replay(args) => replay::handle(&args, settings, global),
        Command::Watch(args) => watch::handle(&args, settings, global).await,
        Command::Table(args) => table::handle(args, settings, global),
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
