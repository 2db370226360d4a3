//! Command dispatch: bridges CLI args -> session operations -> output.

pub mod command;
pub mod config_cmd;
pub mod devices;
pub mod geofence;
pub mod position;
pub mod report;
pub mod status;
pub mod util;

use tracdash_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to its handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(session, args, global).await,
        Command::Command(args) => command::handle(session, args, global).await,
        Command::Status(args) => status::handle(session, args, global).await,
        Command::Geofence(args) => geofence::handle(session, args, global).await,
        Command::Position(args) => position::handle(session, args, global).await,
        Command::Report(args) => report::handle(session, args, global).await,
        // Handled before a session is opened
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
