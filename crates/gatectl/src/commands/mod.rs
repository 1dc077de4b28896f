//! Command dispatch: bridges CLI args -> core edits -> output formatting.

pub mod backends;
pub mod binds;
pub mod config_doc;
pub mod listeners;
pub mod mode;
pub mod policies;
pub mod profile;
pub mod routes;
pub mod targets;
pub mod util;

use tokio_util::sync::CancellationToken;

use gatectl_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    session: &Session,
    cancel: &CancellationToken,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Config(args) => config_doc::handle(session, args, cancel, global).await,
        Command::Binds(args) => binds::handle(session, args, cancel, global).await,
        Command::Listeners(args) => listeners::handle(session, args, cancel, global).await,
        Command::Routes(args) => routes::handle(session, args, cancel, global).await,
        Command::Backends(args) => backends::handle(session, args, cancel, global).await,
        Command::Policies(args) => policies::handle(session, args, cancel, global).await,
        Command::Targets(args) => targets::handle(session, args, cancel, global).await,
        Command::Mode => mode::handle(session, global).await,
        // Profile and Completions are handled before dispatch
        Command::Profile(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need a gateway session".into(),
        )),
    }
}
