use anyhow::Result;

use crate::cli::{actions::Action, commands, dispatch::handler};

/// Parse the command line, initialize logging and resolve the action to run.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    igaku_observability::init();

    handler(&matches)
}
