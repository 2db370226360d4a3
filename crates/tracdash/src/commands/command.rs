//! Remote command handler (live mode, light, buzzer).

use tracdash_core::Session;

use crate::cli::{CommandArgs, GlobalOpts};
use crate::error::CliError;

use super::util;

pub async fn handle(session: &Session, args: CommandArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let device = util::load_device(session, &args.device).await?;
    let capability = util::capability(args.capability);

    session.send(device.id, capability).await?;
    if !global.quiet {
        eprintln!("{capability} command sent to '{}'", device.name);
    }
    Ok(())
}
