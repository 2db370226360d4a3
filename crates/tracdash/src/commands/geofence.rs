//! Geofence command handlers.

use tracdash_core::Session;

use crate::cli::{GeofenceArgs, GeofenceCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(session: &Session, args: GeofenceArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        GeofenceCommand::Create { device } => {
            let device = util::load_device(session, &device).await?;
            let route = session.create_geofence(device.id).await?;

            let url = route
                .url(session.base_url())
                .map_or_else(|_| route.path(), |u| u.to_string());
            if !global.quiet {
                eprintln!("Geofence created and linked to '{}'", device.name);
            }
            output::print_output(&url, global.quiet);
            Ok(())
        }
    }
}
