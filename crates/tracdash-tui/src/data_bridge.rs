//! Data bridge: opens the [`Session`] and keeps the TUI fed.
//!
//! Runs as a background task. After signing in it forwards every change
//! of the session's device and position lists as an [`Action`], and
//! re-polls the server on a fixed interval (the server pushes nothing on
//! its own). Shuts down on cancellation.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tracdash_core::{ConnectionConfig, Session};

use crate::action::Action;

pub async fn spawn_data_bridge(
    config: ConnectionConfig,
    refresh_interval: Duration,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let _ = action_tx.send(Action::Connecting);

    let session = tokio::select! {
        () = cancel.cancelled() => return,
        result = Session::connect(config) => match result {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "failed to open session");
                let _ = action_tx.send(Action::Disconnected(e.to_string()));
                return;
            }
        },
    };
    let _ = action_tx.send(Action::Connected(session.clone()));

    let mut devices = session.store().subscribe_devices();
    let mut positions = session.store().subscribe_positions();

    let mut failing = match session.refresh().await {
        Ok(()) => false,
        Err(e) => {
            warn!(error = %e, "initial refresh failed");
            let _ = action_tx.send(Action::Disconnected(e.to_string()));
            true
        }
    };

    // Initial snapshots so screens have data immediately
    let _ = action_tx.send(Action::DevicesUpdated(devices.borrow_and_update().clone()));
    let _ = action_tx.send(Action::PositionsUpdated(
        positions.borrow_and_update().clone(),
    ));

    let mut refresh = tokio::time::interval(refresh_interval);
    refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    refresh.tick().await;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = devices.changed() => {
                debug!("dispatching DevicesUpdated");
                let _ = action_tx.send(Action::DevicesUpdated(devices.borrow_and_update().clone()));
            }
            Ok(()) = positions.changed() => {
                let _ = action_tx.send(Action::PositionsUpdated(
                    positions.borrow_and_update().clone(),
                ));
            }
            _ = refresh.tick() => {
                match session.refresh().await {
                    Ok(()) if failing => {
                        info!("server reachable again");
                        failing = false;
                        let _ = action_tx.send(Action::Connected(session.clone()));
                    }
                    Ok(()) => {}
                    Err(e) => {
                        if !failing {
                            warn!(error = %e, "refresh failed");
                            let _ = action_tx.send(Action::Disconnected(e.to_string()));
                        }
                        failing = true;
                    }
                }
            }
        }
    }

    session.cancel_status();
    debug!("data bridge shut down");
}
