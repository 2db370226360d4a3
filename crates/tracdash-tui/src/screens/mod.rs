//! Screen implementations. Each screen is a top-level Component.

pub mod devices;
pub mod trips;

use crate::component::Component;
use crate::screen::ScreenId;

/// Create screen components for the tab bar.
pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Devices, Box::new(devices::DevicesScreen::new())),
        (ScreenId::Trips, Box::new(trips::TripsScreen::new())),
    ]
}
