// ── Device and position store ──
//
// Read-only cache of the server's devices and their latest positions.
// Refreshes replace whole collections; front-ends take snapshots or
// subscribe for changes.

mod collection;

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::{Device, DeviceId, Position};

use self::collection::EntityCollection;

/// Devices by id and latest positions by device id.
pub struct DataStore {
    devices: EntityCollection<DeviceId, Device>,
    positions: EntityCollection<DeviceId, Position>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            devices: EntityCollection::new(),
            positions: EntityCollection::new(),
        }
    }

    pub fn replace_devices(&self, devices: Vec<Device>) {
        self.devices
            .replace_all(devices.into_iter().map(|d| (d.id, d)));
    }

    /// Latest position per device. Later entries win for the same device.
    pub fn replace_positions(&self, positions: Vec<Position>) {
        self.positions
            .replace_all(positions.into_iter().map(|p| (p.device_id, p)));
    }

    pub fn upsert_position(&self, position: Position) {
        self.positions.upsert(position.device_id, position);
    }

    pub fn remove_device(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.positions.remove(&id);
        self.devices.remove(&id)
    }

    pub fn device(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.devices.get(&id)
    }

    pub fn position(&self, device_id: DeviceId) -> Option<Arc<Position>> {
        self.positions.get(&device_id)
    }

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.snapshot()
    }

    pub fn positions_snapshot(&self) -> Arc<Vec<Arc<Position>>> {
        self.positions.snapshot()
    }

    pub fn subscribe_devices(&self) -> watch::Receiver<Arc<Vec<Arc<Device>>>> {
        self.devices.subscribe()
    }

    pub fn subscribe_positions(&self) -> watch::Receiver<Arc<Vec<Arc<Position>>>> {
        self.positions.subscribe()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}
