// ── Capability status poller ──
//
// Live mode, light and buzzer controls are enabled or disabled based on
// three independent GETs made when a device is selected. Each poll is
// tied to the device id that started it; a newer poll or `cancel()`
// supersedes it, and a superseded poll returns `None` instead of a
// result so callers never apply stale state. A re-poll after a command
// runs only while its device is still the selected one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;
use strum::{Display, EnumIter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tracdash_api::ApiClient;

use crate::config::InferenceMode;
use crate::error::CoreError;
use crate::model::DeviceId;

const LIVE_MODE_MARKER: &str = r#""liveModetime":null"#;
const LIGHT_MARKER: &str = r#""type":"lightOn""#;
const BUZZER_MARKER: &str = r#""type":"buzzerOn""#;

/// A remotely switchable device feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    #[strum(to_string = "LiveMode")]
    LiveMode,
    #[strum(to_string = "Light")]
    Light,
    #[strum(to_string = "Buzzer")]
    Buzzer,
}

impl Capability {
    /// Toolbar order.
    pub const ALL: [Self; 3] = [Self::LiveMode, Self::Light, Self::Buzzer];

    /// Translation key of the control's tooltip.
    pub fn label_key(self) -> &'static str {
        match self {
            Self::LiveMode => "liveModeActivate",
            Self::Light => "lightActivate",
            Self::Buzzer => "buzzerActivate",
        }
    }
}

/// Outcome of polling one capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilityState {
    pub enabled: bool,
    /// Why the state could not be read, if it could not.
    pub error: Option<String>,
}

impl CapabilityState {
    fn failed(reason: String) -> Self {
        Self {
            enabled: false,
            error: Some(reason),
        }
    }
}

/// Capability states for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPoll {
    pub device_id: DeviceId,
    pub live_mode: CapabilityState,
    pub light: CapabilityState,
    pub buzzer: CapabilityState,
}

impl StatusPoll {
    /// All controls disabled, no errors.
    pub fn disabled(device_id: DeviceId) -> Self {
        Self {
            device_id,
            live_mode: CapabilityState::default(),
            light: CapabilityState::default(),
            buzzer: CapabilityState::default(),
        }
    }

    pub fn get(&self, capability: Capability) -> &CapabilityState {
        match capability {
            Capability::LiveMode => &self.live_mode,
            Capability::Light => &self.light,
            Capability::Buzzer => &self.buzzer,
        }
    }

    pub fn enabled(&self, capability: Capability) -> bool {
        self.get(capability).enabled
    }

    /// One error per capability that could not be read.
    pub fn errors(&self) -> Vec<CoreError> {
        [Capability::LiveMode, Capability::Light, Capability::Buzzer]
            .into_iter()
            .filter_map(|c| {
                self.get(c)
                    .error
                    .clone()
                    .map(|reason| CoreError::StatusUnavailable {
                        capability: c,
                        reason,
                    })
            })
            .collect()
    }
}

// ── Inference ────────────────────────────────────────────────────────

fn live_mode_available(body: &str, mode: InferenceMode) -> bool {
    match mode {
        InferenceMode::Marker => body.contains(LIVE_MODE_MARKER),
        InferenceMode::Structured => match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(devices)) => devices.iter().any(live_mode_null),
            Ok(device @ Value::Object(_)) => live_mode_null(&device),
            _ => false,
        },
    }
}

fn live_mode_null(device: &Value) -> bool {
    let in_attributes = device
        .get("attributes")
        .and_then(|a| a.get("liveModetime"));
    let top_level = device.get("liveModetime");
    matches!(in_attributes.or(top_level), Some(Value::Null))
}

fn command_seen(body: &str, command_type: &str, marker: &str, mode: InferenceMode) -> bool {
    match mode {
        InferenceMode::Marker => body.contains(marker),
        InferenceMode::Structured => serde_json::from_str::<Vec<Value>>(body)
            .map(|commands| {
                commands
                    .iter()
                    .any(|c| c.get("type").and_then(Value::as_str) == Some(command_type))
            })
            .unwrap_or(false),
    }
}

/// Read one capability's state out of a fetched body.
pub fn infer(capability: Capability, body: &str, mode: InferenceMode) -> bool {
    match capability {
        Capability::LiveMode => live_mode_available(body, mode),
        Capability::Light => command_seen(body, "lightOn", LIGHT_MARKER, mode),
        Capability::Buzzer => command_seen(body, "buzzerOn", BUZZER_MARKER, mode),
    }
}

async fn poll_one(
    client: &ApiClient,
    device_id: DeviceId,
    capability: Capability,
    mode: InferenceMode,
) -> CapabilityState {
    let body = match capability {
        Capability::LiveMode => client.device_status_body(device_id.0).await,
        Capability::Light | Capability::Buzzer => client.command_history_body(device_id.0).await,
    };
    match body {
        Ok(body) => CapabilityState {
            enabled: infer(capability, &body, mode),
            error: None,
        },
        Err(e) => {
            warn!(%device_id, %capability, error = %e, "capability status unavailable");
            CapabilityState::failed(e.to_string())
        }
    }
}

/// Poll all three capabilities for a device, once.
///
/// Without a known position every control is disabled and no request
/// is made.
pub async fn poll_capabilities(
    client: &ApiClient,
    device_id: DeviceId,
    has_position: bool,
    mode: InferenceMode,
) -> StatusPoll {
    if !has_position {
        debug!(%device_id, "no position known, capability controls disabled");
        return StatusPoll::disabled(device_id);
    }

    let (live_mode, light, buzzer) = tokio::join!(
        poll_one(client, device_id, Capability::LiveMode, mode),
        poll_one(client, device_id, Capability::Light, mode),
        poll_one(client, device_id, Capability::Buzzer, mode),
    );

    StatusPoll {
        device_id,
        live_mode,
        light,
        buzzer,
    }
}

// ── Poller ───────────────────────────────────────────────────────────

/// Runs capability polls with last-selection-wins semantics.
///
/// Cheap to clone; clones share the generation counter, so a poll
/// started from any clone supersedes polls from the others.
#[derive(Clone)]
pub struct StatusPoller {
    client: ApiClient,
    mode: InferenceMode,
    generation: Arc<AtomicU64>,
    current: Arc<Mutex<Selection>>,
}

/// The device the latest poll was started for, and its cancel handle.
struct Selection {
    device: Option<DeviceId>,
    token: CancellationToken,
}

impl StatusPoller {
    pub fn new(client: ApiClient, mode: InferenceMode) -> Self {
        Self {
            client,
            mode,
            generation: Arc::new(AtomicU64::new(0)),
            current: Arc::new(Mutex::new(Selection {
                device: None,
                token: CancellationToken::new(),
            })),
        }
    }

    /// Poll `device_id`, superseding any poll still in flight.
    ///
    /// Returns `None` if this poll was itself superseded or cancelled
    /// before it finished.
    pub async fn poll(&self, device_id: DeviceId, has_position: bool) -> Option<StatusPoll> {
        let (generation, token) = self.begin(device_id, false)?;
        self.run(generation, token, device_id, has_position).await
    }

    /// Re-poll `device_id` only while it is still the selected device.
    ///
    /// Returns `None` without touching the poll in flight when another
    /// device has been selected since, or the selection was cancelled.
    pub async fn refresh(&self, device_id: DeviceId, has_position: bool) -> Option<StatusPoll> {
        let Some((generation, token)) = self.begin(device_id, true) else {
            debug!(%device_id, "skipping re-poll for a device that is no longer selected");
            return None;
        };
        self.run(generation, token, device_id, has_position).await
    }

    /// Abandon the poll in flight, if any, and clear the selection.
    pub fn cancel(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::SeqCst);
        current.device = None;
        current.token.cancel();
    }

    fn begin(&self, device_id: DeviceId, selected_only: bool) -> Option<(u64, CancellationToken)> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if selected_only && current.device != Some(device_id) {
            return None;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        std::mem::replace(&mut current.token, token.clone()).cancel();
        current.device = Some(device_id);
        Some((generation, token))
    }

    async fn run(
        &self,
        generation: u64,
        token: CancellationToken,
        device_id: DeviceId,
        has_position: bool,
    ) -> Option<StatusPoll> {
        let result = tokio::select! {
            () = token.cancelled() => None,
            poll = poll_capabilities(&self.client, device_id, has_position, self.mode) => Some(poll),
        };

        if self.generation.load(Ordering::SeqCst) == generation {
            result
        } else {
            debug!(%device_id, "discarding superseded capability poll");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_inference_matches_raw_substrings() {
        let device = r#"[{"id":42,"liveModetime":null}]"#;
        assert!(infer(Capability::LiveMode, device, InferenceMode::Marker));
        assert!(!infer(
            Capability::LiveMode,
            r#"[{"id":42,"liveModetime":"2024-01-01"}]"#,
            InferenceMode::Marker
        ));

        let commands = r#"[{"id":9,"type":"lightOn"}]"#;
        assert!(infer(Capability::Light, commands, InferenceMode::Marker));
        assert!(!infer(Capability::Buzzer, commands, InferenceMode::Marker));
    }

    #[test]
    fn marker_inference_is_whitespace_sensitive() {
        let commands = r#"[{"id":9, "type": "lightOn"}]"#;
        assert!(!infer(Capability::Light, commands, InferenceMode::Marker));
        assert!(infer(Capability::Light, commands, InferenceMode::Structured));
    }

    #[test]
    fn structured_inference_reads_attributes() {
        let device = r#"[{"id":42,"attributes":{"liveModetime":null}}]"#;
        assert!(infer(Capability::LiveMode, device, InferenceMode::Structured));
        assert!(!infer(Capability::LiveMode, r#"[{"id":42,"attributes":{}}]"#, InferenceMode::Structured));
        assert!(!infer(Capability::Buzzer, "not json", InferenceMode::Structured));
    }

    #[test]
    fn errors_are_reported_per_capability() {
        let mut poll = StatusPoll::disabled(DeviceId(1));
        poll.light = CapabilityState::failed("HTTP 500".into());
        poll.buzzer = CapabilityState::failed("HTTP 500".into());
        let errors = poll.errors();
        assert_eq!(errors.len(), 2);
        assert!(matches!(
            errors[0],
            CoreError::StatusUnavailable {
                capability: Capability::Light,
                ..
            }
        ));
    }
}
