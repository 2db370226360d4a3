// ── Session facade ──
//
// Owns the authenticated client and the context every view needs:
// who is signed in, what the server allows, resolved preferences and
// the device/position cache. Front-ends hold one `Session` and call
// through it; nothing here is global.

use std::sync::Arc;

use tracing::{debug, info};
use url::Url;

use tracdash_api::transport::{TlsMode, TransportConfig};
use tracdash_api::{ApiClient, Credentials, TripReportParams};

use crate::attributes::AttributeDictionary;
use crate::card::{CardContext, StatusCard, build_status_card};
use crate::config::{AuthCredentials, ConnectionConfig, TlsVerification};
use crate::dispatch;
use crate::error::CoreError;
use crate::format::Formatter;
use crate::geofence;
use crate::i18n::{English, Translate};
use crate::model::{Device, DeviceId, GeofenceId, Position, PositionId, Server, User};
use crate::permissions::{Account, Permissions};
use crate::preferences::Preferences;
use crate::report::{self, ReportOutcome};
use crate::route::Route;
use crate::status::{Capability, StatusPoll, StatusPoller};
use crate::store::DataStore;

/// An authenticated connection plus its derived context.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    client: ApiClient,
    account: Account,
    preferences: Preferences,
    formatter: Formatter,
    dictionary: AttributeDictionary,
    store: DataStore,
    poller: StatusPoller,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.base_url().as_str())
            .field("user", &self.inner.account.user.email)
            .finish_non_exhaustive()
    }
}

fn build_transport(config: &ConnectionConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
        cookie_jar: None,
    }
}

impl Session {
    /// Authenticate and load the session context.
    ///
    /// Password credentials open a cookie session; a token is verified
    /// with `GET /api/session`. Devices and positions are not loaded
    /// until [`refresh`](Self::refresh).
    pub async fn connect(config: ConnectionConfig) -> Result<Self, CoreError> {
        Self::connect_with_translator(config, Arc::new(English)).await
    }

    pub async fn connect_with_translator(
        config: ConnectionConfig,
        translator: Arc<dyn Translate>,
    ) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let credentials = match &config.auth {
            AuthCredentials::Password { email, password } => Credentials::Password {
                email: email.clone(),
                password: password.clone(),
            },
            AuthCredentials::Token(token) => Credentials::Token {
                token: token.clone(),
            },
        };
        let client = ApiClient::new(config.url.clone(), &credentials, &transport)?;

        let user = match &credentials {
            Credentials::Password { email, password } => client.login(email, password).await?,
            Credentials::Token { .. } => client.current_user().await?,
        };
        let server = client.server().await?;
        info!(user = %user.email, admin = user.administrator, "session opened");

        let account = Account {
            user: User::from(user),
            server: Server::from(server),
        };
        Ok(Self::from_parts(client, account, &config, translator))
    }

    /// Assemble a session from an already authenticated client.
    pub fn from_parts(
        client: ApiClient,
        account: Account,
        config: &ConnectionConfig,
        translator: Arc<dyn Translate>,
    ) -> Self {
        let preferences = Preferences::new(&account.user, &account.server, config.preferences.clone());
        let formatter = preferences.formatter().with_translator(Arc::clone(&translator));
        let dictionary = AttributeDictionary::positions(translator.as_ref());
        let poller = StatusPoller::new(client.clone(), config.inference);

        Self {
            inner: Arc::new(SessionInner {
                client,
                account,
                preferences,
                formatter,
                dictionary,
                store: DataStore::new(),
                poller,
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    pub fn user(&self) -> &User {
        &self.inner.account.user
    }

    pub fn server(&self) -> &Server {
        &self.inner.account.server
    }

    pub fn permissions(&self) -> &dyn Permissions {
        &self.inner.account
    }

    pub fn preferences(&self) -> &Preferences {
        &self.inner.preferences
    }

    pub fn formatter(&self) -> &Formatter {
        &self.inner.formatter
    }

    pub fn dictionary(&self) -> &AttributeDictionary {
        &self.inner.dictionary
    }

    pub fn store(&self) -> &DataStore {
        &self.inner.store
    }

    pub fn base_url(&self) -> &Url {
        self.inner.client.base_url()
    }

    // ── Data ─────────────────────────────────────────────────────

    pub async fn refresh_devices(&self) -> Result<usize, CoreError> {
        let devices: Vec<Device> = self
            .inner
            .client
            .list_devices()
            .await?
            .into_iter()
            .map(Device::from)
            .collect();
        let count = devices.len();
        self.inner.store.replace_devices(devices);
        debug!(count, "devices refreshed");
        Ok(count)
    }

    pub async fn refresh_positions(&self) -> Result<usize, CoreError> {
        let positions: Vec<Position> = self
            .inner
            .client
            .latest_positions()
            .await?
            .into_iter()
            .map(Position::from)
            .collect();
        let count = positions.len();
        self.inner.store.replace_positions(positions);
        debug!(count, "positions refreshed");
        Ok(count)
    }

    /// Reload devices and positions.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let (devices, positions) = tokio::join!(self.refresh_devices(), self.refresh_positions());
        devices?;
        positions?;
        Ok(())
    }

    /// Look a device up by id, falling back to an exact name match.
    pub fn find_device(&self, identifier: &str) -> Result<Arc<Device>, CoreError> {
        let store = &self.inner.store;
        if let Some(device) = identifier
            .parse::<DeviceId>()
            .ok()
            .and_then(|id| store.device(id))
        {
            return Ok(device);
        }
        store
            .devices_snapshot()
            .iter()
            .find(|d| d.name == identifier || d.unique_id == identifier)
            .cloned()
            .ok_or_else(|| CoreError::DeviceNotFound {
                identifier: identifier.to_owned(),
            })
    }

    /// Full position by id, as opened by the details link.
    pub async fn position_details(&self, id: PositionId) -> Result<Position, CoreError> {
        self.inner
            .client
            .position(id.0)
            .await?
            .map(Position::from)
            .ok_or_else(|| CoreError::NotFound {
                entity_type: "position".into(),
                identifier: id.to_string(),
            })
    }

    /// `/api/media/{uniqueId}/{image}` for a device with an image.
    pub fn device_image_url(&self, device: &Device) -> Option<Url> {
        let image = device.image()?;
        self.inner.client.media_url(&device.unique_id, image).ok()
    }

    // ── Status card ──────────────────────────────────────────────

    /// Poll capability state for a device, superseding earlier polls.
    ///
    /// `None` means a newer poll (or [`cancel_status`](Self::cancel_status))
    /// took over and this result must not be applied.
    pub async fn poll_status(&self, device_id: DeviceId) -> Option<StatusPoll> {
        let has_position = self.inner.store.position(device_id).is_some();
        self.inner.poller.poll(device_id, has_position).await
    }

    /// Re-poll a device after a command, if it is still the selected one.
    ///
    /// Unlike [`poll_status`](Self::poll_status) this never preempts a
    /// poll started for a different device.
    pub async fn refresh_status(&self, device_id: DeviceId) -> Option<StatusPoll> {
        let has_position = self.inner.store.position(device_id).is_some();
        self.inner.poller.refresh(device_id, has_position).await
    }

    /// Abandon any capability poll in flight.
    pub fn cancel_status(&self) {
        self.inner.poller.cancel();
    }

    pub fn status_card(
        &self,
        device_id: DeviceId,
        status: Option<&StatusPoll>,
        disable_actions: bool,
    ) -> Option<StatusCard> {
        let device = self.inner.store.device(device_id)?;
        let position = self.inner.store.position(device_id);
        let ctx = CardContext {
            permissions: &self.inner.account,
            preferences: &self.inner.preferences,
            dictionary: &self.inner.dictionary,
            formatter: &self.inner.formatter,
        };
        Some(build_status_card(
            &device,
            position.as_deref(),
            status,
            disable_actions,
            &ctx,
        ))
    }

    pub async fn send(&self, device_id: DeviceId, capability: Capability) -> Result<(), CoreError> {
        dispatch::dispatch(&self.inner.client, device_id, capability).await
    }

    /// Create a geofence around the device's current position and link it.
    ///
    /// Returns the geofence's settings page.
    pub async fn create_geofence(&self, device_id: DeviceId) -> Result<Route, CoreError> {
        let position = self
            .inner
            .store
            .position(device_id)
            .ok_or_else(|| CoreError::ValidationFailed {
                message: format!("device {device_id} has no known position"),
            })?;
        let name = self.inner.formatter.t("sharedGeofence");
        let id: GeofenceId = geofence::create_at_position(&self.inner.client, &position, &name).await?;
        Ok(Route::GeofenceSettings(id))
    }

    /// Delete a device, then reload the device list.
    pub async fn remove_device(&self, device_id: DeviceId) -> Result<(), CoreError> {
        if self.inner.account.device_readonly() {
            return Err(CoreError::PermissionDenied {
                message: "device settings are read-only for this account".into(),
            });
        }
        self.inner.client.delete_device(device_id.0).await?;
        self.inner.store.remove_device(device_id);
        info!(%device_id, "device removed");
        self.refresh_devices().await?;
        Ok(())
    }

    // ── Reports ──────────────────────────────────────────────────

    pub async fn trip_report(&self, params: &TripReportParams) -> Result<ReportOutcome, CoreError> {
        report::fetch_trips(&self.inner.client, params).await
    }
}
