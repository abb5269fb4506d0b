//! `HomeyClient`: lifecycle, event subscription and manager access

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt as _;
use homey_transport::{
    ApiRequest, AuthSession, ClientConfig, HomeyResult, HttpGateway, RequestGateway, Session,
    SocketConnector, TungsteniteConnector, build_http_client,
};
use serde_json::{Map, Value};
use tracing::{debug, info, trace};

use super::builder::ClientBuilder;
use super::state::{ConnectionState, ConnectionStatus};
use crate::events::{ChannelState, EventChannel, EventHandler, EventRouter, HandlerResult};
use crate::managers::{AppManager, DeviceManager, FlowManager, SystemManager, ZoneManager};

/// Path of the system manager, relative to `{base}/api/`
const SYSTEM_PATH: &str = "manager/system";

struct ClientInner {
    config: ClientConfig,
    auth: Arc<AuthSession>,
    gateway: Arc<dyn RequestGateway>,
    status: ConnectionStatus,
    router: EventRouter,
    channel: EventChannel,
    /// Serializes connect / disconnect / authenticate
    lifecycle: tokio::sync::Mutex<()>,
    devices: DeviceManager,
    zones: ZoneManager,
    flows: FlowManager,
    apps: AppManager,
    system: SystemManager,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        self.channel.shutdown_now();
    }
}

/// Client for one Homey hub.
///
/// Cloning is cheap; clones share the session, the event channel and the
/// handler registry. When the last clone is dropped the event channel is
/// cancelled without waiting. Call [`disconnect`](Self::disconnect) for an
/// orderly shutdown.
///
/// Handlers that capture a `HomeyClient` keep it alive through the registry;
/// capture a manager clone instead when only REST access is needed.
///
/// # Examples
///
/// ```rust,no_run
/// use homey_client::HomeyClient;
///
/// # async fn example() -> homey_client::HomeyResult<()> {
/// let client = HomeyClient::create("http://192.168.1.100", "my-token").await?;
///
/// client.on_fn("device", |payload| {
///     println!("device changed: {payload}");
///     Ok(())
/// });
/// client.open_channel(true).await?;
///
/// for device in client.devices().online().await? {
///     println!("{} is online", device.name);
/// }
///
/// client.disconnect().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HomeyClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for HomeyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomeyClient")
            .field("base_url", &self.inner.auth.base_url())
            .field("state", &self.state())
            .field("channel", &self.channel_state())
            .finish()
    }
}

impl HomeyClient {
    // ============================================================================
    // CONSTRUCTION
    // ============================================================================

    /// Build a client from `config`. Performs no network I/O.
    ///
    /// # Errors
    ///
    /// [`HomeyError::Validation`](crate::HomeyError::Validation) if the URL,
    /// token or timeout is invalid.
    pub fn new(config: ClientConfig) -> HomeyResult<Self> {
        Self::assemble(config, None)
    }

    /// Start a [`ClientBuilder`]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Build a client and [`connect`](Self::connect) it.
    pub async fn create(base_url: impl AsRef<str>, token: impl Into<String>) -> HomeyResult<Self> {
        let client = Self::new(ClientConfig::new(base_url, token))?;
        client.connect().await?;
        Ok(client)
    }

    pub(crate) fn assemble(
        config: ClientConfig,
        connector: Option<Arc<dyn SocketConnector>>,
    ) -> HomeyResult<Self> {
        config.validate()?;

        let http = build_http_client(&config)?;
        let auth = Arc::new(AuthSession::with_client(&config, http.clone())?);
        let gateway: Arc<dyn RequestGateway> = Arc::new(
            HttpGateway::new(http, Arc::clone(&auth)).with_default_timeout(config.timeout),
        );

        let status = ConnectionStatus::new();
        let router = EventRouter::new();
        let connector = connector.unwrap_or_else(|| {
            Arc::new(TungsteniteConnector::new(config.channel.connect_timeout))
        });
        let channel = EventChannel::new(
            Arc::clone(&auth),
            config.channel.clone(),
            connector,
            router.clone(),
            status.clone(),
        );

        debug!("Created Homey client for {}", auth.base_url());

        Ok(Self {
            inner: Arc::new(ClientInner {
                devices: DeviceManager::new(Arc::clone(&gateway)),
                zones: ZoneManager::new(Arc::clone(&gateway)),
                flows: FlowManager::new(Arc::clone(&gateway)),
                apps: AppManager::new(Arc::clone(&gateway)),
                system: SystemManager::new(Arc::clone(&gateway)),
                config,
                auth,
                gateway,
                status,
                router,
                channel,
                lifecycle: tokio::sync::Mutex::new(()),
            }),
        })
    }

    // ============================================================================
    // LIFECYCLE
    // ============================================================================

    /// Probe the hub with the configured token.
    ///
    /// Moves an uninitialized or disconnected client to
    /// [`ConnectionState::Authenticated`]; a connected client stays connected.
    pub async fn authenticate(&self) -> HomeyResult<Session> {
        let _guard = self.inner.lifecycle.lock().await;
        self.authenticate_locked().await
    }

    async fn authenticate_locked(&self) -> HomeyResult<Session> {
        let session = self.inner.auth.authenticate().await?;
        if self.inner.status.get() != ConnectionState::Connected {
            self.inner.status.set(ConnectionState::Authenticated);
        }
        Ok(session)
    }

    /// Authenticate if needed, then mark the client connected.
    ///
    /// Never opens the event channel; see [`open_channel`](Self::open_channel).
    pub async fn connect(&self) -> HomeyResult<()> {
        let _guard = self.inner.lifecycle.lock().await;
        if !self.inner.auth.is_authenticated() {
            self.authenticate_locked().await?;
        }
        if self.inner.status.set(ConnectionState::Connected) != ConnectionState::Connected {
            info!("Connected to Homey at {}", self.inner.auth.base_url());
        }
        Ok(())
    }

    /// Close the event channel (if active), then mark the client disconnected.
    ///
    /// Idempotent. No handler runs after this returns, except the one that
    /// called it when invoked from inside an event handler.
    pub async fn disconnect(&self) {
        let _guard = self.inner.lifecycle.lock().await;
        self.inner.channel.close().await;
        if self.inner.status.set(ConnectionState::Disconnected) == ConnectionState::Disconnected {
            trace!("disconnect() on already disconnected client");
        } else {
            info!("Disconnected from Homey");
        }
    }

    /// Run `f` between [`connect`](Self::connect) and
    /// [`disconnect`](Self::disconnect).
    ///
    /// `disconnect` runs whether `f` returns `Ok`, `Err` or panics; a panic is
    /// resumed after the client is disconnected.
    pub async fn scoped<F, Fut, T>(&self, f: F) -> HomeyResult<T>
    where
        F: FnOnce(HomeyClient) -> Fut,
        Fut: Future<Output = HomeyResult<T>>,
    {
        self.connect().await?;
        let client = self.clone();
        let outcome = AssertUnwindSafe(async move { f(client).await })
            .catch_unwind()
            .await;
        self.disconnect().await;
        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Connected and holding an authenticated session
    pub fn is_connected(&self) -> bool {
        self.inner.status.is_connected() && self.inner.auth.is_authenticated()
    }

    /// Whether the probe has succeeded
    pub fn is_authenticated(&self) -> bool {
        self.inner.auth.is_authenticated()
    }

    /// Lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.inner.status.get()
    }

    /// Metadata returned by the authentication probe, authenticating first if needed
    pub async fn system_info(&self) -> HomeyResult<Map<String, Value>> {
        if !self.inner.auth.is_authenticated() {
            self.authenticate().await?;
        }
        Ok(self.inner.auth.metadata())
    }

    /// Whether the hub answers an authenticated request
    pub async fn ping(&self) -> bool {
        match self.inner.gateway.request(ApiRequest::get(SYSTEM_PATH)).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Ping failed: {}", e);
                false
            }
        }
    }

    // ============================================================================
    // EVENTS
    // ============================================================================

    /// Register `handler` for `topic`, replacing any previous one
    pub fn on(&self, topic: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.inner.router.on(topic, handler);
    }

    /// Register a synchronous closure for `topic`
    pub fn on_fn<F>(&self, topic: impl Into<String>, f: F)
    where
        F: Fn(Value) -> HandlerResult + Send + Sync + 'static,
    {
        self.inner.router.on_fn(topic, f);
    }

    /// Register an async closure for `topic`
    pub fn on_async<F, Fut>(&self, topic: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.inner.router.on_async(topic, f);
    }

    /// Remove the handler for `topic`; returns whether one was registered
    pub fn off(&self, topic: &str) -> bool {
        self.inner.router.off(topic)
    }

    /// Open the real-time event channel. See [`EventChannel::open`].
    pub async fn open_channel(&self, auto_reconnect: bool) -> HomeyResult<()> {
        self.inner.channel.open(auto_reconnect).await
    }

    /// Close the real-time event channel. See [`EventChannel::close`].
    pub async fn close_channel(&self) {
        self.inner.channel.close().await;
    }

    /// Whether the event channel is open
    pub fn is_channel_open(&self) -> bool {
        self.inner.channel.is_open()
    }

    /// Event channel state
    pub fn channel_state(&self) -> ChannelState {
        self.inner.channel.state()
    }

    /// The event channel
    pub fn channel(&self) -> &EventChannel {
        &self.inner.channel
    }

    /// The handler registry
    pub fn router(&self) -> &EventRouter {
        &self.inner.router
    }

    // ============================================================================
    // ACCESSORS
    // ============================================================================

    /// Devices
    pub fn devices(&self) -> &DeviceManager {
        &self.inner.devices
    }

    /// Zones
    pub fn zones(&self) -> &ZoneManager {
        &self.inner.zones
    }

    /// Flows
    pub fn flows(&self) -> &FlowManager {
        &self.inner.flows
    }

    /// Apps
    pub fn apps(&self) -> &AppManager {
        &self.inner.apps
    }

    /// Hub-wide settings
    pub fn system(&self) -> &SystemManager {
        &self.inner.system
    }

    /// The configuration this client was built from
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The authentication session
    pub fn auth(&self) -> &Arc<AuthSession> {
        &self.inner.auth
    }

    /// The request gateway shared by all managers
    pub fn gateway(&self) -> Arc<dyn RequestGateway> {
        Arc::clone(&self.inner.gateway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homey_transport::HomeyError;

    #[test]
    fn test_new_validates_before_io() {
        let err = HomeyClient::new(ClientConfig::new("ftp://hub.local", "token")).unwrap_err();
        assert!(matches!(err, HomeyError::Validation(_)));

        let err = HomeyClient::new(ClientConfig::new("http://hub.local", "   ")).unwrap_err();
        assert!(matches!(err, HomeyError::Validation(_)));
    }

    #[tokio::test]
    async fn test_fresh_client_state() {
        let client = HomeyClient::new(ClientConfig::new("http://192.168.1.10", "token")).unwrap();
        assert_eq!(client.state(), ConnectionState::Uninitialized);
        assert!(!client.is_connected());
        assert!(!client.is_authenticated());
        assert_eq!(client.channel_state(), ChannelState::Idle);
        assert!(format!("{client:?}").contains("192.168.1.10"));
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_fine() {
        let client = HomeyClient::new(ClientConfig::new("http://192.168.1.10", "token")).unwrap();
        client.disconnect().await;
        client.disconnect().await;
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_handler_registration_goes_to_router() {
        let client = HomeyClient::new(ClientConfig::new("http://192.168.1.10", "token")).unwrap();
        client.on_fn("zone", |_| Ok(()));
        client.on_async("device", |_| async { Ok(()) });
        assert_eq!(client.router().topics(), vec!["device", "zone"]);
        assert!(client.off("zone"));
        assert!(!client.off("zone"));
    }
}
