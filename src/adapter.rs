//! Adapter service object and boundary surface.
//!
//! [`Adapter`] is the stateful service the host boundary embeds: it exposes
//! `start`/`stop`/`reconfigure`, and emits [`AdapterEvent`]s (status changes,
//! rebuilt action definitions) over a channel handed out at construction.
//! There is no inheritance and no global state; every configured server gets
//! its own independent `Adapter` with its own catalog and connection
//! lifecycle.
//!
//! # Example
//!
//! ```no_run
//! use gradelink::{Adapter, AdapterEvent, ConnectionConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (adapter, mut events) = Adapter::new();
//!     adapter.start(ConnectionConfig::new("gradehost"));
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             AdapterEvent::Status(status) => println!("status: {status}"),
//!             AdapterEvent::ActionsChanged(actions) => println!("{} actions", actions.len()),
//!         }
//!     }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::auth::AuthSession;
use crate::catalog::Catalog;
use crate::config::ConnectionConfig;
use crate::dispatch::{build_action_definitions, ActionDefinition};
use crate::protocol::message::Outbound;
use crate::transport::link;

// ============================================================================
// Status
// ============================================================================

/// Connection status reported to the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// A connection attempt is underway.
    Connecting,
    /// Channel open, ready for (or past) authentication.
    Ok,
    /// Config invalid; terminal until reconfigured.
    BadConfig {
        /// What is wrong with the config.
        message: String,
    },
    /// Channel open or transport failed; a reconnect is scheduled.
    ConnectionFailure {
        /// Underlying failure description.
        message: String,
    },
    /// Explicitly stopped; terminal until restarted.
    Disconnected,
}

impl Status {
    /// Creates a bad-config status.
    #[inline]
    pub fn bad_config(message: impl Into<String>) -> Self {
        Self::BadConfig {
            message: message.into(),
        }
    }

    /// Creates a connection-failure status.
    #[inline]
    pub fn connection_failure(message: impl Into<String>) -> Self {
        Self::ConnectionFailure {
            message: message.into(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Ok => write!(f, "ok"),
            Self::BadConfig { message } => write!(f, "bad config: {message}"),
            Self::ConnectionFailure { message } => write!(f, "connection failure: {message}"),
            Self::Disconnected => write!(f, "disconnected"),
        }
    }
}

// ============================================================================
// ConnectionState
// ============================================================================

/// Internal lifecycle position of the managed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No channel and none pending.
    #[default]
    Disconnected,
    /// Opening the channel.
    Connecting,
    /// Channel open, handshake in flight.
    Authenticating,
    /// Handshake accepted; commands may be dispatched.
    Ready,
    /// Last attempt failed; reconnect pending.
    Failed,
}

// ============================================================================
// AdapterEvent
// ============================================================================

/// Events emitted to the embedding boundary.
#[derive(Debug, Clone)]
pub enum AdapterEvent {
    /// Connection status changed.
    Status(Status),
    /// Catalog changed; the action definitions were rebuilt.
    ActionsChanged(Vec<ActionDefinition>),
}

// ============================================================================
// Supervisor
// ============================================================================

/// Handle to the running connection supervisor task.
struct Supervisor {
    shutdown_tx: broadcast::Sender<()>,
    _task: JoinHandle<()>,
}

// ============================================================================
// AdapterInner
// ============================================================================

/// Shared mutable state for one adapter instance.
pub(crate) struct AdapterInner {
    /// Active connection target.
    config: Mutex<ConnectionConfig>,
    /// Channel lifecycle position.
    state: Mutex<ConnectionState>,
    /// Last status reported outward.
    status: Mutex<Status>,
    /// Handshake history for the current connection.
    session: Mutex<AuthSession>,
    /// Cached slot/look lists, wholly replaced per fetch.
    catalog: Mutex<Catalog>,
    /// Sender into the live session's outbound queue, when one exists.
    link: Mutex<Option<mpsc::UnboundedSender<Outbound>>>,
    /// Running supervisor, when started.
    supervisor: Mutex<Option<Supervisor>>,
    /// Event stream to the boundary.
    events: mpsc::UnboundedSender<AdapterEvent>,
}

impl AdapterInner {
    fn new(events: mpsc::UnboundedSender<AdapterEvent>) -> Self {
        Self {
            config: Mutex::new(ConnectionConfig::default()),
            state: Mutex::new(ConnectionState::Disconnected),
            status: Mutex::new(Status::Disconnected),
            session: Mutex::new(AuthSession::default()),
            catalog: Mutex::new(Catalog::default()),
            link: Mutex::new(None),
            supervisor: Mutex::new(None),
            events,
        }
    }

    /// Records and emits a status transition.
    pub(crate) fn report_status(&self, status: Status) {
        debug!(%status, "status");
        *self.status.lock() = status.clone();
        let _ = self.events.send(AdapterEvent::Status(status));
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub(crate) fn config(&self) -> ConnectionConfig {
        self.config.lock().clone()
    }

    /// Mirrors the handshake history so the catalog fetcher can reuse the
    /// last computed code as its credential.
    pub(crate) fn record_session(&self, session: AuthSession) {
        *self.session.lock() = session;
    }

    pub(crate) fn auth_code(&self) -> Option<String> {
        self.session.lock().last_code.clone()
    }

    /// Makes a live session's outbound queue reachable from the dispatcher.
    pub(crate) fn attach_link(&self, tx: mpsc::UnboundedSender<Outbound>) {
        *self.link.lock() = Some(tx);
    }

    /// Clears the link handle, but only if `tx` is still the attached one.
    /// A wound-down session must not clear a successor's handle.
    pub(crate) fn detach_link(&self, tx: &mpsc::UnboundedSender<Outbound>) {
        let mut guard = self.link.lock();
        if guard.as_ref().is_some_and(|cur| cur.same_channel(tx)) {
            *guard = None;
        }
    }

    pub(crate) fn clear_link(&self) {
        *self.link.lock() = None;
    }

    pub(crate) fn link(&self) -> Option<mpsc::UnboundedSender<Outbound>> {
        self.link.lock().clone()
    }

    pub(crate) fn with_catalog<T>(&self, f: impl FnOnce(&Catalog) -> T) -> T {
        f(&self.catalog.lock())
    }

    /// Replaces both cached lists at once and emits rebuilt action
    /// definitions. Called only after both fetches succeeded, so a failed
    /// discovery never partially overwrites the cache.
    pub(crate) fn commit_catalog(&self, catalog: Catalog) {
        let actions = build_action_definitions(&catalog);
        *self.catalog.lock() = catalog;
        let _ = self.events.send(AdapterEvent::ActionsChanged(actions));
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// Client adapter for one grading server.
///
/// Cheap to clone; clones share the same connection and catalog.
#[derive(Clone)]
pub struct Adapter {
    pub(crate) inner: Arc<AdapterInner>,
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Adapter {
    /// Creates an adapter and the event stream its boundary listens on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AdapterEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let adapter = Self {
            inner: Arc::new(AdapterInner::new(events)),
        };
        (adapter, events_rx)
    }

    /// Starts connecting to the configured server.
    ///
    /// Any previous channel and pending reconnect are torn down first, so at
    /// most one channel exists per instance. A blank host reports
    /// [`Status::BadConfig`] and makes no connection attempt.
    pub fn start(&self, config: ConnectionConfig) {
        self.halt();

        if let Err(e) = config.validate() {
            info!(error = %e, "refusing to connect");
            self.inner.set_state(ConnectionState::Failed);
            self.inner.report_status(Status::bad_config(e.to_string()));
            return;
        }

        info!(host = %config.host, port = %config.port, "starting adapter");
        *self.inner.config.lock() = config.clone();
        self.inner.set_state(ConnectionState::Connecting);
        self.inner.report_status(Status::Connecting);

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = link::spawn(Arc::clone(&self.inner), config, shutdown_rx);
        *self.inner.supervisor.lock() = Some(Supervisor {
            shutdown_tx,
            _task: task,
        });
    }

    /// Closes any existing channel (idempotent if none open) and restarts
    /// with the new config.
    pub fn reconfigure(&self, config: ConnectionConfig) {
        info!("reconfiguring adapter");
        self.start(config);
    }

    /// Stops the adapter: closes the channel if open, cancels any pending
    /// reconnect, reports [`Status::Disconnected`].
    ///
    /// Safe to call repeatedly and from any state. Stopped is terminal until
    /// `start` is called again.
    pub fn stop(&self) {
        self.halt();
        self.inner.clear_link();
        self.inner.set_state(ConnectionState::Disconnected);
        self.inner.report_status(Status::Disconnected);
    }

    /// Last status reported to the boundary.
    #[must_use]
    pub fn status(&self) -> Status {
        self.inner.status.lock().clone()
    }

    /// Current channel lifecycle position.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state()
    }

    /// Signals the supervisor to wind down, without reporting a status.
    /// Dropping the handle also drops `shutdown_tx`, which a supervisor
    /// treats the same as an explicit signal.
    fn halt(&self) {
        if let Some(supervisor) = self.inner.supervisor.lock().take() {
            let _ = supervisor.shutdown_tx.send(());
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
