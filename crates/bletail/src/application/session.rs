//! The session state machine.
//!
//! One spawned task owns everything mutable about the session: the
//! peripheral handle, the lifecycle state, the message log, and the
//! visibility bridge.  Nothing mutates session state from outside that
//! task, which is what makes the interleaving of user commands, connect
//! completions, link events, and payloads safe to reason about.
//!
//! # How events reach the task
//!
//! Three kinds of input arrive on two channels:
//!
//! - **Commands** (`connect` / `disconnect` / `clear_messages`) from the
//!   [`SessionHandle`].
//! - **Internal inputs** from helper tasks the session spawns per connect
//!   attempt: the connect driver reports link-up and then the established
//!   subscription, the listener forwarder relays unsolicited
//!   connection-state events, and the payload forwarder relays raw
//!   notification payloads.
//!
//! Every internal input is stamped with the *generation* of the connect
//! attempt that produced it.  The generation advances on each connect and
//! on every teardown, so a slow attempt completing after the session moved
//! on is recognized as stale and discarded instead of resurrecting a dead
//! session.
//!
//! # What observers see
//!
//! State, status line, and log snapshots are published through `watch`
//! channels.  Reading them never waits on session I/O; a read during a
//! suspended connect call simply returns the last published value.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use bletail_core::{select_data_channel, MessageEntry, MessageLog, SessionError, SessionState};

use crate::application::pipeline;
use crate::application::visibility::VisibilityBridge;
use crate::infrastructure::ble::{BlePeripheral, EventStream, PayloadStream, PeripheralEvent};
use crate::infrastructure::keepalive::Keepalive;

/// Tunables of the session lifecycle.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Bound on the transport connect call.
    pub connect_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
        }
    }
}

/// Commands accepted from the presentation layer.
pub enum SessionCommand {
    Connect(Arc<dyn BlePeripheral>),
    Disconnect,
    ClearMessages,
}

/// The established result of a successful connect sequence.
struct EstablishedLink {
    characteristic: Uuid,
    payloads: PayloadStream,
}

/// Internal inputs produced by the helper tasks of one connect attempt.
enum SessionInput {
    /// The transport link came up; discovery is about to run.
    LinkUp { generation: u64 },
    /// The full connect sequence finished (or failed at some stage).
    LinkReady {
        generation: u64,
        result: Result<EstablishedLink, SessionError>,
    },
    /// Unsolicited connection-state event from the listener forwarder.
    LinkEvent {
        generation: u64,
        event: PeripheralEvent,
    },
    /// One raw notification payload.
    Payload { generation: u64, bytes: Vec<u8> },
    /// The payload stream ended without a disconnect event.
    PayloadStreamEnded { generation: u64 },
}

/// The one live subscription of a session.
struct ActiveSubscription {
    characteristic: Uuid,
}

/// Cloneable handle for commanding and observing the session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    state: watch::Receiver<SessionState>,
    status: watch::Receiver<String>,
    log: watch::Receiver<MessageLog>,
}

impl SessionHandle {
    /// Hands the session a peripheral to connect to.  Ignored with a status
    /// message unless the session is `Disconnected`.
    pub async fn connect(&self, peripheral: Arc<dyn BlePeripheral>) {
        if self
            .commands
            .send(SessionCommand::Connect(peripheral))
            .await
            .is_err()
        {
            warn!("session task is gone; connect dropped");
        }
    }

    /// Requests a graceful disconnect.  No-op if already `Disconnected`.
    pub async fn disconnect(&self) {
        if self.commands.send(SessionCommand::Disconnect).await.is_err() {
            warn!("session task is gone; disconnect dropped");
        }
    }

    /// Empties the message log.
    pub async fn clear_messages(&self) {
        if self
            .commands
            .send(SessionCommand::ClearMessages)
            .await
            .is_err()
        {
            warn!("session task is gone; clear dropped");
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Current human-readable status line.
    pub fn status(&self) -> String {
        self.status.borrow().clone()
    }

    /// Snapshot of the message log, newest first.
    pub fn messages(&self) -> MessageLog {
        self.log.borrow().clone()
    }

    /// Watch receiver notified on every state transition.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Watch receiver notified on every status-line change.
    pub fn watch_status(&self) -> watch::Receiver<String> {
        self.status.clone()
    }

    /// Watch receiver notified on every log mutation.
    pub fn watch_log(&self) -> watch::Receiver<MessageLog> {
        self.log.clone()
    }
}

/// The session state machine task.
pub struct SessionManager {
    config: SessionConfig,
    bridge: VisibilityBridge,
    commands: mpsc::Receiver<SessionCommand>,
    inputs_tx: mpsc::Sender<SessionInput>,
    inputs: mpsc::Receiver<SessionInput>,
    state_tx: watch::Sender<SessionState>,
    status_tx: watch::Sender<String>,
    log_tx: watch::Sender<MessageLog>,
    state: SessionState,
    log: MessageLog,
    generation: u64,
    peripheral: Option<Arc<dyn BlePeripheral>>,
    subscription: Option<ActiveSubscription>,
    connect_task: Option<JoinHandle<()>>,
    listener_task: Option<JoinHandle<()>>,
    payload_task: Option<JoinHandle<()>>,
}

impl SessionManager {
    /// Spawns the session task and returns the handle to it.
    ///
    /// Must be called from within a Tokio runtime.  The task exits when the
    /// last clone of the handle is dropped, tearing down whatever session
    /// is still active.
    pub fn spawn(config: SessionConfig, keepalive: Arc<dyn Keepalive>) -> SessionHandle {
        let (commands_tx, commands_rx) = mpsc::channel(16);
        let (inputs_tx, inputs_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(SessionState::Disconnected);
        let (status_tx, status_rx) = watch::channel("Disconnected".to_string());
        let (log_tx, log_rx) = watch::channel(MessageLog::new());

        let manager = Self {
            config,
            bridge: VisibilityBridge::new(keepalive),
            commands: commands_rx,
            inputs_tx,
            inputs: inputs_rx,
            state_tx,
            status_tx,
            log_tx,
            state: SessionState::Disconnected,
            log: MessageLog::new(),
            generation: 0,
            peripheral: None,
            subscription: None,
            connect_task: None,
            listener_task: None,
            payload_task: None,
        };
        tokio::spawn(manager.run());

        SessionHandle {
            commands: commands_tx,
            state: state_rx,
            status: status_rx,
            log: log_rx,
        }
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Connect(peripheral)) => {
                        self.handle_connect(peripheral).await;
                    }
                    Some(SessionCommand::Disconnect) => self.handle_disconnect().await,
                    Some(SessionCommand::ClearMessages) => self.handle_clear(),
                    None => break,
                },
                Some(input) = self.inputs.recv() => self.handle_input(input).await,
            }
        }
        // Every handle is gone; release whatever the last session held.
        self.teardown("Disconnected").await;
    }

    // ── Command handling ──────────────────────────────────────────────────────

    async fn handle_connect(&mut self, peripheral: Arc<dyn BlePeripheral>) {
        if self.state != SessionState::Disconnected {
            warn!(state = ?self.state, "connect ignored: session already active");
            self.set_status("Already connected; disconnect first");
            return;
        }

        self.generation += 1;
        let generation = self.generation;

        info!(peripheral = %peripheral.name(), "connecting");
        self.peripheral = Some(Arc::clone(&peripheral));
        self.set_state(SessionState::Connecting);
        self.set_status("Connecting…");

        // The disconnect listener must be live before the connect call is
        // issued; a disconnect racing with establishment is never missed.
        let events = match peripheral.events().await {
            Ok(stream) => stream,
            Err(e) => {
                let err = SessionError::ConnectRejected(e.to_string());
                warn!(error = %err, "could not watch connection state");
                self.teardown(&err.to_string()).await;
                return;
            }
        };
        self.listener_task = Some(tokio::spawn(forward_link_events(
            events,
            generation,
            self.inputs_tx.clone(),
        )));

        self.connect_task = Some(tokio::spawn(drive_connect(
            peripheral,
            self.config.connect_timeout,
            generation,
            self.inputs_tx.clone(),
        )));
    }

    async fn handle_disconnect(&mut self) {
        if self.state == SessionState::Disconnected {
            debug!("disconnect ignored: already disconnected");
            return;
        }
        info!("disconnecting");
        self.teardown("Disconnected").await;
    }

    fn handle_clear(&mut self) {
        self.log.clear();
        self.publish_log();
    }

    // ── Internal input handling ───────────────────────────────────────────────

    async fn handle_input(&mut self, input: SessionInput) {
        match input {
            SessionInput::LinkUp { generation } => {
                if generation != self.generation {
                    debug!("discarding stale link-up");
                    return;
                }
                self.set_state(SessionState::Connected);
                self.set_status("Connected");
            }

            SessionInput::LinkReady { generation, result } => {
                if generation != self.generation {
                    debug!("discarding stale connect completion");
                    return;
                }
                match result {
                    Ok(link) => {
                        info!(characteristic = %link.characteristic, "subscribed to data channel");
                        self.subscription = Some(ActiveSubscription {
                            characteristic: link.characteristic,
                        });
                        self.payload_task = Some(tokio::spawn(forward_payloads(
                            link.payloads,
                            generation,
                            self.inputs_tx.clone(),
                        )));
                    }
                    Err(e) => {
                        warn!(error = %e, "connect sequence failed");
                        self.teardown(&e.to_string()).await;
                    }
                }
            }

            SessionInput::LinkEvent { generation, event } => {
                if generation != self.generation {
                    debug!("discarding stale link event");
                    return;
                }
                match event {
                    PeripheralEvent::Disconnected => {
                        if self.state == SessionState::Disconnected {
                            return;
                        }
                        info!("peripheral disconnected unexpectedly");
                        self.teardown("Connection lost").await;
                    }
                }
            }

            SessionInput::Payload { generation, bytes } => {
                if generation != self.generation || self.state != SessionState::Connected {
                    return;
                }
                if let Some(text) = pipeline::decode_payload(&bytes) {
                    let entry = MessageEntry::new(text);
                    self.bridge.on_message(&entry.text);
                    self.log.append(entry);
                    self.publish_log();
                }
            }

            SessionInput::PayloadStreamEnded { generation } => {
                if generation != self.generation || self.state != SessionState::Connected {
                    return;
                }
                let err = SessionError::StreamError("notification stream ended".to_string());
                warn!("{err}");
                // A stream fault is a status condition, not a disconnect;
                // only the connection-state listener tears the session down.
                self.set_status(&err.to_string());
            }
        }
    }

    // ── Teardown ──────────────────────────────────────────────────────────────

    /// Tears the current session down to `Disconnected` and publishes
    /// `status` as the final status line.
    ///
    /// Safe at every point of the lifecycle, including when some resources
    /// were never established, and safe to run repeatedly.
    async fn teardown(&mut self, status: &str) {
        // Invalidate in-flight completions before touching any resource.
        self.generation += 1;

        for task in [
            self.connect_task.take(),
            self.payload_task.take(),
            self.listener_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }

        if let Some(peripheral) = self.peripheral.take() {
            if let Some(subscription) = self.subscription.take() {
                if let Err(e) = peripheral.unsubscribe(subscription.characteristic).await {
                    debug!(error = %e, "unsubscribe during teardown failed");
                }
            }
            // Best-effort close: failures are logged, never propagated, and
            // teardown always completes.
            if let Err(e) = peripheral.disconnect().await {
                warn!(error = %e, "transport close failed during teardown");
            }
        }
        self.subscription = None;

        self.set_state(SessionState::Disconnected);
        self.set_status(status);
    }

    // ── Publication ───────────────────────────────────────────────────────────

    fn set_state(&mut self, state: SessionState) {
        self.state = state;
        self.bridge.on_state(state);
        self.state_tx.send_replace(state);
    }

    fn set_status(&mut self, status: &str) {
        debug!(status, "status line");
        self.status_tx.send_replace(status.to_string());
    }

    fn publish_log(&mut self) {
        self.log_tx.send_replace(self.log.clone());
    }
}

// ── Helper tasks (one set per connect attempt) ────────────────────────────────

/// Drives the connect sequence: bounded connect, then discovery, channel
/// selection, and subscription.  Reports link-up as soon as the transport is
/// up and the full result when the sequence finishes.
async fn drive_connect(
    peripheral: Arc<dyn BlePeripheral>,
    connect_timeout: Duration,
    generation: u64,
    inputs: mpsc::Sender<SessionInput>,
) {
    match timeout(connect_timeout, peripheral.connect()).await {
        Err(_) => {
            let result = Err(SessionError::ConnectTimeout(connect_timeout.as_secs()));
            let _ = inputs
                .send(SessionInput::LinkReady { generation, result })
                .await;
            return;
        }
        Ok(Err(e)) => {
            let result = Err(SessionError::ConnectRejected(e.to_string()));
            let _ = inputs
                .send(SessionInput::LinkReady { generation, result })
                .await;
            return;
        }
        Ok(Ok(())) => {
            let _ = inputs.send(SessionInput::LinkUp { generation }).await;
        }
    }

    let result = establish_subscription(peripheral.as_ref()).await;
    let _ = inputs
        .send(SessionInput::LinkReady { generation, result })
        .await;
}

/// Discovery, channel selection, and subscription, in sequence.
async fn establish_subscription(
    peripheral: &dyn BlePeripheral,
) -> Result<EstablishedLink, SessionError> {
    let services = peripheral
        .discover_services()
        .await
        .map_err(|e| SessionError::DiscoveryFailed(e.to_string()))?;
    let characteristic = select_data_channel(&services)?.uuid;
    let payloads = pipeline::open_subscription(peripheral, characteristic).await?;
    Ok(EstablishedLink {
        characteristic,
        payloads,
    })
}

/// Relays unsolicited connection-state events into the session task.
async fn forward_link_events(
    mut events: EventStream,
    generation: u64,
    inputs: mpsc::Sender<SessionInput>,
) {
    while let Some(event) = events.next().await {
        if inputs
            .send(SessionInput::LinkEvent { generation, event })
            .await
            .is_err()
        {
            return;
        }
    }
}

/// Relays raw payloads into the session task and reports stream end.
async fn forward_payloads(
    mut payloads: PayloadStream,
    generation: u64,
    inputs: mpsc::Sender<SessionInput>,
) {
    while let Some(bytes) = payloads.next().await {
        if inputs
            .send(SessionInput::Payload { generation, bytes })
            .await
            .is_err()
        {
            return;
        }
    }
    let _ = inputs
        .send(SessionInput::PayloadStreamEnded { generation })
        .await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────
