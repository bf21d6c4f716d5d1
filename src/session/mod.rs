//! Per-tenant playback sessions.
//!
//! Each tenant gets one [`PlaybackSession`] running as its own task. Every
//! mutation of the session's queue or state flows through the task's
//! mailbox, so chat commands and node lifecycle events for the same tenant
//! interleave but never overlap. Tenants are fully independent of each
//! other.

use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::commands::CommandError;
use crate::node::client::{AudioNodeApi, SearchSource, TrackSearchGateway};
use crate::node::events::NodeEvent;
use crate::node::models::{ChannelId, TenantId, TrackDescriptor, VoiceHandle};

mod autoplay;
mod command_handler;
pub mod queue;
pub mod registry;
mod run_loop;
pub mod state;

pub use queue::{EmptyQueue, TrackQueue};
pub use registry::SessionRegistry;
pub use state::{
    PlayOutcome, PlaybackState, RadioOutcome, SessionCommand, SessionSnapshot, SessionUpdate,
    SkipOutcome,
};

pub(crate) const SESSION_LOG_TARGET: &str = "radiola::session";

/// Owns one tenant's playback state: the current track, the queue, and the
/// autoplay flag. Run as a dedicated task via [`PlaybackSession::run`].
pub struct PlaybackSession {
    tenant: TenantId,
    /// Stable id for correlating this session's log lines.
    session_uid: Uuid,
    voice: VoiceHandle,
    node: Arc<dyn AudioNodeApi>,
    search: Arc<dyn TrackSearchGateway>,
    search_source: Option<SearchSource>,

    state: PlaybackState,
    queue: TrackQueue,
    autoplay: bool,
    /// The most recently ended track; the autoplay seeder derives its
    /// search terms from this.
    last_played: Option<TrackDescriptor>,
    /// Last position the node reported for the current track.
    position_ms: u64,

    command_rx: mpsc::Receiver<SessionCommand>,
    update_tx: broadcast::Sender<SessionUpdate>,
}

impl PlaybackSession {
    /// Creates a session and the handle used to talk to it. The session
    /// itself must be run as a task via [`PlaybackSession::run`].
    pub fn new(
        tenant: TenantId,
        voice: VoiceHandle,
        node: Arc<dyn AudioNodeApi>,
        search: Arc<dyn TrackSearchGateway>,
        search_source: Option<SearchSource>,
        update_capacity: usize,
        command_buffer_size: usize,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(command_buffer_size);
        let (update_tx, _) = broadcast::channel(update_capacity);

        let session = PlaybackSession {
            tenant,
            session_uid: Uuid::new_v4(),
            voice,
            node,
            search,
            search_source,
            state: PlaybackState::Idle,
            queue: TrackQueue::new(),
            autoplay: false,
            last_played: None,
            position_ms: 0,
            command_rx,
            update_tx: update_tx.clone(),
        };

        let handle = SessionHandle {
            tenant,
            voice_channel: session.voice.channel,
            command_tx,
            update_tx,
        };

        (session, handle)
    }

    /// Sends a state update via the broadcast channel, logging when nobody
    /// is listening.
    fn broadcast_update(&self, update: SessionUpdate) {
        trace!(target: SESSION_LOG_TARGET, "Broadcasting update: {:?}", update);
        if self.update_tx.send(update.clone()).is_err() {
            debug!(target: SESSION_LOG_TARGET, "No active listeners for update: {:?}", update);
        }
    }

    /// Runs the session's command processing loop. Spawn this as a task.
    #[instrument(skip(self), fields(tenant = %self.tenant, session_uid = %self.session_uid))]
    pub async fn run(mut self) {
        run_loop::run_session_loop(&mut self).await;
    }
}

/// Cheap, cloneable address of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tenant: TenantId,
    voice_channel: ChannelId,
    command_tx: mpsc::Sender<SessionCommand>,
    update_tx: broadcast::Sender<SessionUpdate>,
}

impl SessionHandle {
    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    /// The voice channel this session was bound to at creation.
    pub fn voice_channel(&self) -> ChannelId {
        self.voice_channel
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<SessionUpdate> {
        self.update_tx.subscribe()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, CommandError> {
        let (respond, response) = oneshot::channel();
        self.command_tx
            .send(build(respond))
            .await
            .map_err(|_| CommandError::NotConnected)?;
        response.await.map_err(|_| CommandError::NotConnected)
    }

    pub async fn play(&self, track: TrackDescriptor) -> Result<PlayOutcome, CommandError> {
        self.request(move |respond| SessionCommand::Play { track, respond })
            .await?
    }

    pub async fn pause(&self) -> Result<(), CommandError> {
        self.request(|respond| SessionCommand::Pause { respond })
            .await?
    }

    pub async fn resume(&self) -> Result<(), CommandError> {
        self.request(|respond| SessionCommand::Resume { respond })
            .await?
    }

    pub async fn skip(&self) -> Result<SkipOutcome, CommandError> {
        self.request(|respond| SessionCommand::Skip { respond })
            .await?
    }

    /// Flips the autoplay flag; answers with the new value.
    pub async fn toggle_autoplay(&self) -> Result<bool, CommandError> {
        self.request(|respond| SessionCommand::ToggleAutoplay { respond })
            .await
    }

    pub async fn start_radio(
        &self,
        tracks: Vec<TrackDescriptor>,
    ) -> Result<RadioOutcome, CommandError> {
        self.request(move |respond| SessionCommand::StartRadio { tracks, respond })
            .await?
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, CommandError> {
        self.request(|respond| SessionCommand::Snapshot { respond })
            .await
    }

    /// Asks the session to tear itself down. Safe to call on a session
    /// that already exited.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(SessionCommand::Shutdown).await;
    }

    /// Delivers a node event into the mailbox. Returns `false` when the
    /// session task is gone.
    pub(crate) async fn deliver_event(&self, event: NodeEvent) -> bool {
        self.command_tx.send(SessionCommand::Node(event)).await.is_ok()
    }
}
