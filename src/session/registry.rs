//! Process-wide mapping from tenant to running playback session.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{PlaybackSession, SessionHandle, SESSION_LOG_TARGET};
use crate::node::client::{AudioNodeApi, SearchSource, TrackSearchGateway};
use crate::node::events::NodeEvent;
use crate::node::models::{TenantId, VoiceHandle};

const UPDATE_CHANNEL_CAPACITY: usize = 16;
const COMMAND_BUFFER_SIZE: usize = 32;

/// Holds at most one session per tenant and routes node events to them.
///
/// The internal lock guards map access only and is never held across I/O;
/// anything slow (voice connect, search) happens before or after the
/// registry is touched.
pub struct SessionRegistry {
    node: Arc<dyn AudioNodeApi>,
    search: Arc<dyn TrackSearchGateway>,
    search_source: Option<SearchSource>,
    sessions: Mutex<HashMap<TenantId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new(
        node: Arc<dyn AudioNodeApi>,
        search: Arc<dyn TrackSearchGateway>,
        search_source: Option<SearchSource>,
    ) -> Self {
        SessionRegistry {
            node,
            search,
            search_source,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, tenant: TenantId) -> Option<SessionHandle> {
        self.sessions.lock().await.get(&tenant).cloned()
    }

    /// Returns the tenant's session, creating and spawning one bound to
    /// `voice` if absent. When two creates race, the incumbent wins and
    /// both callers get the same handle.
    pub async fn get_or_create(&self, tenant: TenantId, voice: VoiceHandle) -> SessionHandle {
        let mut sessions = self.sessions.lock().await;
        if let Some(handle) = sessions.get(&tenant) {
            return handle.clone();
        }

        let (session, handle) = PlaybackSession::new(
            tenant,
            voice,
            self.node.clone(),
            self.search.clone(),
            self.search_source,
            UPDATE_CHANNEL_CAPACITY,
            COMMAND_BUFFER_SIZE,
        );
        tokio::spawn(session.run());
        sessions.insert(tenant, handle.clone());
        info!(target: SESSION_LOG_TARGET, "Created playback session for tenant {}.", tenant);
        handle
    }

    /// Detaches and returns the tenant's session. The caller decides what
    /// to do with the handle (normally: ask it to shut down).
    pub async fn remove(&self, tenant: TenantId) -> Option<SessionHandle> {
        let removed = self.sessions.lock().await.remove(&tenant);
        if removed.is_some() {
            info!(target: SESSION_LOG_TARGET, "Removed playback session for tenant {}.", tenant);
        }
        removed
    }

    /// Routes a node event to the owning session. Events for tenants
    /// without a session (typically: delivered after a stop) are dropped
    /// without complaint.
    pub async fn dispatch_event(&self, tenant: TenantId, event: NodeEvent) {
        match self.get(tenant).await {
            Some(handle) => {
                if !handle.deliver_event(event).await {
                    debug!(target: SESSION_LOG_TARGET,
                        "Session mailbox for tenant {} is closed; event dropped.", tenant);
                }
            }
            None => {
                debug!(target: SESSION_LOG_TARGET,
                    "Event for tenant {} without a session; ignored.", tenant);
            }
        }
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
