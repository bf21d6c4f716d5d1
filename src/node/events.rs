//! Lifecycle events delivered by the audio node

use super::models::{PlayerState, TrackDescriptor};

/// Why a track stopped playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The track ran to its natural end. This is the only reason that can
    /// trigger autoplay seeding.
    Finished,
    /// Playback was cut short on request (skip, replacement, teardown).
    Stopped,
    /// The node gave up on a track that stopped making progress.
    Stuck,
    /// The node failed to play the track.
    Exception,
}

impl EndReason {
    /// Maps the node's wire reasons onto the four the session cares about.
    /// `replaced` and `cleanup` behave exactly like an explicit stop.
    pub fn from_wire(reason: &str) -> Self {
        match reason {
            "finished" => EndReason::Finished,
            "stopped" | "replaced" | "cleanup" => EndReason::Stopped,
            "loadFailed" => EndReason::Exception,
            _ => EndReason::Stopped,
        }
    }
}

/// A tenant-scoped event from the audio node, routed into that tenant's
/// playback session.
#[derive(Debug, Clone)]
pub enum NodeEvent {
    /// A track began playing. Informational only.
    TrackStarted(TrackDescriptor),
    /// A track stopped playing; the single trigger for queue advancement.
    TrackEnded {
        track: TrackDescriptor,
        reason: EndReason,
    },
    /// The node detected a track that stopped making progress.
    TrackStuck {
        track: TrackDescriptor,
        threshold_ms: u64,
    },
    /// The node hit an error while playing a track.
    TrackException {
        track: TrackDescriptor,
        message: String,
    },
    /// Periodic position/connection report for the tenant's player.
    PlayerUpdate(PlayerState),
    /// The tenant's voice websocket on the node closed.
    WebsocketClosed { code: u16, reason: String },
}
