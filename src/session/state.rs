//! Session states, mailbox commands and broadcast updates.

use crate::commands::CommandError;
use crate::node::events::NodeEvent;
use crate::node::models::TrackDescriptor;
use tokio::sync::oneshot;

/// What a tenant's player is doing right now.
///
/// The paused flag only exists together with a current track, so the
/// invalid "paused while idle" combination cannot be represented.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackState {
    Idle,
    Playing { track: TrackDescriptor },
    Paused { track: TrackDescriptor },
}

impl PlaybackState {
    pub fn current_track(&self) -> Option<&TrackDescriptor> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Playing { track } | PlaybackState::Paused { track } => Some(track),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, PlaybackState::Idle)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, PlaybackState::Paused { .. })
    }
}

/// Result of a play request.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayOutcome {
    /// Nothing was playing; the track started immediately.
    Started(TrackDescriptor),
    /// Something was already playing; the track was queued at `position`
    /// (1-based).
    Queued {
        track: TrackDescriptor,
        position: usize,
    },
}

/// Result of a skip request. The actual advance happens when the node
/// reports the track end.
#[derive(Debug, Clone, PartialEq)]
pub struct SkipOutcome {
    pub skipped: TrackDescriptor,
    /// Tracks still waiting in the queue at the time of the skip.
    pub remaining: usize,
}

/// Result of starting radio mode.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioOutcome {
    pub now_playing: Option<TrackDescriptor>,
    pub queued: usize,
}

/// Point-in-time view of a session, for display.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    /// Up to the first ten queued tracks.
    pub upcoming: Vec<TrackDescriptor>,
    pub queue_len: usize,
    pub autoplay: bool,
    /// Last position the node reported for the current track.
    pub position_ms: u64,
}

/// Commands processed by the session task. Everything that can mutate the
/// queue or the state goes through this mailbox.
#[derive(Debug)]
pub enum SessionCommand {
    Play {
        track: TrackDescriptor,
        respond: oneshot::Sender<Result<PlayOutcome, CommandError>>,
    },
    Pause {
        respond: oneshot::Sender<Result<(), CommandError>>,
    },
    Resume {
        respond: oneshot::Sender<Result<(), CommandError>>,
    },
    Skip {
        respond: oneshot::Sender<Result<SkipOutcome, CommandError>>,
    },
    /// Flips the autoplay flag and answers with the new value.
    ToggleAutoplay {
        respond: oneshot::Sender<bool>,
    },
    /// Replaces the queue with a fresh radio seed and enables autoplay.
    StartRadio {
        tracks: Vec<TrackDescriptor>,
        respond: oneshot::Sender<Result<RadioOutcome, CommandError>>,
    },
    Snapshot {
        respond: oneshot::Sender<SessionSnapshot>,
    },
    /// A lifecycle event from the audio node, routed by the registry.
    Node(NodeEvent),
    /// Tears the session down: autoplay off, queue dropped, node player
    /// destroyed.
    Shutdown,
}

/// Updates broadcast by the session task about its state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Started(TrackDescriptor),
    Queued {
        track: TrackDescriptor,
        position: usize,
    },
    /// The autoplay seeder queued a recommendation.
    Seeded(TrackDescriptor),
    Idle,
    Closed,
}
