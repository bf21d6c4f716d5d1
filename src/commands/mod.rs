//! Chat-gateway-facing command surface.
//!
//! The chat SDK (or the local console) resolves a tenant and the invoking
//! user's voice channel, then calls into [`Commands`]. Replies are plain
//! data; rendering them into messages is the caller's job.

use std::error::Error;
use std::fmt;

use crate::node::models::{ChannelId, TenantId, TrackDescriptor};
use crate::session::state::PlayOutcome;

mod handlers;

pub use handlers::Commands;

/// Per-invocation context resolved by the chat gateway.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext {
    pub tenant: TenantId,
    /// Voice channel the invoking user currently sits in, if any.
    pub user_voice_channel: Option<ChannelId>,
}

/// Typed command failures, rendered into user-facing messages by the
/// front end. Precondition failures never mutate any state.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// The invoking user is not in a voice channel.
    NoVoiceChannel,
    /// The invoking user is in a different channel than the session.
    WrongChannel,
    /// No playback session exists for the tenant.
    NotConnected,
    AlreadyPaused,
    NotPaused,
    NothingPlaying,
    /// Every search fallback came back empty.
    NoResults,
    /// Unexpected collaborator failure; the message is for logs, not users.
    Internal(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::NoVoiceChannel => write!(f, "You must be in a voice channel"),
            CommandError::WrongChannel => {
                write!(f, "You must be in the same voice channel as the player")
            }
            CommandError::NotConnected => write!(f, "Not connected to a voice channel"),
            CommandError::AlreadyPaused => write!(f, "Playback is already paused"),
            CommandError::NotPaused => write!(f, "Playback is not paused"),
            CommandError::NothingPlaying => write!(f, "Nothing is playing"),
            CommandError::NoResults => write!(f, "No results found"),
            CommandError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl Error for CommandError {}

/// Reply to a play command.
#[derive(Debug, Clone)]
pub struct PlayReply {
    pub outcome: PlayOutcome,
    /// Where the track came from ("direct url", "soundcloud", ...), for
    /// display.
    pub source: String,
}

/// Reply to a queue listing command.
#[derive(Debug, Clone)]
pub struct QueueReply {
    pub now_playing: Option<TrackDescriptor>,
    /// Up to the first ten queued tracks.
    pub upcoming: Vec<TrackDescriptor>,
    pub total: usize,
}

/// Reply to a now-playing command.
#[derive(Debug, Clone)]
pub struct NowPlayingReply {
    pub track: TrackDescriptor,
    pub position_ms: u64,
}

/// Reply to an autoplay toggle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoplayReply {
    pub enabled: bool,
}

/// Reply to a radio command.
#[derive(Debug, Clone)]
pub struct RadioReply {
    pub theme: String,
    pub now_playing: Option<TrackDescriptor>,
    pub queued: usize,
}
