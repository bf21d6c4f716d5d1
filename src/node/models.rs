//! Data models for the audio node wire protocol

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one voice-enabled community. Every tenant gets its own
/// playback session; sessions never share state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub u64);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A voice channel inside a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a voice connection owned by the audio node. The session keeps
/// this around so commands can be routed to the right channel; the node owns
/// the actual transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceHandle {
    pub channel: ChannelId,
}

/// Immutable metadata for one playable item, as resolved by the node.
///
/// `encoded` is an opaque token the node hands back from a load request and
/// accepts again in play requests. Everything human-readable lives in `info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub encoded: String,
    pub info: TrackInfo,
}

/// Human-readable metadata for a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    /// Unique identifier within the source provider.
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    /// Track length in milliseconds. The node reports a placeholder for
    /// live streams; see [`TrackDescriptor::duration_ms`].
    pub length: u64,
    #[serde(default)]
    pub is_stream: bool,
    #[serde(default)]
    pub uri: Option<String>,
    pub source_name: String,
}

impl TrackDescriptor {
    /// Duration in milliseconds, or `None` when unknown (live streams).
    pub fn duration_ms(&self) -> Option<u64> {
        if self.info.is_stream {
            None
        } else {
            Some(self.info.length)
        }
    }

    pub fn title(&self) -> &str {
        &self.info.title
    }
}

/// Result of asking the node to resolve an identifier (URL or search term).
///
/// The wire `data` payload is polymorphic over `loadType`, so it is kept
/// raw here and flattened with [`LoadResult::into_tracks`].
#[derive(Debug, Deserialize)]
pub struct LoadResult {
    #[serde(rename = "loadType")]
    pub load_type: LoadType,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadType {
    Track,
    Playlist,
    Search,
    Empty,
    Error,
}

/// Node-reported failure while resolving an identifier.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadFailure {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.message, &self.severity) {
            (Some(m), Some(s)) => write!(f, "{} ({})", m, s),
            (Some(m), None) => write!(f, "{}", m),
            _ => write!(f, "unspecified load failure"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PlaylistData {
    tracks: Vec<TrackDescriptor>,
}

impl LoadResult {
    /// Flattens the polymorphic payload into an ordered track list.
    ///
    /// `Empty` yields an empty list; `Error` carries the node's own message.
    pub fn into_tracks(self) -> Result<Vec<TrackDescriptor>, LoadFailure> {
        match self.load_type {
            LoadType::Track => serde_json::from_value::<TrackDescriptor>(self.data)
                .map(|t| vec![t])
                .map_err(|e| LoadFailure {
                    message: Some(format!("malformed track payload: {}", e)),
                    severity: None,
                }),
            LoadType::Search => serde_json::from_value::<Vec<TrackDescriptor>>(self.data)
                .map_err(|e| LoadFailure {
                    message: Some(format!("malformed search payload: {}", e)),
                    severity: None,
                }),
            LoadType::Playlist => serde_json::from_value::<PlaylistData>(self.data)
                .map(|p| p.tracks)
                .map_err(|e| LoadFailure {
                    message: Some(format!("malformed playlist payload: {}", e)),
                    severity: None,
                }),
            LoadType::Empty => Ok(Vec::new()),
            LoadType::Error => Err(serde_json::from_value::<LoadFailure>(self.data)
                .unwrap_or(LoadFailure {
                    message: None,
                    severity: None,
                })),
        }
    }
}

// --- Outgoing player request bodies ---

/// Body of a player update request. Absent fields are left untouched by the
/// node, so each command patches only what it needs.
#[derive(Debug, Default, Serialize)]
pub struct UpdatePlayerBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<PlayableTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<VoiceServerInfo>,
}

/// Track slot of a player update. `encoded: None` clears the player,
/// force-stopping whatever is playing.
#[derive(Debug, Serialize)]
pub struct PlayableTrack {
    pub encoded: Option<String>,
}

/// Voice transport credentials relayed from the chat gateway to the node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceServerInfo {
    pub token: String,
    pub endpoint: String,
    pub session_id: String,
}

/// Periodic player state pushed by the node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    #[serde(default)]
    pub position: u64,
    #[serde(default)]
    pub connected: bool,
}
