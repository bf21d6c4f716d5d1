//! REST client for the audio node, plus the collaborator traits the
//! playback sessions are written against.

use async_trait::async_trait;
use reqwest::{Client, Error as ReqwestError, Response};
use std::error::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::models::{
    ChannelId, LoadResult, PlayableTrack, TenantId, TrackDescriptor, UpdatePlayerBody,
    VoiceHandle, VoiceServerInfo,
};

const CLIENT_LOG_TARGET: &str = "radiola::node::client";

/// Error types for audio node operations
#[derive(Debug)]
pub enum NodeError {
    Network(ReqwestError),
    InvalidResponse(String),
    /// The node has not completed its websocket handshake yet, so player
    /// endpoints cannot be addressed.
    NotReady,
    /// The node resolved the request but reported a load failure.
    Load(String),
    WebSocket(String),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::Network(e) => write!(f, "Network error: {}", e),
            NodeError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            NodeError::NotReady => write!(f, "Audio node session is not ready"),
            NodeError::Load(msg) => write!(f, "Load failed: {}", msg),
            NodeError::WebSocket(msg) => write!(f, "WebSocket error: {}", msg),
        }
    }
}

impl Error for NodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NodeError::Network(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReqwestError> for NodeError {
    fn from(err: ReqwestError) -> Self {
        NodeError::Network(err)
    }
}

/// Search source the node should resolve free-text queries against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSource {
    SoundCloud,
    YouTube,
}

impl SearchSource {
    fn prefix(&self) -> &'static str {
        match self {
            SearchSource::SoundCloud => "scsearch",
            SearchSource::YouTube => "ytsearch",
        }
    }
}

impl fmt::Display for SearchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchSource::SoundCloud => write!(f, "soundcloud"),
            SearchSource::YouTube => write!(f, "youtube"),
        }
    }
}

impl FromStr for SearchSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "soundcloud" | "sc" => Ok(SearchSource::SoundCloud),
            "youtube" | "yt" => Ok(SearchSource::YouTube),
            other => Err(format!("unknown search source: {}", other)),
        }
    }
}

/// Commands the playback sessions issue to the audio node.
#[async_trait]
pub trait AudioNodeApi: Send + Sync {
    /// Binds a tenant's player to a voice channel, creating the player on
    /// the node if it does not exist yet.
    async fn connect(&self, tenant: TenantId, channel: ChannelId) -> Result<VoiceHandle, NodeError>;

    /// Starts playing the given track on the tenant's player, replacing
    /// whatever was loaded before.
    async fn play(&self, tenant: TenantId, track: &TrackDescriptor) -> Result<(), NodeError>;

    async fn set_paused(&self, tenant: TenantId, paused: bool) -> Result<(), NodeError>;

    /// Clears the tenant's player, cutting the current track short. The node
    /// answers with a track-end event carrying a `stopped` reason.
    async fn force_stop(&self, tenant: TenantId) -> Result<(), NodeError>;

    /// Destroys the tenant's player on the node.
    async fn disconnect(&self, tenant: TenantId) -> Result<(), NodeError>;

    /// Relays voice transport credentials from the chat gateway.
    async fn update_voice(&self, tenant: TenantId, voice: VoiceServerInfo)
        -> Result<(), NodeError>;
}

/// Free-text track search, resolved remotely by the node.
#[async_trait]
pub trait TrackSearchGateway: Send + Sync {
    /// Returns an ordered list of matching tracks; an empty list means the
    /// query produced no results.
    async fn search(
        &self,
        query: &str,
        source: Option<SearchSource>,
    ) -> Result<Vec<TrackDescriptor>, NodeError>;
}

/// Builds the identifier string the node's load endpoint understands:
/// direct URLs pass through untouched, anything else gets a search prefix.
pub(crate) fn search_identifier(query: &str, source: Option<SearchSource>) -> String {
    if query.starts_with("http://") || query.starts_with("https://") {
        query.to_string()
    } else {
        let source = source.unwrap_or(SearchSource::SoundCloud);
        format!("{}:{}", source.prefix(), query)
    }
}

/// Client for the audio node's REST surface
#[derive(Clone)]
pub struct NodeClient {
    client: Client,
    http_base: String,
    ws_url: String,
    password: String,
    user_id: u64,
    /// Session id assigned by the node in its `ready` frame; player
    /// endpoints are addressed through it.
    session_id: Arc<RwLock<Option<String>>>,
}

impl NodeClient {
    /// Create a new client for a node at `host:port`.
    pub fn new(server_addr: &str, password: &str) -> Self {
        let addr = server_addr
            .trim_start_matches("http://")
            .trim_start_matches("ws://")
            .trim_end_matches('/');

        let client = match Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(target: CLIENT_LOG_TARGET,
                    "Error creating HTTP client with timeout: {:?}. Falling back to default.", e);
                Client::new()
            }
        };

        NodeClient {
            client,
            http_base: format!("http://{}", addr),
            ws_url: format!("ws://{}/v4/websocket", addr),
            password: password.to_string(),
            user_id: 0,
            session_id: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the bot user id announced to the node on the websocket handshake.
    pub fn with_user_id(mut self, user_id: u64) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn http_base(&self) -> &str {
        &self.http_base
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Identity sent in the `Client-Name` handshake header.
    pub fn client_name(&self) -> String {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown-host".to_string());
        format!("radiola/{} ({})", env!("CARGO_PKG_VERSION"), host)
    }

    pub(crate) async fn set_session_id(&self, session_id: String) {
        *self.session_id.write().await = Some(session_id);
    }

    pub async fn session_id(&self) -> Option<String> {
        self.session_id.read().await.clone()
    }

    async fn check(response: Response, context: &str) -> Result<Response, NodeError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NodeError::InvalidResponse(format!(
                "{}: HTTP {} {}",
                context, status, body
            )))
        }
    }

    /// Resolves an identifier into tracks via the node's load endpoint.
    async fn load(&self, identifier: &str) -> Result<Vec<TrackDescriptor>, NodeError> {
        let url = format!(
            "{}/v4/loadtracks?identifier={}",
            self.http_base,
            urlencoding::encode(identifier)
        );
        debug!(target: CLIENT_LOG_TARGET, "Loading tracks: {}", identifier);

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.password)
            .send()
            .await?;
        let result: LoadResult = Self::check(response, "loadtracks").await?.json().await?;

        result
            .into_tracks()
            .map_err(|failure| NodeError::Load(failure.to_string()))
    }

    async fn player_url(&self, tenant: TenantId) -> Result<String, NodeError> {
        let session_id = self.session_id().await.ok_or(NodeError::NotReady)?;
        Ok(format!(
            "{}/v4/sessions/{}/players/{}",
            self.http_base, session_id, tenant
        ))
    }

    async fn update_player(
        &self,
        tenant: TenantId,
        body: UpdatePlayerBody,
    ) -> Result<(), NodeError> {
        let url = self.player_url(tenant).await?;
        let response = self
            .client
            .patch(&url)
            .header("Authorization", &self.password)
            .json(&body)
            .send()
            .await?;
        Self::check(response, "update player").await?;
        Ok(())
    }
}

#[async_trait]
impl AudioNodeApi for NodeClient {
    async fn connect(&self, tenant: TenantId, channel: ChannelId) -> Result<VoiceHandle, NodeError> {
        debug!(target: CLIENT_LOG_TARGET, "Connecting tenant {} to channel {}", tenant, channel);
        self.update_player(tenant, UpdatePlayerBody::default()).await?;
        Ok(VoiceHandle { channel })
    }

    async fn play(&self, tenant: TenantId, track: &TrackDescriptor) -> Result<(), NodeError> {
        self.update_player(
            tenant,
            UpdatePlayerBody {
                track: Some(PlayableTrack {
                    encoded: Some(track.encoded.clone()),
                }),
                ..Default::default()
            },
        )
        .await
    }

    async fn set_paused(&self, tenant: TenantId, paused: bool) -> Result<(), NodeError> {
        self.update_player(
            tenant,
            UpdatePlayerBody {
                paused: Some(paused),
                ..Default::default()
            },
        )
        .await
    }

    async fn force_stop(&self, tenant: TenantId) -> Result<(), NodeError> {
        self.update_player(
            tenant,
            UpdatePlayerBody {
                track: Some(PlayableTrack { encoded: None }),
                ..Default::default()
            },
        )
        .await
    }

    async fn disconnect(&self, tenant: TenantId) -> Result<(), NodeError> {
        let url = self.player_url(tenant).await?;
        let response = self
            .client
            .delete(&url)
            .header("Authorization", &self.password)
            .send()
            .await?;
        Self::check(response, "destroy player").await?;
        Ok(())
    }

    async fn update_voice(
        &self,
        tenant: TenantId,
        voice: VoiceServerInfo,
    ) -> Result<(), NodeError> {
        self.update_player(
            tenant,
            UpdatePlayerBody {
                voice: Some(voice),
                ..Default::default()
            },
        )
        .await
    }
}

#[async_trait]
impl TrackSearchGateway for NodeClient {
    async fn search(
        &self,
        query: &str,
        source: Option<SearchSource>,
    ) -> Result<Vec<TrackDescriptor>, NodeError> {
        self.load(&search_identifier(query, source)).await
    }
}
