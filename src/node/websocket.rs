//! Websocket listener translating node frames into [`NodeEvent`]s and
//! routing them to the owning tenant's session.

use futures_util::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use super::client::{NodeClient, NodeError};
use super::events::{EndReason, NodeEvent};
use super::models::{PlayerState, TenantId, TrackDescriptor};
use crate::session::SessionRegistry;

const WS_LOG_TARGET: &str = "radiola::node::websocket";

#[derive(Debug, Deserialize)]
struct OpFrame {
    op: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadyFrame {
    #[serde(default)]
    resumed: bool,
    session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerUpdateFrame {
    guild_id: String,
    state: PlayerState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExceptionInfo {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventFrame {
    #[serde(rename = "type")]
    kind: String,
    guild_id: String,
    #[serde(default)]
    track: Option<TrackDescriptor>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    threshold_ms: Option<u64>,
    #[serde(default)]
    exception: Option<ExceptionInfo>,
    #[serde(default)]
    code: Option<u16>,
}

/// Outcome of decoding one text frame.
#[derive(Debug)]
pub(crate) enum ParsedFrame {
    Ready { session_id: String, resumed: bool },
    Event { tenant: TenantId, event: NodeEvent },
    Ignored,
}

fn tenant_of(guild_id: &str) -> Option<TenantId> {
    match guild_id.parse::<u64>() {
        Ok(id) => Some(TenantId(id)),
        Err(_) => {
            warn!(target: WS_LOG_TARGET, "Unparseable guild id in frame: {}", guild_id);
            None
        }
    }
}

/// Decodes a node frame. Malformed or unknown frames are logged and mapped
/// to `Ignored`; the listener never dies over one bad message.
pub(crate) fn parse_frame(text: &str) -> ParsedFrame {
    let op = match serde_json::from_str::<OpFrame>(text) {
        Ok(frame) => frame.op,
        Err(e) => {
            warn!(target: WS_LOG_TARGET, "Frame without an op field: {}", e);
            return ParsedFrame::Ignored;
        }
    };

    match op.as_str() {
        "ready" => match serde_json::from_str::<ReadyFrame>(text) {
            Ok(frame) => ParsedFrame::Ready {
                session_id: frame.session_id,
                resumed: frame.resumed,
            },
            Err(e) => {
                warn!(target: WS_LOG_TARGET, "Malformed ready frame: {}", e);
                ParsedFrame::Ignored
            }
        },
        "playerUpdate" => match serde_json::from_str::<PlayerUpdateFrame>(text) {
            Ok(frame) => match tenant_of(&frame.guild_id) {
                Some(tenant) => ParsedFrame::Event {
                    tenant,
                    event: NodeEvent::PlayerUpdate(frame.state),
                },
                None => ParsedFrame::Ignored,
            },
            Err(e) => {
                warn!(target: WS_LOG_TARGET, "Malformed playerUpdate frame: {}", e);
                ParsedFrame::Ignored
            }
        },
        // Periodic node load statistics; nothing in the core consumes them.
        "stats" => ParsedFrame::Ignored,
        "event" => match serde_json::from_str::<EventFrame>(text) {
            Ok(frame) => parse_event_frame(frame),
            Err(e) => {
                warn!(target: WS_LOG_TARGET, "Malformed event frame: {}", e);
                ParsedFrame::Ignored
            }
        },
        other => {
            warn!(target: WS_LOG_TARGET, "Unknown op from node: {}", other);
            ParsedFrame::Ignored
        }
    }
}

fn parse_event_frame(frame: EventFrame) -> ParsedFrame {
    let tenant = match tenant_of(&frame.guild_id) {
        Some(tenant) => tenant,
        None => return ParsedFrame::Ignored,
    };

    let require_track = |track: Option<TrackDescriptor>| -> Option<TrackDescriptor> {
        if track.is_none() {
            warn!(target: WS_LOG_TARGET, "{} without a track payload", frame.kind);
        }
        track
    };

    let event = match frame.kind.as_str() {
        "TrackStartEvent" => match require_track(frame.track) {
            Some(track) => NodeEvent::TrackStarted(track),
            None => return ParsedFrame::Ignored,
        },
        "TrackEndEvent" => match require_track(frame.track) {
            Some(track) => NodeEvent::TrackEnded {
                track,
                reason: EndReason::from_wire(frame.reason.as_deref().unwrap_or("stopped")),
            },
            None => return ParsedFrame::Ignored,
        },
        "TrackStuckEvent" => match require_track(frame.track) {
            Some(track) => NodeEvent::TrackStuck {
                track,
                threshold_ms: frame.threshold_ms.unwrap_or(0),
            },
            None => return ParsedFrame::Ignored,
        },
        "TrackExceptionEvent" => match require_track(frame.track) {
            Some(track) => NodeEvent::TrackException {
                track,
                message: frame
                    .exception
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "unspecified".to_string()),
            },
            None => return ParsedFrame::Ignored,
        },
        "WebSocketClosedEvent" => NodeEvent::WebsocketClosed {
            code: frame.code.unwrap_or(0),
            reason: frame.reason.unwrap_or_default(),
        },
        other => {
            warn!(target: WS_LOG_TARGET, "Unknown event type from node: {}", other);
            return ParsedFrame::Ignored;
        }
    };

    ParsedFrame::Event { tenant, event }
}

/// Connects to the node's websocket and pumps events into the registry
/// until the socket closes. Reconnecting is the host's concern, not ours.
pub async fn run_event_listener(
    client: Arc<NodeClient>,
    registry: Arc<SessionRegistry>,
) -> Result<(), NodeError> {
    let ws_url = Url::parse(client.ws_url())
        .map_err(|e| NodeError::WebSocket(format!("invalid node url: {}", e)))?;
    let mut request = ws_url
        .as_str()
        .into_client_request()
        .map_err(|e| NodeError::WebSocket(e.to_string()))?;

    let headers = request.headers_mut();
    headers.insert(
        "Authorization",
        HeaderValue::from_str(client.password())
            .map_err(|e| NodeError::WebSocket(format!("invalid password header: {}", e)))?,
    );
    headers.insert(
        "User-Id",
        HeaderValue::from_str(&client.user_id().to_string())
            .map_err(|e| NodeError::WebSocket(e.to_string()))?,
    );
    headers.insert(
        "Client-Name",
        HeaderValue::from_str(&client.client_name())
            .map_err(|e| NodeError::WebSocket(e.to_string()))?,
    );

    info!(target: WS_LOG_TARGET, "Connecting to audio node at {}", client.ws_url());
    let (ws_stream, _) = connect_async(request)
        .await
        .map_err(|e| NodeError::WebSocket(e.to_string()))?;
    let (_write, mut read) = ws_stream.split();

    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                trace!(target: WS_LOG_TARGET, "Frame: {}", text);
                match parse_frame(&text) {
                    ParsedFrame::Ready {
                        session_id,
                        resumed,
                    } => {
                        info!(target: WS_LOG_TARGET,
                            "Audio node ready (session {}, resumed: {})", session_id, resumed);
                        client.set_session_id(session_id).await;
                    }
                    ParsedFrame::Event { tenant, event } => {
                        registry.dispatch_event(tenant, event).await;
                    }
                    ParsedFrame::Ignored => {}
                }
            }
            Ok(Message::Close(frame)) => {
                warn!(target: WS_LOG_TARGET, "Node closed the websocket: {:?}", frame);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!(target: WS_LOG_TARGET, "Websocket read error: {}", e);
                break;
            }
        }
    }

    debug!(target: WS_LOG_TARGET, "Event listener finished.");
    Ok(())
}
