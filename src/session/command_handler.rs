//! Handlers for the session mailbox: chat commands on one side, node
//! lifecycle events on the other. Queue advancement happens in exactly one
//! place, the track-end handler.

use super::state::{
    PlayOutcome, PlaybackState, RadioOutcome, SessionSnapshot, SessionUpdate, SkipOutcome,
};
use super::{autoplay, PlaybackSession, SESSION_LOG_TARGET};
use crate::commands::CommandError;
use crate::node::events::{EndReason, NodeEvent};
use crate::node::models::TrackDescriptor;
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};

/// How many queued tracks a snapshot carries for display.
const QUEUE_PREVIEW: usize = 10;

/// How many tracks a radio command seeds the queue with.
const RADIO_SEED_COUNT: usize = 5;

#[instrument(skip(session, track, respond), fields(tenant = %session.tenant, title = %track.title()))]
pub(super) async fn handle_play(
    session: &mut PlaybackSession,
    track: TrackDescriptor,
    respond: oneshot::Sender<Result<PlayOutcome, CommandError>>,
) {
    let outcome = if session.state.is_idle() {
        if start_track(session, track.clone()).await {
            Ok(PlayOutcome::Started(track))
        } else {
            Err(CommandError::Internal(
                "audio node rejected the play request".to_string(),
            ))
        }
    } else {
        session.queue.enqueue(track.clone());
        let position = session.queue.len();
        info!(target: SESSION_LOG_TARGET,
            "Queued \"{}\" at position {}.", track.title(), position);
        session.broadcast_update(SessionUpdate::Queued {
            track: track.clone(),
            position,
        });
        Ok(PlayOutcome::Queued { track, position })
    };
    let _ = respond.send(outcome);
}

#[instrument(skip(session, respond), fields(tenant = %session.tenant))]
pub(super) async fn handle_pause(
    session: &mut PlaybackSession,
    respond: oneshot::Sender<Result<(), CommandError>>,
) {
    let result = match &session.state {
        PlaybackState::Playing { track } => {
            let track = track.clone();
            match session.node.set_paused(session.tenant, true).await {
                Ok(()) => {
                    info!(target: SESSION_LOG_TARGET, "Paused \"{}\".", track.title());
                    session.state = PlaybackState::Paused { track };
                    Ok(())
                }
                Err(e) => {
                    error!(target: SESSION_LOG_TARGET, "Pause command to node failed: {}", e);
                    Err(CommandError::Internal(e.to_string()))
                }
            }
        }
        PlaybackState::Paused { .. } => Err(CommandError::AlreadyPaused),
        PlaybackState::Idle => Err(CommandError::NothingPlaying),
    };
    let _ = respond.send(result);
}

#[instrument(skip(session, respond), fields(tenant = %session.tenant))]
pub(super) async fn handle_resume(
    session: &mut PlaybackSession,
    respond: oneshot::Sender<Result<(), CommandError>>,
) {
    let result = match &session.state {
        PlaybackState::Paused { track } => {
            let track = track.clone();
            match session.node.set_paused(session.tenant, false).await {
                Ok(()) => {
                    info!(target: SESSION_LOG_TARGET, "Resumed \"{}\".", track.title());
                    session.state = PlaybackState::Playing { track };
                    Ok(())
                }
                Err(e) => {
                    error!(target: SESSION_LOG_TARGET, "Resume command to node failed: {}", e);
                    Err(CommandError::Internal(e.to_string()))
                }
            }
        }
        PlaybackState::Playing { .. } => Err(CommandError::NotPaused),
        PlaybackState::Idle => Err(CommandError::NothingPlaying),
    };
    let _ = respond.send(result);
}

/// A skip only asks the node to cut the current track short; the advance
/// itself is driven by the end event that follows.
#[instrument(skip(session, respond), fields(tenant = %session.tenant))]
pub(super) async fn handle_skip(
    session: &mut PlaybackSession,
    respond: oneshot::Sender<Result<SkipOutcome, CommandError>>,
) {
    let result = match session.state.current_track() {
        Some(current) => {
            let skipped = current.clone();
            match session.node.force_stop(session.tenant).await {
                Ok(()) => {
                    info!(target: SESSION_LOG_TARGET,
                        "Skip requested for \"{}\"; advancing on the node's end event.",
                        skipped.title());
                    Ok(SkipOutcome {
                        skipped,
                        remaining: session.queue.len(),
                    })
                }
                Err(e) => {
                    error!(target: SESSION_LOG_TARGET, "Skip command to node failed: {}", e);
                    Err(CommandError::Internal(e.to_string()))
                }
            }
        }
        None => Err(CommandError::NothingPlaying),
    };
    let _ = respond.send(result);
}

pub(super) fn handle_toggle_autoplay(
    session: &mut PlaybackSession,
    respond: oneshot::Sender<bool>,
) {
    session.autoplay = !session.autoplay;
    info!(target: SESSION_LOG_TARGET, tenant = %session.tenant,
        "Autoplay {}.", if session.autoplay { "enabled" } else { "disabled" });
    let _ = respond.send(session.autoplay);
}

#[instrument(skip(session, tracks, respond), fields(tenant = %session.tenant, seed_count = tracks.len()))]
pub(super) async fn handle_start_radio(
    session: &mut PlaybackSession,
    tracks: Vec<TrackDescriptor>,
    respond: oneshot::Sender<Result<RadioOutcome, CommandError>>,
) {
    session.queue.clear();
    session.autoplay = true;
    for track in tracks.into_iter().take(RADIO_SEED_COUNT) {
        session.queue.enqueue(track);
    }
    info!(target: SESSION_LOG_TARGET, "Radio seeded with {} tracks.", session.queue.len());

    if session.state.is_idle() {
        if let Ok(first) = session.queue.dequeue() {
            if !start_track(session, first).await {
                let _ = respond.send(Err(CommandError::Internal(
                    "audio node rejected the play request".to_string(),
                )));
                return;
            }
        }
    }

    let _ = respond.send(Ok(RadioOutcome {
        now_playing: session.state.current_track().cloned(),
        queued: session.queue.len(),
    }));
}

pub(super) fn snapshot(session: &PlaybackSession) -> SessionSnapshot {
    SessionSnapshot {
        state: session.state.clone(),
        upcoming: session.queue.peek(QUEUE_PREVIEW).cloned().collect(),
        queue_len: session.queue.len(),
        autoplay: session.autoplay,
        position_ms: session.position_ms,
    }
}

#[instrument(skip(session, event), fields(tenant = %session.tenant))]
pub(super) async fn handle_node_event(session: &mut PlaybackSession, event: NodeEvent) {
    match event {
        NodeEvent::TrackStarted(track) => {
            info!(target: SESSION_LOG_TARGET, "Node started playing \"{}\".", track.title());
        }
        NodeEvent::PlayerUpdate(state) => {
            session.position_ms = state.position;
            if !state.connected {
                debug!(target: SESSION_LOG_TARGET, "Player update reports voice disconnected.");
            }
        }
        NodeEvent::WebsocketClosed { code, reason } => {
            warn!(target: SESSION_LOG_TARGET, "Voice websocket closed: {} {}", code, reason);
        }
        NodeEvent::TrackStuck {
            track,
            threshold_ms,
        } => {
            warn!(target: SESSION_LOG_TARGET,
                "Track stuck: \"{}\" (threshold {}ms); forcing a skip.",
                track.title(), threshold_ms);
            force_skip(session).await;
        }
        NodeEvent::TrackException { track, message } => {
            error!(target: SESSION_LOG_TARGET,
                "Track exception on \"{}\": {}; forcing a skip.", track.title(), message);
            force_skip(session).await;
        }
        NodeEvent::TrackEnded { track, reason } => {
            handle_track_ended(session, track, reason).await;
        }
    }
}

/// Cuts a faulted track short. The end event that follows performs the
/// advance, same as a user skip.
async fn force_skip(session: &mut PlaybackSession) {
    if let Err(e) = session.node.force_stop(session.tenant).await {
        error!(target: SESSION_LOG_TARGET, "Force-stop after playback fault failed: {}", e);
    }
}

/// The single point of queue advancement.
async fn handle_track_ended(
    session: &mut PlaybackSession,
    ended: TrackDescriptor,
    reason: EndReason,
) {
    // A forced skip and a natural end can both produce end events for the
    // same playback; anything not matching the current track is stale.
    if let Some(current) = session.state.current_track() {
        if current.info.identifier != ended.info.identifier {
            debug!(target: SESSION_LOG_TARGET,
                "Stale end event for \"{}\" (current is \"{}\"); ignored.",
                ended.title(), current.title());
            return;
        }
    }

    info!(target: SESSION_LOG_TARGET, "Track ended: \"{}\" ({:?}).", ended.title(), reason);
    session.position_ms = 0;
    session.last_played = Some(ended);

    match session.queue.dequeue() {
        Ok(next) => {
            start_track(session, next).await;
        }
        Err(_) => {
            if reason == EndReason::Finished && session.autoplay {
                let reference = session
                    .last_played
                    .as_ref()
                    .map(|t| t.title().to_string())
                    .unwrap_or_default();
                let seeded = autoplay::seed(
                    session.search.as_ref(),
                    session.search_source,
                    &mut session.queue,
                    &reference,
                )
                .await;
                if seeded {
                    if let Ok(next) = session.queue.dequeue() {
                        session.broadcast_update(SessionUpdate::Seeded(next.clone()));
                        start_track(session, next).await;
                        return;
                    }
                }
                debug!(target: SESSION_LOG_TARGET, "Autoplay found no recommendation.");
            }
            go_idle(session);
        }
    }
}

/// Issues the play command and moves to `Playing` on success. A node
/// refusal drops the session to `Idle` rather than killing anything.
pub(super) async fn start_track(session: &mut PlaybackSession, track: TrackDescriptor) -> bool {
    match session.node.play(session.tenant, &track).await {
        Ok(()) => {
            info!(target: SESSION_LOG_TARGET, "Now playing \"{}\".", track.title());
            session.position_ms = 0;
            session.state = PlaybackState::Playing {
                track: track.clone(),
            };
            session.broadcast_update(SessionUpdate::Started(track));
            true
        }
        Err(e) => {
            error!(target: SESSION_LOG_TARGET, "Play command to node failed: {}", e);
            session.state = PlaybackState::Idle;
            session.broadcast_update(SessionUpdate::Idle);
            false
        }
    }
}

fn go_idle(session: &mut PlaybackSession) {
    session.state = PlaybackState::Idle;
    session.broadcast_update(SessionUpdate::Idle);
}

/// Final cleanup, run when the session leaves its loop for any reason.
/// Autoplay dies with the session, so no flag can outlive its tenant.
#[instrument(skip(session), fields(tenant = %session.tenant))]
pub(super) async fn teardown(session: &mut PlaybackSession) {
    session.autoplay = false;
    session.queue.clear();
    session.state = PlaybackState::Idle;
    if let Err(e) = session.node.disconnect(session.tenant).await {
        warn!(target: SESSION_LOG_TARGET, "Node disconnect during teardown failed: {}", e);
    }
    session.broadcast_update(SessionUpdate::Closed);
}
