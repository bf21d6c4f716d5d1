//! The session's command processing loop.

use super::{command_handler, PlaybackSession, SessionCommand, SESSION_LOG_TARGET};
use tracing::{debug, info, trace};

/// Drains the mailbox until shutdown (or until every handle is dropped),
/// then runs the teardown. One invocation per session task.
pub(super) async fn run_session_loop(session: &mut PlaybackSession) {
    info!(target: SESSION_LOG_TARGET, "Session loop started.");

    loop {
        let command = match session.command_rx.recv().await {
            Some(command) => command,
            None => {
                debug!(target: SESSION_LOG_TARGET,
                    "All session handles dropped; leaving the loop.");
                break;
            }
        };
        trace!(target: SESSION_LOG_TARGET, "Received command: {:?}", command);

        match command {
            SessionCommand::Play { track, respond } => {
                command_handler::handle_play(session, track, respond).await
            }
            SessionCommand::Pause { respond } => {
                command_handler::handle_pause(session, respond).await
            }
            SessionCommand::Resume { respond } => {
                command_handler::handle_resume(session, respond).await
            }
            SessionCommand::Skip { respond } => {
                command_handler::handle_skip(session, respond).await
            }
            SessionCommand::ToggleAutoplay { respond } => {
                command_handler::handle_toggle_autoplay(session, respond)
            }
            SessionCommand::StartRadio { tracks, respond } => {
                command_handler::handle_start_radio(session, tracks, respond).await
            }
            SessionCommand::Snapshot { respond } => {
                // Ignore error if the requester gave up waiting
                let _ = respond.send(command_handler::snapshot(session));
            }
            SessionCommand::Node(event) => {
                command_handler::handle_node_event(session, event).await
            }
            SessionCommand::Shutdown => {
                info!(target: SESSION_LOG_TARGET, "Shutdown command received.");
                break;
            }
        }
    }

    command_handler::teardown(session).await;
    info!(target: SESSION_LOG_TARGET, "Session loop finished.");
}
