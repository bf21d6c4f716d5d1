//! End-to-end tests for the playback core: chat commands and node
//! lifecycle events driving real session tasks against mock collaborators.

use async_trait::async_trait;
use radiola::commands::{CommandContext, CommandError, Commands};
use radiola::node::{
    AudioNodeApi, ChannelId, EndReason, NodeError, NodeEvent, PlayerState, SearchSource, TenantId,
    TrackDescriptor, TrackInfo, TrackSearchGateway, VoiceHandle, VoiceServerInfo,
};
use radiola::session::state::PlayOutcome;
use radiola::session::SessionRegistry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TENANT: TenantId = TenantId(7);
const CHANNEL: ChannelId = ChannelId(42);

fn ctx() -> CommandContext {
    CommandContext {
        tenant: TENANT,
        user_voice_channel: Some(CHANNEL),
    }
}

fn track(title: &str, length_ms: u64) -> TrackDescriptor {
    TrackDescriptor {
        encoded: format!("enc:{}", title),
        info: TrackInfo {
            identifier: format!("id:{}", title),
            title: title.to_string(),
            author: None,
            length: length_ms,
            is_stream: false,
            uri: None,
            source_name: "soundcloud".to_string(),
        },
    }
}

/// Lets queued mailbox work (shutdowns, teardowns) run to completion.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[derive(Debug, Clone, PartialEq)]
enum NodeCall {
    Connect(TenantId, ChannelId),
    Play(TenantId, String),
    SetPaused(TenantId, bool),
    ForceStop(TenantId),
    Disconnect(TenantId),
}

/// Audio node stand-in that records every command it receives.
#[derive(Default)]
struct RecordingNode {
    calls: Mutex<Vec<NodeCall>>,
    fail_plays: AtomicBool,
}

impl RecordingNode {
    fn calls(&self) -> Vec<NodeCall> {
        self.calls.lock().unwrap().clone()
    }

    fn play_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, NodeCall::Play(..)))
            .count()
    }

    fn set_fail_plays(&self, fail: bool) {
        self.fail_plays.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioNodeApi for RecordingNode {
    async fn connect(
        &self,
        tenant: TenantId,
        channel: ChannelId,
    ) -> Result<VoiceHandle, NodeError> {
        self.calls
            .lock()
            .unwrap()
            .push(NodeCall::Connect(tenant, channel));
        Ok(VoiceHandle { channel })
    }

    async fn play(&self, tenant: TenantId, track: &TrackDescriptor) -> Result<(), NodeError> {
        if self.fail_plays.load(Ordering::SeqCst) {
            return Err(NodeError::InvalidResponse("play refused".to_string()));
        }
        self.calls
            .lock()
            .unwrap()
            .push(NodeCall::Play(tenant, track.title().to_string()));
        Ok(())
    }

    async fn set_paused(&self, tenant: TenantId, paused: bool) -> Result<(), NodeError> {
        self.calls
            .lock()
            .unwrap()
            .push(NodeCall::SetPaused(tenant, paused));
        Ok(())
    }

    async fn force_stop(&self, tenant: TenantId) -> Result<(), NodeError> {
        self.calls.lock().unwrap().push(NodeCall::ForceStop(tenant));
        Ok(())
    }

    async fn disconnect(&self, tenant: TenantId) -> Result<(), NodeError> {
        self.calls
            .lock()
            .unwrap()
            .push(NodeCall::Disconnect(tenant));
        Ok(())
    }

    async fn update_voice(
        &self,
        _tenant: TenantId,
        _voice: VoiceServerInfo,
    ) -> Result<(), NodeError> {
        Ok(())
    }
}

/// Search gateway stand-in answering from a scripted query table.
#[derive(Default)]
struct ScriptedSearch {
    responses: Mutex<HashMap<String, Vec<TrackDescriptor>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    fn insert(&self, query: &str, tracks: Vec<TrackDescriptor>) {
        self.responses
            .lock()
            .unwrap()
            .insert(query.to_string(), tracks);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TrackSearchGateway for ScriptedSearch {
    async fn search(
        &self,
        query: &str,
        _source: Option<SearchSource>,
    ) -> Result<Vec<TrackDescriptor>, NodeError> {
        self.calls.lock().unwrap().push(query.to_string());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

struct Fixture {
    node: Arc<RecordingNode>,
    search: Arc<ScriptedSearch>,
    registry: Arc<SessionRegistry>,
    commands: Commands,
}

fn fixture() -> Fixture {
    let node = Arc::new(RecordingNode::default());
    let search = Arc::new(ScriptedSearch::default());
    let registry = Arc::new(SessionRegistry::new(
        node.clone(),
        search.clone(),
        Some(SearchSource::SoundCloud),
    ));
    let commands = Commands::new(
        registry.clone(),
        node.clone(),
        search.clone(),
        SearchSource::SoundCloud,
    );
    Fixture {
        node,
        search,
        registry,
        commands,
    }
}

// --- Play command ---

#[tokio::test]
async fn play_starts_on_idle_and_queues_thereafter() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.search.insert("song b", vec![track("Song B", 180_000)]);

    let reply = f.commands.play(&ctx(), "song a").await.unwrap();
    assert!(matches!(reply.outcome, PlayOutcome::Started(_)));

    let handle = f.registry.get(TENANT).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state.current_track().unwrap().title(), "Song A");
    // Starting a track on an idle session never touches the queue
    assert_eq!(snap.queue_len, 0);

    let reply = f.commands.play(&ctx(), "song b").await.unwrap();
    assert!(matches!(
        reply.outcome,
        PlayOutcome::Queued { position: 1, .. }
    ));

    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state.current_track().unwrap().title(), "Song A");
    assert_eq!(snap.queue_len, 1);

    assert_eq!(
        f.node.calls(),
        vec![
            NodeCall::Connect(TENANT, CHANNEL),
            NodeCall::Play(TENANT, "Song A".to_string()),
        ]
    );
}

#[tokio::test]
async fn play_requires_a_voice_channel() {
    let f = fixture();
    let no_voice = CommandContext {
        tenant: TENANT,
        user_voice_channel: None,
    };

    let err = f.commands.play(&no_voice, "song a").await.unwrap_err();
    assert_eq!(err, CommandError::NoVoiceChannel);
    assert!(f.registry.get(TENANT).await.is_none());
    assert!(f.node.calls().is_empty());
}

#[tokio::test]
async fn play_rejects_users_in_another_channel() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();

    let elsewhere = CommandContext {
        tenant: TENANT,
        user_voice_channel: Some(ChannelId(999)),
    };
    let err = f.commands.play(&elsewhere, "song a").await.unwrap_err();
    assert_eq!(err, CommandError::WrongChannel);
}

#[tokio::test]
async fn play_falls_back_to_simplified_query_then_secondary_source() {
    let f = fixture();
    f.search
        .insert("artist someone", vec![track("The One", 180_000)]);

    let reply = f.commands.play(&ctx(), "Artist ft Someone").await.unwrap();
    assert!(matches!(reply.outcome, PlayOutcome::Started(_)));
    assert_eq!(
        f.search.calls(),
        vec!["Artist ft Someone", "artist someone"]
    );
}

#[tokio::test]
async fn play_reports_no_results_after_all_fallbacks() {
    let f = fixture();
    let err = f.commands.play(&ctx(), "does not exist").await.unwrap_err();
    assert_eq!(err, CommandError::NoResults);
    // Primary source, then secondary source (query has nothing to simplify)
    assert_eq!(f.search.calls().len(), 2);
    // No session is created for a failed search
    assert!(f.registry.get(TENANT).await.is_none());
}

#[tokio::test]
async fn play_passes_urls_straight_through() {
    let f = fixture();
    let url = "https://soundcloud.com/artist/song-a";
    f.search.insert(url, vec![track("Song A", 180_000)]);

    let reply = f.commands.play(&ctx(), url).await.unwrap();
    assert_eq!(reply.source, "direct url");
    assert_eq!(f.search.calls(), vec![url]);
}

// --- Pause / resume ---

#[tokio::test]
async fn pause_and_resume_follow_the_state_machine() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();

    f.commands.pause(&ctx()).await.unwrap();
    // A second pause must fail without another node command
    let err = f.commands.pause(&ctx()).await.unwrap_err();
    assert_eq!(err, CommandError::AlreadyPaused);
    assert_eq!(
        f.node
            .calls()
            .iter()
            .filter(|c| matches!(c, NodeCall::SetPaused(_, true)))
            .count(),
        1
    );

    f.commands.resume(&ctx()).await.unwrap();
    let err = f.commands.resume(&ctx()).await.unwrap_err();
    assert_eq!(err, CommandError::NotPaused);
}

#[tokio::test]
async fn pause_fails_without_a_session_or_a_track() {
    let f = fixture();
    assert_eq!(
        f.commands.pause(&ctx()).await.unwrap_err(),
        CommandError::NotConnected
    );

    // Session exists but has gone idle: still nothing to pause
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();
    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("Song A", 180_000),
                reason: EndReason::Finished,
            },
        )
        .await;
    assert_eq!(
        f.commands.pause(&ctx()).await.unwrap_err(),
        CommandError::NothingPlaying
    );
}

// --- Skip ---

#[tokio::test]
async fn skip_defers_the_advance_to_the_end_event() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.search.insert("song b", vec![track("Song B", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();
    f.commands.play(&ctx(), "song b").await.unwrap();

    let outcome = f.commands.skip(&ctx()).await.unwrap();
    assert_eq!(outcome.skipped.title(), "Song A");
    assert_eq!(outcome.remaining, 1);

    // The skip itself only asked the node to stop; nothing advanced yet
    let handle = f.registry.get(TENANT).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state.current_track().unwrap().title(), "Song A");
    assert_eq!(snap.queue_len, 1);
    assert!(f.node.calls().contains(&NodeCall::ForceStop(TENANT)));
    assert_eq!(f.node.play_count(), 1);

    // The node acknowledges with a stopped end event; now we advance
    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("Song A", 180_000),
                reason: EndReason::Stopped,
            },
        )
        .await;

    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state.current_track().unwrap().title(), "Song B");
    assert_eq!(snap.queue_len, 0);
    assert_eq!(f.node.play_count(), 2);
}

#[tokio::test]
async fn skip_fails_when_idle() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();
    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("Song A", 180_000),
                reason: EndReason::Finished,
            },
        )
        .await;

    assert_eq!(
        f.commands.skip(&ctx()).await.unwrap_err(),
        CommandError::NothingPlaying
    );
}

// --- Track end / queue advancement ---

#[tokio::test]
async fn track_end_advances_the_queue_in_fifo_order() {
    let f = fixture();
    f.search.insert("t", vec![track("T", 180_000)]);
    f.search.insert("a", vec![track("A", 180_000)]);
    f.search.insert("b", vec![track("B", 180_000)]);
    f.search.insert("c", vec![track("C", 180_000)]);
    for q in ["t", "a", "b", "c"] {
        f.commands.play(&ctx(), q).await.unwrap();
    }

    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("T", 180_000),
                reason: EndReason::Finished,
            },
        )
        .await;

    let handle = f.registry.get(TENANT).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state.current_track().unwrap().title(), "A");
    assert_eq!(
        snap.upcoming
            .iter()
            .map(|t| t.title().to_string())
            .collect::<Vec<_>>(),
        vec!["B", "C"]
    );
}

#[tokio::test]
async fn end_event_with_no_current_track_still_drains_the_queue() {
    let f = fixture();
    f.search.insert("t", vec![track("T", 180_000)]);
    f.search.insert("a", vec![track("A", 180_000)]);
    f.search.insert("b", vec![track("B", 180_000)]);
    for q in ["t", "a", "b"] {
        f.commands.play(&ctx(), q).await.unwrap();
    }

    // The advance to A fails at the node, leaving an idle session with
    // [B] still queued
    f.node.set_fail_plays(true);
    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("T", 180_000),
                reason: EndReason::Finished,
            },
        )
        .await;
    let handle = f.registry.get(TENANT).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert!(snap.state.is_idle());
    assert_eq!(snap.queue_len, 1);

    // A later end event finds no current track and simply advances
    f.node.set_fail_plays(false);
    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("A", 180_000),
                reason: EndReason::Finished,
            },
        )
        .await;
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state.current_track().unwrap().title(), "B");
    assert_eq!(snap.queue_len, 0);
}

#[tokio::test]
async fn stale_end_events_are_ignored() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.search.insert("song b", vec![track("Song B", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();
    f.commands.play(&ctx(), "song b").await.unwrap();

    // End event for a track that is not current (e.g. delivered late)
    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("Something Else", 180_000),
                reason: EndReason::Finished,
            },
        )
        .await;

    let handle = f.registry.get(TENANT).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state.current_track().unwrap().title(), "Song A");
    assert_eq!(snap.queue_len, 1);
    assert_eq!(f.node.play_count(), 1);
}

#[tokio::test]
async fn finished_with_empty_queue_and_autoplay_off_goes_idle() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();
    let searches_before = f.search.calls().len();

    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("Song A", 180_000),
                reason: EndReason::Finished,
            },
        )
        .await;

    let handle = f.registry.get(TENANT).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert!(snap.state.is_idle());
    // No seeder call was made
    assert_eq!(f.search.calls().len(), searches_before);
}

// --- Autoplay ---

#[tokio::test]
async fn autoplay_seeds_a_recommendation_when_the_queue_runs_dry() {
    let f = fixture();
    f.search
        .insert("song x - artist y", vec![track("Song X - Artist Y", 212_000)]);
    f.search.insert("song x", vec![track("Song X2", 40_000)]);
    f.commands.play(&ctx(), "song x - artist y").await.unwrap();

    let reply = f.commands.autoplay_toggle(&ctx()).await.unwrap();
    assert!(reply.enabled);

    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("Song X - Artist Y", 212_000),
                reason: EndReason::Finished,
            },
        )
        .await;

    let handle = f.registry.get(TENANT).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state.current_track().unwrap().title(), "Song X2");
    assert_eq!(snap.queue_len, 0);
}

#[tokio::test]
async fn autoplay_goes_idle_when_no_candidate_qualifies() {
    let f = fixture();
    f.search
        .insert("song x - artist y", vec![track("Song X - Artist Y", 212_000)]);
    // Every result is either the same title or below the duration floor
    f.search.insert(
        "song x",
        vec![
            track("SONG X - ARTIST Y", 212_000),
            track("Song X Teaser", 12_000),
        ],
    );
    f.commands.play(&ctx(), "song x - artist y").await.unwrap();
    f.commands.autoplay_toggle(&ctx()).await.unwrap();
    let searches_before = f.search.calls().len();

    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("Song X - Artist Y", 212_000),
                reason: EndReason::Finished,
            },
        )
        .await;

    let handle = f.registry.get(TENANT).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert!(snap.state.is_idle());
    // All three candidate terms were tried
    assert_eq!(f.search.calls().len(), searches_before + 3);
}

#[tokio::test]
async fn autoplay_never_seeds_after_a_stop_reason() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();
    f.commands.autoplay_toggle(&ctx()).await.unwrap();
    let searches_before = f.search.calls().len();

    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("Song A", 180_000),
                reason: EndReason::Stopped,
            },
        )
        .await;

    let handle = f.registry.get(TENANT).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert!(snap.state.is_idle());
    assert_eq!(f.search.calls().len(), searches_before);
}

// --- Stuck / exception recovery ---

#[tokio::test]
async fn stuck_tracks_are_skipped_via_the_node() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.search.insert("song b", vec![track("Song B", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();
    f.commands.play(&ctx(), "song b").await.unwrap();

    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackStuck {
                track: track("Song A", 180_000),
                threshold_ms: 10_000,
            },
        )
        .await;

    // The stuck handler only force-stops; the advance waits for the end event
    let handle = f.registry.get(TENANT).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state.current_track().unwrap().title(), "Song A");
    assert!(f.node.calls().contains(&NodeCall::ForceStop(TENANT)));

    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("Song A", 180_000),
                reason: EndReason::Stopped,
            },
        )
        .await;
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state.current_track().unwrap().title(), "Song B");
}

// --- Stop / registry lifecycle ---

#[tokio::test]
async fn stop_destroys_the_session_and_late_events_are_noops() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();
    assert_eq!(f.registry.active_count().await, 1);

    f.commands.stop(&ctx()).await.unwrap();
    assert!(f.registry.get(TENANT).await.is_none());
    assert_eq!(f.registry.active_count().await, 0);

    settle().await;
    assert!(f.node.calls().contains(&NodeCall::Disconnect(TENANT)));

    // Whatever the node still had in flight lands in the void
    let plays_before = f.node.play_count();
    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("Song A", 180_000),
                reason: EndReason::Finished,
            },
        )
        .await;
    assert_eq!(f.node.play_count(), plays_before);

    // A second stop has nothing to do
    assert_eq!(
        f.commands.stop(&ctx()).await.unwrap_err(),
        CommandError::NotConnected
    );
}

#[tokio::test]
async fn autoplay_does_not_survive_a_stop() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();
    f.commands.autoplay_toggle(&ctx()).await.unwrap();

    f.commands.stop(&ctx()).await.unwrap();
    settle().await;

    // A fresh session for the same tenant starts with autoplay off
    f.commands.play(&ctx(), "song a").await.unwrap();
    let handle = f.registry.get(TENANT).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert!(!snap.autoplay);
}

#[tokio::test]
async fn tenants_are_independent() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    let other = CommandContext {
        tenant: TenantId(8),
        user_voice_channel: Some(ChannelId(43)),
    };

    f.commands.play(&ctx(), "song a").await.unwrap();
    f.commands.play(&other, "song a").await.unwrap();
    assert_eq!(f.registry.active_count().await, 2);

    f.commands.stop(&ctx()).await.unwrap();
    assert!(f.registry.get(TENANT).await.is_none());
    // The other tenant's session is untouched
    let handle = f.registry.get(TenantId(8)).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert_eq!(snap.state.current_track().unwrap().title(), "Song A");
}

// --- Radio ---

#[tokio::test]
async fn radio_seeds_the_queue_and_enables_autoplay() {
    let f = fixture();
    f.search.insert(
        "synthwave",
        vec![
            track("R1", 120_000),
            track("R2", 120_000),
            track("R3", 120_000),
            track("R4", 120_000),
            track("R5", 120_000),
            track("R6", 120_000),
        ],
    );

    let reply = f.commands.radio(&ctx(), "synthwave").await.unwrap();
    assert_eq!(reply.now_playing.as_ref().unwrap().title(), "R1");
    // Five tracks seeded, one of them already dequeued and playing
    assert_eq!(reply.queued, 4);

    let handle = f.registry.get(TENANT).await.unwrap();
    let snap = handle.snapshot().await.unwrap();
    assert!(snap.autoplay);
    assert_eq!(snap.queue_len, 4);
}

#[tokio::test]
async fn radio_with_no_results_fails_cleanly() {
    let f = fixture();
    let err = f.commands.radio(&ctx(), "nothing here").await.unwrap_err();
    assert_eq!(err, CommandError::NoResults);
    assert!(f.registry.get(TENANT).await.is_none());
}

// --- Queue / now playing replies ---

#[tokio::test]
async fn queue_and_now_playing_report_session_state() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.search.insert("song b", vec![track("Song B", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();
    f.commands.play(&ctx(), "song b").await.unwrap();

    let queue = f.commands.queue(&ctx()).await.unwrap();
    assert_eq!(queue.now_playing.unwrap().title(), "Song A");
    assert_eq!(queue.total, 1);
    assert_eq!(queue.upcoming.len(), 1);

    // Position comes from the node's periodic player updates
    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::PlayerUpdate(PlayerState {
                position: 5_000,
                connected: true,
            }),
        )
        .await;
    let np = f.commands.now_playing(&ctx()).await.unwrap();
    assert_eq!(np.track.title(), "Song A");
    assert_eq!(np.position_ms, 5_000);
}

#[tokio::test]
async fn now_playing_fails_when_idle() {
    let f = fixture();
    f.search.insert("song a", vec![track("Song A", 180_000)]);
    f.commands.play(&ctx(), "song a").await.unwrap();
    f.registry
        .dispatch_event(
            TENANT,
            NodeEvent::TrackEnded {
                track: track("Song A", 180_000),
                reason: EndReason::Finished,
            },
        )
        .await;

    assert_eq!(
        f.commands.now_playing(&ctx()).await.unwrap_err(),
        CommandError::NothingPlaying
    );
}
