//! Command entry points, one per chat command.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    AutoplayReply, CommandContext, CommandError, NowPlayingReply, PlayReply, QueueReply,
    RadioReply,
};
use crate::node::client::{AudioNodeApi, SearchSource, TrackSearchGateway};
use crate::node::models::{ChannelId, TenantId, TrackDescriptor};
use crate::session::state::SkipOutcome;
use crate::session::{SessionHandle, SessionRegistry};

const COMMANDS_LOG_TARGET: &str = "radiola::commands";

/// Strips featuring/join noise that often makes literal searches miss.
pub(crate) fn simplify_query(query: &str) -> String {
    query
        .to_lowercase()
        .replace(" ft ", " ")
        .replace(" feat ", " ")
        .replace(" & ", " ")
}

/// Dispatcher for everything the chat gateway can ask of the core.
pub struct Commands {
    registry: Arc<SessionRegistry>,
    node: Arc<dyn AudioNodeApi>,
    search: Arc<dyn TrackSearchGateway>,
    source: SearchSource,
}

impl Commands {
    pub fn new(
        registry: Arc<SessionRegistry>,
        node: Arc<dyn AudioNodeApi>,
        search: Arc<dyn TrackSearchGateway>,
        source: SearchSource,
    ) -> Self {
        Commands {
            registry,
            node,
            search,
            source,
        }
    }

    fn secondary_source(&self) -> SearchSource {
        match self.source {
            SearchSource::SoundCloud => SearchSource::YouTube,
            SearchSource::YouTube => SearchSource::SoundCloud,
        }
    }

    /// Validates the caller's voice membership against an existing session.
    async fn voice_checked_session(
        &self,
        ctx: &CommandContext,
    ) -> Result<(ChannelId, Option<SessionHandle>), CommandError> {
        let channel = ctx.user_voice_channel.ok_or(CommandError::NoVoiceChannel)?;
        let existing = self.registry.get(ctx.tenant).await;
        if let Some(handle) = &existing {
            if handle.voice_channel() != channel {
                return Err(CommandError::WrongChannel);
            }
        }
        Ok((channel, existing))
    }

    /// Connects the tenant's player to the channel and registers a session
    /// for it. The connect happens before the registry is touched, so the
    /// registry lock never spans node I/O.
    async fn connect_session(
        &self,
        tenant: TenantId,
        channel: ChannelId,
    ) -> Result<SessionHandle, CommandError> {
        let voice = self
            .node
            .connect(tenant, channel)
            .await
            .map_err(|e| CommandError::Internal(e.to_string()))?;
        Ok(self.registry.get_or_create(tenant, voice).await)
    }

    /// Resolves free text into the track to play, with fallbacks: direct
    /// URLs load as-is; anything else tries the primary source, then a
    /// simplified query, then the secondary source.
    async fn resolve_query(&self, query: &str) -> Result<(TrackDescriptor, String), CommandError> {
        let is_url = query.starts_with("http://") || query.starts_with("https://");

        let attempts: Vec<(String, Option<SearchSource>, String)> = if is_url {
            vec![(query.to_string(), None, "direct url".to_string())]
        } else {
            let mut attempts = vec![(
                query.to_string(),
                Some(self.source),
                self.source.to_string(),
            )];
            let simplified = simplify_query(query);
            if simplified != query {
                attempts.push((simplified, Some(self.source), self.source.to_string()));
            }
            let secondary = self.secondary_source();
            attempts.push((query.to_string(), Some(secondary), secondary.to_string()));
            attempts
        };

        for (attempt, source, label) in attempts {
            match self.search.search(&attempt, source).await {
                Ok(tracks) => {
                    if let Some(track) = tracks.into_iter().next() {
                        return Ok((track, label));
                    }
                }
                Err(e) => {
                    warn!(target: COMMANDS_LOG_TARGET,
                        "Search for \"{}\" failed: {}", attempt, e);
                }
            }
        }

        Err(CommandError::NoResults)
    }

    /// Play a track by query, or queue it when something is already
    /// playing.
    #[instrument(skip(self, ctx, query), fields(tenant = %ctx.tenant))]
    pub async fn play(&self, ctx: &CommandContext, query: &str) -> Result<PlayReply, CommandError> {
        let (channel, existing) = self.voice_checked_session(ctx).await?;

        info!(target: COMMANDS_LOG_TARGET, "Searching: {}", query);
        let (track, source) = self.resolve_query(query).await?;

        let handle = match existing {
            Some(handle) => handle,
            None => self.connect_session(ctx.tenant, channel).await?,
        };

        let outcome = handle.play(track).await?;
        Ok(PlayReply { outcome, source })
    }

    #[instrument(skip(self, ctx), fields(tenant = %ctx.tenant))]
    pub async fn pause(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let handle = self
            .registry
            .get(ctx.tenant)
            .await
            .ok_or(CommandError::NotConnected)?;
        handle.pause().await
    }

    #[instrument(skip(self, ctx), fields(tenant = %ctx.tenant))]
    pub async fn resume(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let handle = self
            .registry
            .get(ctx.tenant)
            .await
            .ok_or(CommandError::NotConnected)?;
        handle.resume().await
    }

    #[instrument(skip(self, ctx), fields(tenant = %ctx.tenant))]
    pub async fn skip(&self, ctx: &CommandContext) -> Result<SkipOutcome, CommandError> {
        let handle = self
            .registry
            .get(ctx.tenant)
            .await
            .ok_or(CommandError::NotConnected)?;
        handle.skip().await
    }

    /// Stops playback, tears the session down and forgets the tenant.
    /// Autoplay dies with the session.
    #[instrument(skip(self, ctx), fields(tenant = %ctx.tenant))]
    pub async fn stop(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let handle = self
            .registry
            .remove(ctx.tenant)
            .await
            .ok_or(CommandError::NotConnected)?;
        handle.shutdown().await;
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(tenant = %ctx.tenant))]
    pub async fn queue(&self, ctx: &CommandContext) -> Result<QueueReply, CommandError> {
        let handle = self
            .registry
            .get(ctx.tenant)
            .await
            .ok_or(CommandError::NotConnected)?;
        let snapshot = handle.snapshot().await?;
        Ok(QueueReply {
            now_playing: snapshot.state.current_track().cloned(),
            upcoming: snapshot.upcoming,
            total: snapshot.queue_len,
        })
    }

    #[instrument(skip(self, ctx), fields(tenant = %ctx.tenant))]
    pub async fn now_playing(&self, ctx: &CommandContext) -> Result<NowPlayingReply, CommandError> {
        let handle = self
            .registry
            .get(ctx.tenant)
            .await
            .ok_or(CommandError::NotConnected)?;
        let snapshot = handle.snapshot().await?;
        match snapshot.state.current_track() {
            Some(track) => Ok(NowPlayingReply {
                track: track.clone(),
                position_ms: snapshot.position_ms,
            }),
            None => Err(CommandError::NothingPlaying),
        }
    }

    #[instrument(skip(self, ctx), fields(tenant = %ctx.tenant))]
    pub async fn autoplay_toggle(&self, ctx: &CommandContext) -> Result<AutoplayReply, CommandError> {
        let handle = self
            .registry
            .get(ctx.tenant)
            .await
            .ok_or(CommandError::NotConnected)?;
        let enabled = handle.toggle_autoplay().await?;
        Ok(AutoplayReply { enabled })
    }

    /// Starts radio mode: seed the queue from a theme search and keep it
    /// fed via autoplay.
    #[instrument(skip(self, ctx, theme), fields(tenant = %ctx.tenant))]
    pub async fn radio(&self, ctx: &CommandContext, theme: &str) -> Result<RadioReply, CommandError> {
        let (channel, existing) = self.voice_checked_session(ctx).await?;

        info!(target: COMMANDS_LOG_TARGET, "Starting radio for theme: {}", theme);
        let tracks = match self.search.search(theme, Some(self.source)).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!(target: COMMANDS_LOG_TARGET, "Radio search failed: {}", e);
                Vec::new()
            }
        };
        if tracks.is_empty() {
            return Err(CommandError::NoResults);
        }

        let handle = match existing {
            Some(handle) => handle,
            None => self.connect_session(ctx.tenant, channel).await?,
        };

        let outcome = handle.start_radio(tracks).await?;
        Ok(RadioReply {
            theme: theme.to_string(),
            now_playing: outcome.now_playing,
            queued: outcome.queued,
        })
    }
}
