//! Command-line interface implementation
//!
//! A local stand-in for the chat gateway: parses arguments, reads console
//! commands for one demo tenant and renders command replies as text.

use clap::Parser;
use std::io::{self, Write};

use crate::commands::{
    AutoplayReply, CommandError, NowPlayingReply, PlayReply, QueueReply, RadioReply,
};
use crate::session::state::{PlayOutcome, SkipOutcome};

/// Command-line arguments for radiola
#[derive(Parser, Debug)]
#[command(author, version, about = "Audio-node-backed music bot core", long_about = None)]
pub struct Args {
    /// Audio node host
    #[arg(long, env = "LAVALINK_HOST")]
    pub node_host: Option<String>,

    /// Audio node port
    #[arg(long, env = "LAVALINK_PORT")]
    pub node_port: Option<u16>,

    /// Audio node password
    #[arg(long, env = "LAVALINK_PASSWORD")]
    pub node_password: Option<String>,

    /// Bot user id announced to the node
    #[arg(long, env = "RADIOLA_USER_ID")]
    pub bot_user_id: Option<u64>,

    /// Default search source (soundcloud, youtube)
    #[arg(short, long, env = "RADIOLA_SOURCE")]
    pub source: Option<String>,

    /// Config file path
    #[arg(short, long, env = "RADIOLA_CONFIG")]
    pub config: Option<String>,

    /// Tenant id the console drives
    #[arg(long, default_value = "1")]
    pub tenant: u64,

    /// Voice channel id the console pretends to sit in
    #[arg(long, default_value = "1")]
    pub channel: u64,
}

/// Renders `ms` as `m:ss`.
pub(crate) fn format_time(ms: u64) -> String {
    format!("{}:{:02}", ms / 60_000, (ms % 60_000) / 1_000)
}

/// CLI user interface for interacting with the application
pub struct Cli {
    pub args: Args,
}

impl Cli {
    pub fn new() -> Self {
        Cli {
            args: Args::parse(),
        }
    }

    pub fn display_help(&self) {
        println!("Commands:");
        println!("  play <query>   search and play (or queue) a track");
        println!("  pause          pause playback");
        println!("  resume         resume playback");
        println!("  skip           skip the current track");
        println!("  queue          show the queue");
        println!("  np             show the current track");
        println!("  autoplay       toggle radio mode");
        println!("  radio <theme>  start a themed radio");
        println!("  stop           stop and disconnect");
        println!("  quit           exit");
    }

    pub fn display_play(&self, reply: &PlayReply) {
        match &reply.outcome {
            PlayOutcome::Started(track) => {
                println!("Now playing: {} [{}]", track.title(), reply.source);
            }
            PlayOutcome::Queued { track, position } => {
                println!(
                    "Added to queue: {} (position {}) [{}]",
                    track.title(),
                    position,
                    reply.source
                );
            }
        }
    }

    pub fn display_skip(&self, outcome: &SkipOutcome) {
        if outcome.remaining > 0 {
            println!("Skipping {}...", outcome.skipped.title());
        } else {
            println!(
                "Skipped {}. Nothing else is queued.",
                outcome.skipped.title()
            );
        }
    }

    pub fn display_queue(&self, reply: &QueueReply) {
        match &reply.now_playing {
            Some(track) => println!("Now playing: {}", track.title()),
            None => println!("Nothing is playing."),
        }
        if reply.upcoming.is_empty() {
            println!("The queue is empty.");
            return;
        }
        for (i, track) in reply.upcoming.iter().enumerate() {
            println!("  {}. {}", i + 1, track.title());
        }
        if reply.total > reply.upcoming.len() {
            println!("  ...and {} more", reply.total - reply.upcoming.len());
        }
    }

    pub fn display_now_playing(&self, reply: &NowPlayingReply) {
        match reply.track.duration_ms() {
            Some(duration) => println!(
                "Now playing: {} ({} / {})",
                reply.track.title(),
                format_time(reply.position_ms),
                format_time(duration)
            ),
            None => println!("Now playing: {} (live)", reply.track.title()),
        }
    }

    pub fn display_autoplay(&self, reply: &AutoplayReply) {
        if reply.enabled {
            println!("Radio mode enabled: similar tracks will be queued when the queue runs dry.");
        } else {
            println!("Radio mode disabled.");
        }
    }

    pub fn display_radio(&self, reply: &RadioReply) {
        println!("Radio started for \"{}\" ({} queued).", reply.theme, reply.queued);
        if let Some(track) = &reply.now_playing {
            println!("Now playing: {}", track.title());
        }
    }

    pub fn display_error(&self, error: &CommandError) {
        println!("error: {}", error);
    }

    /// Prompts and reads one console line.
    pub fn read_command(&self) -> io::Result<String> {
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input)
    }
}
