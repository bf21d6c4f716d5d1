use radiola::commands::{CommandContext, Commands};
use radiola::config::Settings;
use radiola::init_app_dirs;
use radiola::node::{
    run_event_listener, AudioNodeApi, ChannelId, NodeClient, SearchSource, TenantId,
    TrackSearchGateway,
};
use radiola::session::SessionRegistry;
use radiola::ui::Cli;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Parse command-line arguments and initialize CLI
    let cli = Cli::new();
    let args = &cli.args;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "radiola=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize application directories
    init_app_dirs()?;

    // Load configuration from file or create default
    let config_path = match &args.config {
        Some(path) => Path::new(path).to_path_buf(),
        None => Settings::default_path(),
    };

    let mut settings = Settings::load(&config_path)?;

    // Override settings with environment variables or command-line arguments
    if let Some(host) = &args.node_host {
        settings.node_addr = format!("{}:{}", host, args.node_port.unwrap_or(2333));
    }
    settings.node_password = args
        .node_password
        .clone()
        .unwrap_or(settings.node_password);
    settings.bot_user_id = args.bot_user_id.unwrap_or(settings.bot_user_id);
    settings.search_source = args.source.clone().unwrap_or(settings.search_source);

    // Validate settings
    settings.validate()?;
    let source: SearchSource = settings.search_source.parse()?;

    // Initialize the audio node client and its collaborator seams
    let client = Arc::new(
        NodeClient::new(&settings.node_addr, &settings.node_password)
            .with_user_id(settings.bot_user_id),
    );
    let node: Arc<dyn AudioNodeApi> = client.clone();
    let search: Arc<dyn TrackSearchGateway> = client.clone();

    let registry = Arc::new(SessionRegistry::new(
        node.clone(),
        search.clone(),
        Some(source),
    ));

    // Pump node lifecycle events into the registry until the socket closes
    let listener = tokio::spawn(run_event_listener(client.clone(), registry.clone()));

    let commands = Commands::new(registry, node, search, source);
    let ctx = CommandContext {
        tenant: TenantId(args.tenant),
        user_voice_channel: Some(ChannelId(args.channel)),
    };

    println!(
        "radiola console - audio node {} (tenant {})",
        settings.node_addr, args.tenant
    );
    cli.display_help();

    // Main application loop
    loop {
        let line = cli.read_command()?;
        let line = line.trim();
        let (command, rest) = line
            .split_once(' ')
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((line, ""));

        match command {
            "" => continue,
            "play" | "p" => {
                if rest.is_empty() {
                    println!("usage: play <query>");
                    continue;
                }
                match commands.play(&ctx, rest).await {
                    Ok(reply) => cli.display_play(&reply),
                    Err(e) => cli.display_error(&e),
                }
            }
            "pause" => match commands.pause(&ctx).await {
                Ok(()) => println!("Paused."),
                Err(e) => cli.display_error(&e),
            },
            "resume" => match commands.resume(&ctx).await {
                Ok(()) => println!("Resumed."),
                Err(e) => cli.display_error(&e),
            },
            "skip" => match commands.skip(&ctx).await {
                Ok(outcome) => cli.display_skip(&outcome),
                Err(e) => cli.display_error(&e),
            },
            "queue" | "q" => match commands.queue(&ctx).await {
                Ok(reply) => cli.display_queue(&reply),
                Err(e) => cli.display_error(&e),
            },
            "np" | "nowplaying" => match commands.now_playing(&ctx).await {
                Ok(reply) => cli.display_now_playing(&reply),
                Err(e) => cli.display_error(&e),
            },
            "autoplay" => match commands.autoplay_toggle(&ctx).await {
                Ok(reply) => cli.display_autoplay(&reply),
                Err(e) => cli.display_error(&e),
            },
            "radio" => {
                if rest.is_empty() {
                    println!("usage: radio <genre or artist>");
                    continue;
                }
                match commands.radio(&ctx, rest).await {
                    Ok(reply) => cli.display_radio(&reply),
                    Err(e) => cli.display_error(&e),
                }
            }
            "stop" => match commands.stop(&ctx).await {
                Ok(()) => println!("Stopped and disconnected."),
                Err(e) => cli.display_error(&e),
            },
            "help" | "?" => cli.display_help(),
            "quit" | "exit" => {
                // Tear the demo session down before leaving
                let _ = commands.stop(&ctx).await;
                break;
            }
            other => println!("Unknown command: {} (try 'help')", other),
        }
    }

    listener.abort();
    Ok(())
}
