//! WHPP viewer binary entry point
//!
//! Connects to a broadcaster channel, negotiates the WebRTC session and
//! consumes the stream until Ctrl+C or the optional duration ceiling.
//!
//! # Usage
//!
//! ```bash
//! # View the default channel until interrupted
//! cargo run --bin whpp_viewer
//!
//! # View a specific channel for ten minutes
//! cargo run --bin whpp_viewer -- \
//!   --url https://broadcaster.example.com:8443/broadcaster/channel/demo \
//!   --duration-secs 600
//!
//! # Relay through TURN
//! cargo run --bin whpp_viewer -- \
//!   --turn-servers turn:turn.example.com:3478:user:pass
//! ```

use clap::Parser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use whpp_viewer::config::DEFAULT_ENDPOINT_URL;
use whpp_viewer::{
    MediaBlackhole, NegotiationCoordinator, RtcPeerConnection, TurnServerConfig, WhppSession,
    WhppViewerConfig,
};

/// WHPP Viewer
///
/// Receives a broadcaster's WebRTC stream using WHPP signaling.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Signaling root URL of the broadcaster channel
    #[arg(long, default_value = DEFAULT_ENDPOINT_URL, env = "WHPP_URL")]
    url: String,

    /// STUN servers (comma-separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "stun:stun.l.google.com:19302",
        env = "WHPP_STUN_SERVERS"
    )]
    stun_servers: Vec<String>,

    /// TURN servers (format: turn:host:port:username:password, comma-separated)
    #[arg(long, value_delimiter = ',', env = "WHPP_TURN_SERVERS")]
    turn_servers: Vec<String>,

    /// Signaling request timeout in milliseconds
    #[arg(long, default_value_t = 10_000, env = "WHPP_TIMEOUT_MS")]
    timeout_ms: u64,

    /// Stop after this many seconds of media exchange (default: until Ctrl+C)
    #[arg(long, env = "WHPP_DURATION_SECS")]
    duration_secs: Option<u64>,

    /// Bearer token for the signaling endpoint
    #[arg(long, env = "WHPP_AUTH_TOKEN")]
    auth_token: Option<String>,
}

/// Parse TURN server string (format: turn:host:port:username:password or turns:host:port:username:password)
fn parse_turn_server(s: &str) -> Result<TurnServerConfig, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 5 {
        return Err(format!(
            "Invalid TURN server format: '{}'. Expected: turn:host:port:username:password",
            s
        ));
    }

    let protocol = parts[0];
    if protocol != "turn" && protocol != "turns" {
        return Err(format!(
            "Invalid TURN protocol: '{}'. Expected 'turn' or 'turns'",
            protocol
        ));
    }

    // Password may contain colons
    Ok(TurnServerConfig {
        url: format!("{}:{}:{}", protocol, parts[1], parts[2]),
        username: parts[3].to_string(),
        credential: parts[4..].join(":"),
    })
}

fn build_config_from_args(args: &Args) -> Result<WhppViewerConfig, Box<dyn std::error::Error>> {
    let mut config = WhppViewerConfig::new(&args.url);
    config.stun_servers = args.stun_servers.clone();
    config.request_timeout_ms = args.timeout_ms;
    config.media_timeout_secs = args.duration_secs;
    config.auth_token = args.auth_token.clone();

    for turn_str in &args.turn_servers {
        let turn = parse_turn_server(turn_str)
            .map_err(|e| format!("Failed to parse TURN server: {}", e))?;
        info!("Adding TURN server: {} (user: {})", turn.url, turn.username);
        config.turn_servers.push(turn);
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    init_tracing();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let interrupted = Arc::new(AtomicBool::new(false));

    ctrlc::set_handler(move || {
        if interrupted.swap(true, Ordering::SeqCst) {
            eprintln!("Shutdown already in progress, forcing immediate exit");
            std::process::exit(130);
        }
        eprintln!("\nCtrl+C received, shutting down...");
        let _ = shutdown_tx.send(true);
    })?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .thread_name("whpp-viewer")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(args, shutdown_rx))
}

async fn async_main(
    args: Args,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config_from_args(&args)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        endpoint_url = %config.endpoint_url,
        stun_servers = ?config.stun_servers,
        turn_servers = config.turn_servers.len(),
        request_timeout_ms = config.request_timeout_ms,
        media_timeout_secs = ?config.media_timeout_secs,
        "WHPP viewer starting"
    );

    let session = WhppSession::from_config(&config)?;
    let (peer, events) = RtcPeerConnection::new(&config).await?;
    let sink = Arc::new(MediaBlackhole::new());

    let mut coordinator =
        NegotiationCoordinator::new(session, Arc::new(peer), events, sink.clone());

    let media_timeout = config.media_timeout();
    let shutdown = async move {
        let mut shutdown_rx = shutdown_rx;
        let interrupted = async {
            // A dropped sender means the handler can no longer fire
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        };
        match media_timeout {
            Some(limit) => {
                tokio::select! {
                    _ = interrupted => {}
                    _ = tokio::time::sleep(limit) => {
                        info!("Media duration ceiling reached ({:?})", limit);
                    }
                }
            }
            None => interrupted.await,
        }
    };

    match coordinator.run(shutdown).await {
        Ok(state) => {
            info!(
                state = ?state,
                frames = sink.frames_discarded(),
                candidates_sent = coordinator.candidates_sent(),
                "WHPP viewer finished"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "WHPP viewer failed to start");
            Err(e.into())
        }
    }
}

fn init_tracing() {
    // RUST_LOG overrides the default level
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
