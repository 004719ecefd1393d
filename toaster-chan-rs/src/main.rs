//! toaster-chan: HTTP service that turns a spoken command into a toaster
//! toggle and a cheeky spoken reply.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use toaster_chan::api::{self, ApiState};
use toaster_chan::config::Config;
use toaster_chan::pipeline::ToasterPipeline;

#[derive(Parser, Debug)]
#[command(name = "toaster-chan", about = "Voice-controlled toaster switch")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides server.host)
    #[arg(long, env = "TOASTER_HOST")]
    host: Option<String>,

    /// Listen port (overrides server.port)
    #[arg(short, long, env = "TOASTER_PORT")]
    port: Option<u16>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging (keep HTTP client/server internals quiet)
    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("toaster-chan starting");

    let mut config = Config::load(args.config.as_deref());
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!(
        "Persona: {:?}, synthesis: {:?}, relay on={} off={}",
        config.intent.persona, config.synthesis.provider, config.relay.on_url, config.relay.off_url
    );

    let pipeline = ToasterPipeline::from_config(&config)?;
    let state = ApiState {
        pipeline: Arc::new(pipeline),
    };

    api::serve(state, &config.server).await?;

    Ok(())
}
