//! toaster-dataset: build a chat fine-tuning set from sample commands.
//!
//! Reads one user utterance per line (a single-column CSV with an `Input`
//! header works too), asks the configured generator for the in-character
//! reply, and writes one JSONL conversation per utterance.

use std::fs;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use toaster_chan::config::Config;
use toaster_chan::dataset;
use toaster_chan::intent::OpenAiIntentResolver;

#[derive(Parser, Debug)]
#[command(name = "toaster-dataset", about = "Generate persona fine-tuning data")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text file with one sample command per line
    #[arg(short, long)]
    input: PathBuf,

    /// Output JSONL path
    #[arg(short, long, default_value = "toaster_chan_dataset.jsonl")]
    output: PathBuf,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=info,reqwest=info")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load(args.config.as_deref());
    let resolver = OpenAiIntentResolver::new(&config.openai, &config.intent)?;

    let input = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let out = fs::File::create(&args.output)
        .with_context(|| format!("cannot create {}", args.output.display()))?;
    let mut out = BufWriter::new(out);

    let summary =
        dataset::write_dataset(&resolver, config.intent.system_prompt(), &input, &mut out).await?;

    info!(
        "Wrote {} conversations to {} ({} skipped)",
        summary.written,
        args.output.display(),
        summary.skipped
    );
    Ok(())
}
