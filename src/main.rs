use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eegscope::api::report::render_text;
use eegscope::api::ProgressFn;
use eegscope::{AppSession, ClientConfig};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::{self, Duration, Instant};

#[derive(Parser)]
#[command(
    name = "eegscope",
    version,
    about = "Upload EEG recordings for analysis and watch the live stream"
)]
struct Cli {
    /// JSON config file; keys not given keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Analysis service base address (overrides config and EEGSCOPE_API_BASE)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a recording (.edf, .csv, .mat, .eea) and print the analysis
    Analyze {
        file: PathBuf,
        /// Print the raw JSON result instead of the summary
        #[arg(long)]
        json: bool,
    },
    /// Stream live EEG (or demo data when the service is unreachable)
    Stream {
        /// Seconds to stream before tearing down
        #[arg(long, default_value_t = 10)]
        seconds: u64,
        /// Status line period in milliseconds
        #[arg(long, default_value_t = 1000)]
        report_ms: u64,
    },
    /// Check that the analysis service is up
    Health,
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    }
    .with_env_overrides();
    if let Some(base) = &cli.base_url {
        config.base_url = base.clone();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut app = AppSession::new(config)?;

    match cli.command {
        Commands::Analyze { file, json } => analyze(&mut app, file, json).await,
        Commands::Stream { seconds, report_ms } => stream(&mut app, seconds, report_ms).await,
        Commands::Health => {
            let info = app.client().health().await?;
            println!("{}", info.message);
            Ok(())
        }
    }
}

async fn analyze(app: &mut AppSession, file: PathBuf, json: bool) -> Result<()> {
    app.select_file(&file).await?;

    let progress: ProgressFn = Arc::new(|pct| {
        eprint!("\rUploading... {:3}%", pct);
        let _ = std::io::stderr().flush();
    });
    let result = app.analyze(Some(progress)).await;
    eprintln!();
    let result = result?.clone();

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to encode result")?
        );
    } else {
        let heatmap = app.client().heatmap_url(&result);
        print!("{}", render_text(&result, heatmap.as_ref()));
    }
    Ok(())
}

async fn stream(app: &mut AppSession, seconds: u64, report_ms: u64) -> Result<()> {
    let session = app.stream()?;
    println!("Streaming from {} for {}s", session.url(), seconds);
    session.start().await?;

    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut ticker = time::interval(Duration::from_millis(report_ms.max(1)));
    let mut shown_notice: Option<String> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = time::sleep_until(deadline) => break,
            _ = tokio::signal::ctrl_c() => break,
        }

        let snapshot = session.snapshot();
        let status = &snapshot.status;
        let notice = status.notice();
        if notice.is_some() && notice != shown_notice {
            eprintln!("{}", notice.as_deref().unwrap_or_default());
        }
        shown_notice = notice;

        let latest = snapshot
            .samples
            .last()
            .map(|s| {
                s.channels
                    .iter()
                    .map(|v| format!("{:7.2}", v))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        println!(
            "[{}{}] {:4} Hz  {} ch  {:3} buffered | {}",
            status.connection.name(),
            if status.streaming { ", live" } else { "" },
            snapshot.stats.sampling_rate_hz,
            snapshot.stats.channel_count,
            snapshot.stats.buffer_size,
            latest
        );

        if !status.streaming {
            break;
        }
    }

    let report = session.metrics().report();
    app.close_stream().await?;
    print!("{}", report);
    Ok(())
}
