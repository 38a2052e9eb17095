//! Tubeloader - command-line driver for yt-dlp
//!
//! Fetches metadata, lists selectable formats, downloads with live progress
//! and keeps the yt-dlp executable up to date.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tubeloader::catalog::distinct_resolutions;
use tubeloader::{
    AppSettings, DownloadOptions, FormatSelection, MediaFilter, OutputContainer, Tubeloader,
    TubeloaderError,
};

#[derive(Parser)]
#[command(name = "tubeloader", version, about = "Download media through yt-dlp")]
struct Args {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// yt-dlp executable, overriding settings and discovery
    #[arg(long, global = true)]
    ytdlp: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the formats available for a URL
    Info {
        url: String,
        #[arg(long, value_enum, default_value_t = FilterArg::VideoAndAudio)]
        filter: FilterArg,
        /// Print the decoded metadata as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download a URL
    Download {
        url: String,
        /// Raw yt-dlp format expression, e.g. `137+140`
        #[arg(long, conflicts_with_all = ["label", "resolution"])]
        format: Option<String>,
        /// A label printed by `info`
        #[arg(long, conflicts_with = "resolution")]
        label: Option<String>,
        /// Audio label to merge with `--label`
        #[arg(long, requires = "label")]
        audio_label: Option<String>,
        /// Resolution such as `1080p`
        #[arg(long)]
        resolution: Option<String>,
        #[arg(long, value_enum, default_value_t = FilterArg::VideoAndAudio)]
        filter: FilterArg,
        /// Output container: mp4, mkv, mp3 or wav
        #[arg(long)]
        container: Option<OutputContainer>,
        /// Destination directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Update yt-dlp to the latest release
    Update,
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    VideoAndAudio,
    VideoOnly,
    AudioOnly,
    Storyboard,
}

impl From<FilterArg> for MediaFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::VideoAndAudio => MediaFilter::VideoAndAudio,
            FilterArg::VideoOnly => MediaFilter::VideoOnly,
            FilterArg::AudioOnly => MediaFilter::AudioOnly,
            FilterArg::Storyboard => MediaFilter::Storyboard,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    let config_path = args.config.unwrap_or_else(AppSettings::default_path);
    let mut settings = AppSettings::load(&config_path)
        .with_context(|| format!("Failed to load settings from {:?}", config_path))?;
    if let Some(ytdlp) = args.ytdlp {
        settings.ytdlp_path = Some(ytdlp);
    }

    let app = Tubeloader::from_settings(settings)?;

    // Ctrl-C cancels whatever is running
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    match args.command {
        Command::Info { url, filter, json } => run_info(&app, &url, filter.into(), json, &cancel).await,
        Command::Download {
            url,
            format,
            label,
            audio_label,
            resolution,
            filter,
            container,
            output,
        } => {
            let selection = match (format, label, resolution) {
                (Some(expr), _, _) => FormatSelection::parse(&expr),
                (_, Some(label), _) => {
                    let info = app.fetch_info(&url, &cancel).await?;
                    app.build_catalog(&info, filter.into())
                        .select(&label, audio_label.as_deref())?
                }
                (_, _, Some(res)) => FormatSelection::from_resolution(&res)
                    .with_context(|| format!("Not a resolution: {}", res))?,
                _ => FormatSelection::Best,
            };
            let options = container
                .map(DownloadOptions::for_container)
                .unwrap_or_default();
            run_download(&app, &url, selection, output, options, cancel).await
        }
        Command::Update => {
            let tag = app.check_and_update_tool().await?;
            println!("yt-dlp {} installed at {}", tag, app.ytdlp_path().display());
            Ok(())
        }
    }
}

async fn run_info(
    app: &Tubeloader,
    url: &str,
    filter: MediaFilter,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let info = app.fetch_info(url, cancel).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", info.title);
    let resolutions = distinct_resolutions(&info);
    if !resolutions.is_empty() {
        println!("Resolutions: {}", resolutions.join(", "));
    }

    let catalog = app.build_catalog(&info, filter);
    for label in catalog.labels() {
        println!("  {}", label);
    }
    if !catalog.audio_labels().is_empty() {
        println!("Audio:");
        for label in catalog.audio_labels() {
            println!("  {}", label);
        }
    }
    Ok(())
}

async fn run_download(
    app: &Tubeloader,
    url: &str,
    selection: FormatSelection,
    output: Option<PathBuf>,
    options: DownloadOptions,
    cancel: CancellationToken,
) -> Result<()> {
    let mut task = app.download_with_cancel(url, selection, output, options, cancel)?;

    let mut stdout = std::io::stdout();
    while let Some(event) = task.next_event().await {
        print!("\r{}", event);
        stdout.flush()?;
    }
    println!();

    match task.wait().await {
        Ok(()) => {
            println!("Download complete");
            Ok(())
        }
        Err(TubeloaderError::Cancelled) => {
            println!("Download cancelled");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
