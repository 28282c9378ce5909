mod cli;

use jocus::{config, fetch::HttpFetcher, packager::StreamPackager};
use jocus_av::FfmpegTranscoder;
use jocus_storage::GcsStore;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "jocus=trace,jocus_av=trace,jocus_storage=trace,jocus_hls=debug".to_string()
        } else {
            "jocus=info,jocus_av=info,jocus_storage=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Package {
            source_url,
            destination_prefix,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(package(
                &source_url,
                &destination_prefix,
                cli.config.as_deref(),
            ))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, json))
        }
        Commands::CheckTools => check_tools(),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("jocus {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn package(
    source_url: &str,
    destination_prefix: &str,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let fetcher = HttpFetcher::new(Duration::from_secs(config.fetch.timeout_secs))?;
    let transcoder = FfmpegTranscoder::with_tool_paths(
        config.tools.ffmpeg_path.as_deref(),
        config.tools.ffprobe_path.as_deref(),
    )?;
    let store = GcsStore::from_config(&config.storage)?;

    let packager = StreamPackager::new(Arc::new(fetcher), Arc::new(transcoder), Arc::new(store));

    let manifest_url = packager.package(source_url, destination_prefix).await?;
    println!("{}", manifest_url);

    Ok(())
}

async fn probe_file(file: &std::path::Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let media_info = jocus_av::probe(file).await?;

    if json {
        let json_str = serde_json::to_string_pretty(&media_info)?;
        println!("{}", json_str);
    } else {
        println!("File: {}", media_info.file_path.display());
        println!("Container: {}", media_info.container);
        println!("Size: {} bytes", media_info.file_size);
        if let Some(ref duration) = media_info.duration {
            let secs = duration.as_secs();
            let mins = secs / 60;
            println!("Duration: {:02}:{:02}", mins, secs % 60);
        }

        println!("\nVideo Tracks: {}", media_info.video_tracks.len());
        for (i, track) in media_info.video_tracks.iter().enumerate() {
            print!("  [{}] {} {}x{}", i, track.codec, track.width, track.height);
            if let Some(fps) = track.frame_rate {
                print!(", {:.3} fps", fps);
            }
            println!();
        }

        println!("\nAudio Tracks: {}", media_info.audio_tracks.len());
        for (i, track) in media_info.audio_tracks.iter().enumerate() {
            print!("  [{}] {} {}ch", i, track.codec, track.channels);
            if let Some(rate) = track.sample_rate {
                print!(", {} Hz", rate);
            }
            println!();
        }
    }

    Ok(())
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = jocus_av::check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable packaging.");
    }

    Ok(())
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Bucket: {}", config.storage.bucket);
            println!("  Storage host: {}", config.storage.host);
            println!("  Fetch timeout: {}s", config.fetch.timeout_secs);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Storage host: {}", config.storage.host);
            println!("  Fetch timeout: {}s", config.fetch.timeout_secs);
        }
    }

    Ok(())
}
