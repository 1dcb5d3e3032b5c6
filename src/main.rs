use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use url::Url;

use playlist_bridge::migrator::{
    CancelFlag, FlowEvent, MigrationState, fetch_all, state::default_target_name,
};
use playlist_bridge::spotify::parse_playlist_id;
use playlist_bridge::{
    Config, MigrationFlow, MigrationOrchestrator, MigrationReport, MusicPlatform, PlatformKind,
    Platforms, PlaylistDescriptor, RefreshingCredentials, SpotifyClient, Track, YouTubeClient,
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "playlist-bridge")]
#[command(about = "Migrate playlists between Spotify and YouTube")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    Spotify,
    #[value(alias = "yt")]
    Youtube,
}

impl From<PlatformArg> for PlatformKind {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Spotify => PlatformKind::Spotify,
            PlatformArg::Youtube => PlatformKind::YouTube,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the playlists you own on a platform
    ListPlaylists {
        #[arg(long, value_enum)]
        platform: PlatformArg,
    },

    /// Show the tracks of a playlist, numbered for --select
    Tracks {
        #[arg(long, value_enum)]
        platform: PlatformArg,

        /// Playlist id or link
        playlist: String,
    },

    /// Copy a playlist into a new playlist on the other platform
    Migrate {
        /// Platform the playlist lives on
        #[arg(long, value_enum)]
        from: PlatformArg,

        /// Playlist id or link
        playlist: String,

        /// Name of the new playlist (defaults to "<name> (YT)" or "<name> (Spotify)")
        #[arg(long)]
        name: Option<String>,

        /// Tracks to migrate by position, e.g. "1,3,5-8" (defaults to all)
        #[arg(long)]
        select: Option<String>,

        /// Resolve tracks without creating a playlist
        #[arg(long)]
        dry_run: bool,
    },

    /// Show setup guide
    Setup,
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match cli.command {
        Commands::ListPlaylists { platform } => {
            list_playlists(platform.into()).await?;
        }
        Commands::Tracks { platform, playlist } => {
            show_tracks(platform.into(), &playlist).await?;
        }
        Commands::Migrate {
            from,
            playlist,
            name,
            select,
            dry_run,
        } => {
            migrate(from.into(), &playlist, name, select.as_deref(), dry_run).await?;
        }
        Commands::Setup => {
            show_setup_guide();
        }
    }

    Ok(())
}

/// Load config and exit with a list of what is missing for `needed`.
fn load_config(needed: &[PlatformKind]) -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let missing: Vec<String> = config
        .get_missing_config()
        .into_iter()
        .filter(|name| {
            needed.iter().any(|kind| match kind {
                PlatformKind::Spotify => name.starts_with("SPOTIFY_"),
                PlatformKind::YouTube => name.starts_with("YOUTUBE_"),
            })
        })
        .collect();

    if !missing.is_empty() {
        println!("{}", "Missing configuration:".red());
        for item in &missing {
            println!("   - {}", item);
        }
        println!(
            "\n{}",
            "Run `playlist-bridge setup` and fill in your .env file.".yellow()
        );
        std::process::exit(1);
    }

    Ok(config)
}

fn connect(config: &Config) -> Result<Platforms> {
    let http_client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;
    let credentials = Arc::new(RefreshingCredentials::from_config(
        http_client.clone(),
        config,
    ));

    let spotify = SpotifyClient::new(credentials.clone());
    let youtube = YouTubeClient::with_http_client(http_client, credentials);

    Ok(Platforms::new(Arc::new(spotify), Arc::new(youtube)))
}

/// Accepts a bare playlist id or a link to the playlist.
fn playlist_id_arg(platform: PlatformKind, raw: &str) -> String {
    let raw = raw.trim();
    match platform {
        PlatformKind::Spotify => parse_playlist_id(raw).unwrap_or_else(|_| raw.to_string()),
        PlatformKind::YouTube => Url::parse(raw)
            .ok()
            .and_then(|url| {
                url.query_pairs()
                    .find(|(key, _)| key == "list")
                    .map(|(_, value)| value.into_owned())
            })
            .unwrap_or_else(|| raw.to_string()),
    }
}

/// Look the playlist up among the user's own playlists; fall back to the bare id for
/// playlists the user follows but does not own.
async fn load_playlist(
    platform: &dyn MusicPlatform,
    raw: &str,
    page_size: u32,
) -> Result<(PlaylistDescriptor, Vec<Track>)> {
    let id = playlist_id_arg(platform.kind(), raw);

    let owned = platform
        .list_playlists()
        .await
        .with_context(|| format!("Failed to fetch {} playlists", platform.kind()))?;
    let descriptor = owned.into_iter().find(|p| p.id == id);

    let tracks = fetch_all(platform, &id, page_size)
        .await
        .with_context(|| format!("Failed to fetch tracks of {} playlist {}", platform.kind(), id))?;

    let descriptor = descriptor.unwrap_or_else(|| PlaylistDescriptor {
        id: id.clone(),
        display_name: id.clone(),
        item_count: tracks.len() as u32,
    });

    Ok((descriptor, tracks))
}

async fn list_playlists(platform: PlatformKind) -> Result<()> {
    println!("{}", format!("Your {} Playlists", platform).cyan().bold());
    println!("{}", "=".repeat(50));

    let config = load_config(&[platform])?;
    let platforms = connect(&config)?;

    let playlists = platforms
        .get(platform)
        .list_playlists()
        .await
        .context("Failed to fetch playlists")?;

    if playlists.is_empty() {
        println!("{}", "No playlists found".yellow());
        return Ok(());
    }

    for (i, playlist) in playlists.iter().enumerate() {
        println!(
            "{:2}. {} ({} tracks)",
            i + 1,
            playlist.display_name.green(),
            playlist.item_count
        );
        println!("     {}", playlist.id.cyan());
    }

    println!("\n{}", format!("Total: {} playlists", playlists.len()).cyan());

    Ok(())
}

async fn show_tracks(platform: PlatformKind, raw: &str) -> Result<()> {
    let config = load_config(&[platform])?;
    let platforms = connect(&config)?;

    let (playlist, tracks) =
        load_playlist(platforms.get(platform).as_ref(), raw, config.page_size).await?;

    println!(
        "{}",
        format!("{} ({} tracks)", playlist.display_name, tracks.len())
            .cyan()
            .bold()
    );
    println!("{}", "=".repeat(50));
    print_tracks(&tracks);

    Ok(())
}

fn print_tracks(tracks: &[Track]) {
    for (i, track) in tracks.iter().enumerate() {
        println!("{:3}. {} - {}", i + 1, track.artist, track.title.green());
    }
}

/// Parse 1-based positions like `"1,3,5-8"` into indexes into a list of `len` tracks.
fn parse_selection(spec: &str, len: usize) -> Result<Vec<usize>> {
    let mut indexes = Vec::new();

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((a, b)) => (a.trim().parse::<usize>()?, b.trim().parse::<usize>()?),
            None => {
                let n = part.parse::<usize>()?;
                (n, n)
            }
        };
        if start == 0 || end < start || end > len {
            bail!("selection {} is outside 1-{}", part, len);
        }
        indexes.extend((start - 1)..end);
    }

    if indexes.is_empty() {
        bail!("selection is empty");
    }
    Ok(indexes)
}

async fn migrate(
    source: PlatformKind,
    raw_playlist: &str,
    name: Option<String>,
    select: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let target = source.other();
    println!(
        "{}",
        format!("{} to {} Playlist Migration", source, target)
            .cyan()
            .bold()
    );
    println!("{}", "=".repeat(50));

    if dry_run {
        println!("{}", "DRY RUN MODE - No playlist will be created".yellow());
    }

    let config = load_config(&[source, target])?;
    let platforms = connect(&config)?;
    let mut flow = MigrationFlow::new();

    flow.apply(FlowEvent::SelectPlatform(source))?;

    let (playlist, tracks) =
        load_playlist(platforms.get(source).as_ref(), raw_playlist, config.page_size).await?;
    println!(
        "Source: {} ({} tracks)",
        playlist.display_name.green(),
        tracks.len()
    );
    if tracks.is_empty() {
        println!("{}", "Playlist has no tracks to migrate".yellow());
        return Ok(());
    }

    let selected: Vec<Track> = match select {
        Some(spec) => parse_selection(spec, tracks.len())?
            .into_iter()
            .map(|i| tracks[i].clone())
            .collect(),
        None => tracks.clone(),
    };
    let target_name = name.unwrap_or_else(|| default_target_name(&playlist.display_name, target));

    flow.apply(FlowEvent::SelectPlaylist { playlist, tracks })?;
    flow.apply(FlowEvent::ConfirmTracks(selected))?;
    flow.apply(FlowEvent::Rename(target_name.clone()))?;
    flow.apply(FlowEvent::Start)?;

    println!("Target: new {} playlist {}", target, target_name.green());

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "\nCancelling after the current track...".yellow());
            on_interrupt.cancel();
        }
    });

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}% {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );
    let bar = pb.clone();

    let orchestrator = MigrationOrchestrator::new(&platforms, source)
        .with_cancel_flag(cancel)
        .with_progress(Box::new(move |progress| {
            bar.set_position(progress.percent.round() as u64);
            if let Some(current) = progress.current {
                bar.set_message(format!("{}/{} {}", progress.processed, progress.total, current));
            }
        }));

    flow.run(&orchestrator, dry_run).await?;

    match flow.state() {
        MigrationState::Results { job } => {
            pb.finish_with_message("Migration complete");

            let report = MigrationReport::from_job(job, dry_run);
            report.print_summary();
            report
                .save(&config.results_dir)
                .context("Failed to save migration results")?;

            if dry_run {
                println!("\n{}", "Dry run completed - no changes made".yellow());
            } else {
                println!("\n{}", "Migration completed!".green());
            }
        }
        MigrationState::ConfiguringTarget {
            error: Some(error), ..
        } => {
            pb.abandon_with_message("Playlist creation failed");
            println!("\n{} {}", "Could not create the target playlist:".red(), error);
            if let Some(url) = error.remediation_url() {
                println!("Fix it here, then run the migration again: {}", url.cyan());
            }
            std::process::exit(1);
        }
        other => bail!("migration stopped unexpectedly while {}", other),
    }

    Ok(())
}

fn show_setup_guide() {
    println!("{}", "Playlist Bridge Setup Guide".cyan().bold());
    println!("{}", "=".repeat(50));

    println!("\n{}", "1. Spotify API Setup".yellow());
    println!("   - Go to https://developer.spotify.com/dashboard/");
    println!("   - Create a new app and copy its Client ID and Client Secret");
    println!("   - Authorize it with the playlist-read-private, playlist-modify-private");
    println!("     and playlist-modify-public scopes and keep the refresh token");

    println!("\n{}", "2. YouTube Data API Setup".yellow());
    println!("   - Go to https://console.cloud.google.com/ and enable YouTube Data API v3");
    println!("   - Create an OAuth client (Desktop app) and copy its ID and secret");
    println!("   - Authorize it with the https://www.googleapis.com/auth/youtube scope");
    println!("     and keep the refresh token");
    println!("   - The account needs a YouTube channel to create playlists:");
    println!("     https://www.youtube.com/create_channel");

    println!("\n{}", "3. Configuration".yellow());
    println!("   - Create a .env file with:");
    println!("     SPOTIFY_CLIENT_ID=your_spotify_client_id");
    println!("     SPOTIFY_CLIENT_SECRET=your_spotify_client_secret");
    println!("     SPOTIFY_REFRESH_TOKEN=your_spotify_refresh_token");
    println!("     YOUTUBE_CLIENT_ID=your_google_client_id");
    println!("     YOUTUBE_CLIENT_SECRET=your_google_client_secret");
    println!("     YOUTUBE_REFRESH_TOKEN=your_google_refresh_token");
    println!("   - Optional: PLAYLIST_BRIDGE_PAGE_SIZE (1-50), PLAYLIST_BRIDGE_RESULTS_DIR");

    println!("\n{}", "4. Usage".yellow());
    println!("   - playlist-bridge list-playlists --platform spotify");
    println!("   - playlist-bridge tracks --platform spotify <playlist>");
    println!("   - playlist-bridge migrate --from spotify <playlist> --dry-run");
    println!("   - playlist-bridge migrate --from youtube <playlist> --select 1-10");

    println!("\n{}", "Ready to start migrating!".green());
}
