mod clock;
mod config;
mod lyrics;
mod session;

use anyhow::Context;
use clap::{Parser, Subcommand};
use clock::ClockControl;
use lyrics::{LyricLine, LyricsService, LyricsWindow, LrclibClient, ParsedLyrics, TrackQuery};
use session::{LyricsState, PlaybackEvent, SessionUpdate};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lrcsync", version, about = "Parse LRC lyrics and follow them against playback")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a lyrics file (`-` for stdin) and print its lines.
    Parse {
        file: PathBuf,
        /// Print JSON instead of text.
        #[arg(long, conflicts_with = "lrc")]
        json: bool,
        /// Print normalized LRC.
        #[arg(long)]
        lrc: bool,
    },
    /// Show the active line at a playback position (ms, ss.fff or mm:ss.fff).
    At {
        file: PathBuf,
        position: String,
        /// Lines shown around the active one (config default otherwise).
        #[arg(long)]
        context: Option<usize>,
    },
    /// Follow lyrics in real time with a simulated playback clock.
    ///
    /// While running, type `pause`, `resume` or `seek <pos>` and press enter.
    Follow {
        file: PathBuf,
        /// Start position.
        #[arg(long)]
        from: Option<String>,
        /// Stop position (defaults to shortly after the last timed line).
        #[arg(long)]
        duration: Option<String>,
        /// Playback speed multiplier.
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
    /// Look lyrics up on LRCLIB.
    Fetch {
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        #[arg(long)]
        album: Option<String>,
        /// Track length in seconds, helps exact matching.
        #[arg(long)]
        duration: Option<u32>,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Config file management.
    Config {
        #[command(subcommand)]
        cmd: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the config file location.
    Path,
    /// Overwrite the config file with defaults.
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command {
        Command::Parse { file, json, lrc } => {
            let lyrics = load_lyrics(&file).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(lyrics.lines())?);
            } else if lrc {
                print!("{}", lyrics.to_lrc());
            } else {
                print_lines(lyrics.lines());
            }
        }
        Command::At {
            file,
            position,
            context,
        } => {
            let lyrics = load_lyrics(&file).await?;
            let position_ms = clock::parse_position(&position)?;
            let active = lyrics::active_index(lyrics.lines(), position_ms);
            let context = context.unwrap_or(cfg.lyrics.context_lines);
            if active.is_none() {
                println!("(no active line at {position_ms} ms)");
            }
            print_window(&LyricsWindow::around(lyrics.lines(), active, context));
        }
        Command::Follow {
            file,
            from,
            duration,
            speed,
        } => {
            let lyrics = load_lyrics(&file).await?;
            follow(&cfg, lyrics, &file, from.as_deref(), duration.as_deref(), speed).await?;
        }
        Command::Fetch {
            title,
            artist,
            album,
            duration,
            json,
        } => {
            let client = LrclibClient::new(&cfg.lrclib.base_url, cfg.lrclib.timeout())?;
            let mut service = LyricsService::new(client, cfg.lrclib.cache_capacity);
            let query = TrackQuery {
                title,
                artist,
                album,
                duration_secs: duration,
            };
            match service.lookup(&query).await.context("fetch lyrics")? {
                Some(lyrics) if json => {
                    println!("{}", serde_json::to_string_pretty(lyrics.lines())?)
                }
                Some(lyrics) => print_lines(lyrics.lines()),
                None => anyhow::bail!("no lyrics found for {} - {}", query.artist, query.title),
            }
        }
        Command::Config { cmd } => match cmd {
            ConfigCommand::Path => {
                let path = match cli.config {
                    Some(p) => p,
                    None => config::default_config_path().context("default config path")?,
                };
                println!("{}", path.display());
            }
            ConfigCommand::Reset => {
                config::save(&config::Config::default(), cli.config.as_deref())
                    .context("save config")?;
                println!("Config reset to defaults.");
            }
        },
    }

    Ok(())
}

async fn load_lyrics(path: &Path) -> anyhow::Result<ParsedLyrics> {
    let raw = lyrics::load_raw(path).await?;
    let lyrics = ParsedLyrics::parse(&raw);
    if lyrics.is_empty() && !raw.trim().is_empty() {
        tracing::warn!(path = %path.display(), "could not find any lyrics lines");
    } else if !lyrics.is_synced() {
        tracing::info!(path = %path.display(), "lyrics have no timestamps");
    }
    Ok(lyrics)
}

async fn follow(
    cfg: &config::Config,
    lyrics: ParsedLyrics,
    file: &Path,
    from: Option<&str>,
    duration: Option<&str>,
    speed: f64,
) -> anyhow::Result<()> {
    if speed <= 0.0 || !speed.is_finite() {
        anyhow::bail!("speed must be positive, got {speed}");
    }
    let start_ms = from.map(clock::parse_position).transpose()?.unwrap_or(0);
    let end_ms = match duration {
        Some(d) => clock::parse_position(d)?,
        None => clock::PlaybackClock::default_end(lyrics.lines(), cfg.lyrics.tail_ms),
    }
    .max(start_ms);

    let (ev_tx, ev_rx) = mpsc::channel::<PlaybackEvent>(64);
    let (up_tx, mut up_rx) = mpsc::channel::<SessionUpdate>(64);
    let (ctl_tx, ctl_rx) = mpsc::channel::<ClockControl>(8);

    ev_tx
        .send(PlaybackEvent::LyricsLoaded(lyrics.clone()))
        .await
        .context("start session")?;
    let session = tokio::spawn(session::run(LyricsState::new(), ev_rx, up_tx));

    let playback = clock::PlaybackClock {
        start_ms,
        end_ms,
        poll_interval: cfg.lyrics.poll_interval(),
        speed,
    };
    tracing::info!(start_ms, end_ms, speed, "following lyrics");
    tokio::spawn(playback.run(ev_tx, ctl_rx));

    // Stdin carries the lyrics themselves when reading from `-`.
    if file.as_os_str() != "-" {
        spawn_control_reader(ctl_tx);
    }

    let context = cfg.lyrics.context_lines;
    while let Some(update) = up_rx.recv().await {
        match update {
            SessionUpdate::ActiveLine { index, .. } => {
                println!();
                print_window(&LyricsWindow::around(lyrics.lines(), index, context));
            }
            SessionUpdate::Finished => break,
        }
    }

    let state = session.await.context("session task")?;
    tracing::debug!(
        position_ms = state.position_ms,
        active = ?state.active(),
        paused = state.paused,
        finished = state.finished,
        "playback stopped"
    );
    Ok(())
}

/// Read pause/resume/seek commands from the terminal.
///
/// Runs on its own thread: a blocking stdin read would otherwise hold up
/// runtime shutdown.
fn spawn_control_reader(tx: mpsc::Sender<ClockControl>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match ClockControl::parse(&line) {
                Ok(ctl) => {
                    if tx.blocking_send(ctl).is_err() {
                        break;
                    }
                }
                Err(e) => tracing::warn!("{e:#}"),
            }
        }
    });
}

fn print_lines(lines: &[LyricLine]) {
    for line in lines {
        println!("[{}] {}", line.timestamp, line.text);
    }
}

fn print_window(window: &LyricsWindow<'_>) {
    for (i, line) in window.lines.iter().enumerate() {
        let prefix = if window.active == Some(i) { "♪ " } else { "  " };
        println!("{prefix}[{}] {}", line.timestamp, line.text);
    }
}
