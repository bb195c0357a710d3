mod config;
mod error;
mod fetch;
mod parser;
mod server;
mod sidecar;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use config::{ExtractOptions, FetchConfig, ServerConfig};
use error::ScrapeError;

#[derive(Parser)]
#[command(
    name = "match_scraper",
    about = "Tournament match scraper: playlists from match exports, live schedules from the web"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the combined playlist from exported match-list HTML files
    Playlist {
        /// Input HTML files (e.g. matches_saturday.html matches_sunday.html)
        #[arg(required = true)]
        html: Vec<PathBuf>,
        /// players.json to update under the "playlist" key
        #[arg(long, default_value = config::DEFAULT_SIDECAR_PATH)]
        players_json: PathBuf,
        /// Also write the playlist JSON to this file
        #[arg(long)]
        out: Option<PathBuf>,
        /// Do not modify players.json; print the playlist instead
        #[arg(long)]
        no_update: bool,
        /// Strip trailing seed markers like [1] / [2] from names
        #[arg(long)]
        strip_seed: bool,
    },
    /// Fetch a live schedule page and print its open matches
    Scrape {
        url: String,
        /// Keep seed markers on player names
        #[arg(long)]
        keep_seed: bool,
        /// Request timeout in seconds
        #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
    },
    /// Serve the scrape API and the front-end
    Serve {
        #[arg(short, long, default_value_t = config::DEFAULT_PORT)]
        port: u16,
        /// Directory holding the built front-end
        #[arg(long, default_value = config::DEFAULT_STATIC_DIR)]
        static_dir: String,
        /// Upstream request timeout in seconds
        #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
        timeout: u64,
        /// Keep seed markers on player names
        #[arg(long)]
        keep_seed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // stdout carries JSON; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Playlist {
            html,
            players_json,
            out,
            no_update,
            strip_seed,
        } => run_playlist(
            &html,
            &players_json,
            out.as_deref(),
            no_update,
            ExtractOptions { strip_seed },
        ),
        Commands::Scrape {
            url,
            keep_seed,
            timeout,
        } => run_scrape(&url, keep_seed, timeout).await,
        Commands::Serve {
            port,
            static_dir,
            timeout,
            keep_seed,
        } => {
            server::start_http_server(ServerConfig {
                port,
                static_dir,
                fetch: FetchConfig::with_timeout_secs(timeout),
                extract: ExtractOptions {
                    strip_seed: !keep_seed,
                },
            })
            .await
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        info!("Done in {}", format_duration(elapsed));
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.downcast_ref::<ScrapeError>().map_or(1, ScrapeError::exit_code);
            eprintln!("{:#}", e);
            ExitCode::from(code)
        }
    }
}

fn run_playlist(
    paths: &[PathBuf],
    players_json: &Path,
    out: Option<&Path>,
    no_update: bool,
    opts: ExtractOptions,
) -> Result<()> {
    let missing: Vec<PathBuf> = paths.iter().filter(|p| !p.exists()).cloned().collect();
    if !missing.is_empty() {
        return Err(ScrapeError::MissingInput(missing).into());
    }

    let documents = read_documents(paths)?;
    let playlist = parser::build_playlist(&documents, opts)?;
    log_summary(&playlist);

    if let Some(out) = out {
        sidecar::write_json(out, &playlist)?;
        info!("Wrote playlist to {}", out.display());
    }

    if no_update {
        print!("{}", sidecar::to_pretty_json(&playlist)?);
        return Ok(());
    }

    sidecar::merge_playlist(players_json, &playlist)?;
    info!("Updated {} ({} disciplines)", players_json.display(), playlist.disciplines().count());
    Ok(())
}

fn log_summary(playlist: &parser::Playlist) {
    for discipline in playlist.disciplines() {
        for level in playlist.level_keys(discipline) {
            let count = playlist
                .get(discipline, level)
                .map_or(0, parser::playlist::LevelEntries::entry_count);
            debug!("{} {}: {} entries", discipline, level, count);
        }
    }
}

/// Read every input in parallel; invalid UTF-8 is replaced, not fatal.
fn read_documents(paths: &[PathBuf]) -> Result<Vec<String>> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("#>-"),
    );

    let documents = paths
        .par_iter()
        .map(|path| {
            let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            pb.inc(1);
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        })
        .collect::<Result<Vec<_>>>()?;

    pb.finish_and_clear();
    Ok(documents)
}

async fn run_scrape(url: &str, keep_seed: bool, timeout: u64) -> Result<()> {
    let fetcher = fetch::PageFetcher::new(&FetchConfig::with_timeout_secs(timeout))?;
    let opts = ExtractOptions {
        strip_seed: !keep_seed,
    };
    let matches = fetcher.scrape_matches(url, &opts).await?;
    print!("{}", sidecar::to_pretty_json(&matches)?);
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_inputs_reported_together() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("saturday.html");
        fs::write(&present, "").unwrap();
        let paths = vec![dir.path().join("a.html"), present, dir.path().join("b.html")];

        let err = run_playlist(&paths, &dir.path().join("players.json"), None, true, ExtractOptions::default())
            .unwrap_err();
        match err.downcast_ref::<ScrapeError>() {
            Some(ScrapeError::MissingInput(missing)) => assert_eq!(missing.len(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn merge_requires_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![PathBuf::from("tests/fixtures/matches_saturday.html")];
        let err = run_playlist(&paths, &dir.path().join("players.json"), None, false, ExtractOptions::default())
            .unwrap_err();
        assert_eq!(err.downcast_ref::<ScrapeError>().map(ScrapeError::exit_code), Some(2));
    }

    #[test]
    fn writes_standalone_and_merges() {
        let dir = tempfile::tempdir().unwrap();
        let sidecar = dir.path().join("players.json");
        let out = dir.path().join("playlist.json");
        fs::write(&sidecar, r#"{"players": []}"#).unwrap();
        let paths = vec![
            PathBuf::from("tests/fixtures/matches_saturday.html"),
            PathBuf::from("tests/fixtures/matches_sunday.html"),
        ];

        run_playlist(&paths, &sidecar, Some(&out), false, ExtractOptions { strip_seed: true }).unwrap();

        let standalone = fs::read_to_string(&out).unwrap();
        assert!(standalone.ends_with("}\n"));
        let merged = sidecar::load_json(&sidecar).unwrap();
        assert_eq!(merged["players"], serde_json::json!([]));
        assert_eq!(merged["playlist"], serde_json::from_str::<serde_json::Value>(&standalone).unwrap());

        // Second run over the same inputs leaves identical bytes.
        let first = fs::read(&sidecar).unwrap();
        run_playlist(&paths, &sidecar, None, false, ExtractOptions { strip_seed: true }).unwrap();
        assert_eq!(fs::read(&sidecar).unwrap(), first);
    }

    #[test]
    fn lossy_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.html");
        fs::write(&path, b"<p>Ren\xe9</p>").unwrap();
        let docs = read_documents(&[path]).unwrap();
        assert_eq!(docs[0], "<p>Ren\u{fffd}</p>");
    }

    #[test]
    fn cli_parses_playlist_flags() {
        let cli = Cli::try_parse_from([
            "match_scraper", "playlist", "a.html", "b.html", "--strip-seed", "--no-update",
        ])
        .unwrap();
        match cli.command {
            Commands::Playlist { html, players_json, no_update, strip_seed, out } => {
                assert_eq!(html.len(), 2);
                assert_eq!(players_json, PathBuf::from(config::DEFAULT_SIDECAR_PATH));
                assert!(no_update && strip_seed);
                assert!(out.is_none());
            }
            _ => panic!("expected playlist command"),
        }
    }

    #[test]
    fn cli_requires_inputs() {
        assert!(Cli::try_parse_from(["match_scraper", "playlist"]).is_err());
    }

    #[test]
    fn duration_format() {
        assert_eq!(format_duration(std::time::Duration::from_secs(75)), "1m 15s");
        assert_eq!(format_duration(std::time::Duration::from_secs(3725)), "1h 2m 5s");
    }
}
