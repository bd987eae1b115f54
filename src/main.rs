//! tunefetch command line.
//!
//! Downloads every track bookmarked in one Chrome bookmark folder, looks it
//! up in the Spotify catalog and tags the audio file.

mod progress;
mod prompt;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use colored::Colorize;
use core_runtime::config::{AppConfig, ConfigStore, DEFAULT_CONFIG_FILE};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_service::DownloadService;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

const CONFIG_ARG: &str = "config";

const LOG_LEVEL_ARG: &str = "log-level";

const LOG_FORMAT_ARG: &str = "log-format";

fn cli() -> Command {
    Command::new("tunefetch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Download bookmarked music, enrich it from the Spotify catalog and tag it")
        .arg(
            Arg::new(CONFIG_ARG)
                .long(CONFIG_ARG)
                .value_name("FILE")
                .help("Configuration file")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_CONFIG_FILE)
                .global(true),
        )
        .arg(
            Arg::new(LOG_LEVEL_ARG)
                .long(LOG_LEVEL_ARG)
                .value_name("LEVEL")
                .help("Minimum level of diagnostic output on stderr")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .default_value("warn")
                .global(true),
        )
        .arg(
            Arg::new(LOG_FORMAT_ARG)
                .long(LOG_FORMAT_ARG)
                .value_name("FORMAT")
                .help("Diagnostic output format")
                .value_parser(["compact", "pretty", "json"])
                .default_value("compact")
                .global(true),
        )
        .subcommand(Command::new("run").about("Download, tag and store every bookmarked track (default)"))
        .subcommand(
            Command::new("config")
                .visible_alias("configure")
                .alias("setup")
                .about("Configure settings interactively"),
        )
        .subcommand(Command::new("update").about("Download the latest yt-dlp release"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();

    if let Err(e) = init_tracing(effective_args(&matches)) {
        eprintln!("{} {:#}", "Logging disabled:".yellow(), e);
    }

    println!("{}", format!("tunefetch v{}", env!("CARGO_PKG_VERSION")).cyan());

    match dispatch(&matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Global flags as seen by the chosen subcommand.
fn effective_args(matches: &ArgMatches) -> &ArgMatches {
    matches.subcommand().map_or(matches, |(_, sub)| sub)
}

fn init_tracing(matches: &ArgMatches) -> Result<()> {
    let level: LogLevel = matches
        .get_one::<String>(LOG_LEVEL_ARG)
        .map(String::as_str)
        .unwrap_or("warn")
        .parse()?;
    let format: LogFormat = matches
        .get_one::<String>(LOG_FORMAT_ARG)
        .map(String::as_str)
        .unwrap_or("compact")
        .parse()?;

    init_logging(
        LoggingConfig::default()
            .with_level(level)
            .with_format(format)
            .with_env_override(),
    )?;
    Ok(())
}

async fn dispatch(matches: &ArgMatches) -> Result<()> {
    let config_path = effective_args(matches)
        .get_one::<PathBuf>(CONFIG_ARG)
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match matches.subcommand() {
        Some(("config", _)) => {
            let config = load_config(&config_path)?;
            configure(&config, &config_path)?;
            Ok(())
        }
        Some(("update", _)) => update(&config_path).await,
        Some(("run", _)) | None => run(&config_path).await,
        Some((other, _)) => Err(anyhow::anyhow!("Unknown command '{}'", other)),
    }
}

fn load_config(path: &Path) -> Result<AppConfig> {
    let config = ConfigStore::load(path)
        .with_context(|| format!("Could not load {}", path.display()))?;
    debug!(?config, "Configuration loaded");
    Ok(config)
}

/// Prompt on the terminal, then save.
fn configure(current: &AppConfig, path: &Path) -> Result<AppConfig> {
    let config = prompt::configure(current, &mut io::stdin().lock(), &mut io::stdout())?;

    match ConfigStore::save(path, &config) {
        Ok(()) => println!(
            "{}",
            format!("✔ Configuration saved to {}", path.display()).green()
        ),
        // The run can still use the entered values
        Err(e) => println!(
            "{}",
            format!("Could not save configuration: {}", e).red()
        ),
    }

    Ok(config)
}

async fn update(config_path: &Path) -> Result<()> {
    let mut config = load_config(config_path)?;
    let service = DownloadService::bootstrap_desktop(config.clone())?;

    println!("{}", "Downloading latest yt-dlp...".blue());
    let installed = service
        .dependency_setup()
        .update_extractor(&mut config)
        .await?;
    println!(
        "{}",
        format!("✔ yt-dlp updated: {}", installed.display()).green()
    );

    ConfigStore::save(config_path, &config)
        .with_context(|| format!("Could not save {}", config_path.display()))?;
    Ok(())
}

async fn run(config_path: &Path) -> Result<()> {
    let mut config = load_config(config_path)?;
    if config.needs_setup() {
        println!("{}", "Configuration needed. Running setup...".yellow());
        config = configure(&config, config_path)?;
    }

    let mut service = DownloadService::bootstrap_desktop(config)?;
    if !service.has_resolver() {
        println!(
            "{}",
            "Spotify credentials missing, files will be kept untagged".yellow()
        );
    }

    println!("{}", "Setting up dependencies...".cyan());
    let report = service.prepare().await?;
    match (&report.extractor_updated, &report.update_warning) {
        (Some(path), _) => println!(
            "{}",
            format!("✔ yt-dlp updated: {}", path.display()).green()
        ),
        (None, Some(warning)) => println!(
            "{}",
            format!("Could not update yt-dlp: {}", warning).yellow()
        ),
        (None, None) => {}
    }
    println!("{}", format!("✔ Found {}", report.tagger_version).green());

    println!("{}", "Parsing bookmarks...".cyan());
    let tracks = service.load_tracks()?;
    if tracks.is_empty() {
        println!("{}", "No tracks found in bookmarks".yellow());
        return Ok(());
    }
    println!(
        "{}",
        format!("Found {} tracks to download", tracks.len()).green()
    );

    let renderer = progress::spawn_renderer(service.events().subscribe(), tracks.len());
    let result = service.run(tracks).await;
    renderer.await.ok();

    for line in progress::summary_lines(&result) {
        println!("{}", line);
    }
    println!(
        "{}",
        format!(
            "Processing complete: {} succeeded, {} failed. Files in {}",
            result.succeeded(),
            result.failed(),
            service.config().music_directory.display()
        )
        .green()
    );

    // Track failures are reported above and do not change the exit code
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn test_run_is_the_default() {
        let matches = cli().try_get_matches_from(["tunefetch"]).unwrap();
        assert!(matches.subcommand().is_none());
        assert_eq!(
            matches.get_one::<PathBuf>(CONFIG_ARG),
            Some(&PathBuf::from(DEFAULT_CONFIG_FILE))
        );
        assert_eq!(
            matches.get_one::<String>(LOG_LEVEL_ARG).map(String::as_str),
            Some("warn")
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = cli()
            .try_get_matches_from(["tunefetch", "update", "--config", "alt.json", "--log-format", "json"])
            .unwrap();
        let sub = effective_args(&matches);

        assert_eq!(matches.subcommand_name(), Some("update"));
        assert_eq!(sub.get_one::<PathBuf>(CONFIG_ARG), Some(&PathBuf::from("alt.json")));
        assert_eq!(
            sub.get_one::<String>(LOG_FORMAT_ARG).map(String::as_str),
            Some("json")
        );
    }

    #[test]
    fn test_config_aliases() {
        for alias in ["config", "configure", "setup"] {
            let matches = cli().try_get_matches_from(["tunefetch", alias]).unwrap();
            assert_eq!(matches.subcommand_name(), Some("config"));
        }
    }

    #[tokio::test]
    async fn test_unregistered_subcommand_is_an_error() {
        let matches = cli()
            .subcommand(Command::new("bogus"))
            .try_get_matches_from(["tunefetch", "bogus"])
            .unwrap();

        let err = dispatch(&matches).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown command 'bogus'");
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        assert!(cli()
            .try_get_matches_from(["tunefetch", "--log-level", "loud"])
            .is_err());
    }
}
