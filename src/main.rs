use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use donation_relay::{
    prepare, Classifier, Config, Dispatcher, GmailClient, HttpRecordSink, Relay, SpotifyClient,
};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "donation-relay",
    about = "Turn donation notification mails into Spotify actions and donation records",
    arg_required_else_help = true
)]
struct Cli {
    #[arg(short, long, default_value = "donation-relay.toml", env = "DONATION_RELAY_CONFIG")]
    config: PathBuf,

    #[command(flatten)]
    secrets: Secrets,

    #[command(subcommand)]
    command: Commands,
}

/// Credentials, normally taken from the environment.
#[derive(Args, Debug)]
struct Secrets {
    #[arg(long, env = "DONATION_RELAY_GMAIL_CLIENT_ID", hide_env_values = true)]
    gmail_client_id: Option<String>,
    #[arg(long, env = "DONATION_RELAY_GMAIL_CLIENT_SECRET", hide_env_values = true)]
    gmail_client_secret: Option<String>,
    #[arg(long, env = "DONATION_RELAY_GMAIL_REFRESH_TOKEN", hide_env_values = true)]
    gmail_refresh_token: Option<String>,
    #[arg(long, env = "DONATION_RELAY_SPOTIFY_CLIENT_ID", hide_env_values = true)]
    spotify_client_id: Option<String>,
    #[arg(long, env = "DONATION_RELAY_SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    spotify_client_secret: Option<String>,
    #[arg(long, env = "DONATION_RELAY_SPOTIFY_REFRESH_TOKEN", hide_env_values = true)]
    spotify_refresh_token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the mailbox until interrupted
    Run,
    /// Show what would happen for a saved notification body (no side effects)
    Parse {
        #[arg(help = "File containing the HTML body")]
        file: PathBuf,
    },
    /// Validate the configuration and print it
    CheckConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    apply_secrets(&mut config, cli.secrets);

    match cli.command {
        Commands::Run => run(config).await,
        Commands::Parse { file } => {
            let body = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let classifier = Classifier::new(&config.bar_words, config.thresholds.min_spotify_skip_amount);
            let prepared = prepare(&body, &classifier)?;
            let decision = donation_relay::decide(&prepared, &config.thresholds, false);
            println!("{}", serde_json::to_string_pretty(&decision)?);
            Ok(())
        }
        Commands::CheckConfig => {
            println!("Poll interval: {}s", config.poll_interval_secs);
            println!("Sender: {}", config.mailbox.sender);
            println!("Collector: {}", config.sink.url);
            println!(
                "Thresholds: tts {}€, spotify {}€, skip {}€",
                config.thresholds.min_tts_amount,
                config.thresholds.min_spotify_amount,
                config.thresholds.min_spotify_skip_amount
            );
            println!("Bar words: {}", config.bar_words.len());
            println!(
                "Gmail credentials: {}",
                if config.mailbox.credentials.is_complete() { "ok" } else { "missing" }
            );
            println!(
                "Spotify credentials: {}",
                if config.spotify.credentials.is_complete() { "ok" } else { "missing" }
            );
            Ok(())
        }
    }
}

async fn run(config: Config) -> Result<()> {
    if !config.mailbox.credentials.is_complete() {
        anyhow::bail!("gmail client id, client secret and refresh token are required");
    }
    if !config.spotify.credentials.is_complete() {
        anyhow::bail!("spotify client id, client secret and refresh token are required");
    }

    let mailbox = GmailClient::new(config.gmail())?;
    let music = SpotifyClient::new(config.spotify())?;
    let sink = HttpRecordSink::new(&config.sink.url, config.timeout(), config.proxy_url.as_deref())?;

    let dispatcher = Dispatcher::new(
        config.thresholds,
        config.volume,
        &config.spotify.title_separator,
        Box::new(music),
        Box::new(sink),
    );
    let classifier = Classifier::new(&config.bar_words, config.thresholds.min_spotify_skip_amount);
    let mut relay = Relay::new(Box::new(mailbox), classifier, dispatcher, config.poll_interval());

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received, finishing current notification");
                let _ = tx.send(true);
            }
            Err(e) => error!("failed to listen for interrupt: {e}"),
        }
        // keep the sender alive so the relay does not treat this as shutdown
        std::future::pending::<()>().await;
    });

    info!("monitoring for new emails from {}", config.mailbox.sender);
    relay.run(rx).await;
    Ok(())
}

fn apply_secrets(config: &mut Config, secrets: Secrets) {
    let overrides = [
        (&mut config.mailbox.credentials.client_id, secrets.gmail_client_id),
        (&mut config.mailbox.credentials.client_secret, secrets.gmail_client_secret),
        (&mut config.mailbox.credentials.refresh_token, secrets.gmail_refresh_token),
        (&mut config.spotify.credentials.client_id, secrets.spotify_client_id),
        (&mut config.spotify.credentials.client_secret, secrets.spotify_client_secret),
        (&mut config.spotify.credentials.refresh_token, secrets.spotify_refresh_token),
    ];
    for (slot, value) in overrides {
        if let Some(value) = value {
            *slot = value;
        }
    }
}

/// `RUST_LOG` when it holds a valid filter, `info` otherwise.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn log_level_defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("  ")).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn rust_log_overrides_default_level() {
        assert_eq!(log_filter(Some("debug")).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
    }
}
