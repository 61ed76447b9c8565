use std::process::ExitCode;
use std::time::Duration;

use tracing::{error, info, warn};

use tgfeed::config::{CONFIG_URL_ENV, DEFAULT_HTTP_TIMEOUT_SECS, LOG_LEVEL_ENV};
use tgfeed::telegram::markup::escape;
use tgfeed::telegram::OutgoingMessage;
use tgfeed::{Bridge, ConfigStore, FeedFetcher, HttpConfigStore, Result, TelegramClient};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| "info".to_string());
    tgfeed::logging::init(&level);

    let url = match std::env::var(CONFIG_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            error!("{CONFIG_URL_ENV} is not set");
            return ExitCode::FAILURE;
        }
    };

    match run(url).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "tgfeed stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(url: String) -> Result<()> {
    let store = HttpConfigStore::new(url, Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))?;

    let mut config = store.load().await?;
    config.apply_defaults();
    config.validate()?;

    info!(
        poll_interval_secs = config.poll_interval_secs,
        command_poll_interval_secs = config.command_poll_interval_secs,
        feed_check_interval_secs = config.feed_check_interval_secs,
        notify_interval_secs = config.notify_interval_secs,
        last_feed_check_time = %config.last_feed_check_time.at(),
        "configuration loaded"
    );
    info!(feeds = ?config.watched_feeds, "watched feeds");

    let telegram = TelegramClient::from_config(&config)?;
    let fetcher = FeedFetcher::from_config(&config)?;

    tokio::spawn(watch_signals(
        telegram.clone(),
        config.operator_chat_id.clone(),
    ));

    let mut bridge = Bridge::new(store, telegram, fetcher).with_state(config);
    bridge.run().await
}

/// Wait for a termination signal, tell the operator, and exit.
async fn watch_signals(telegram: TelegramClient, operator_chat_id: String) {
    let signal = wait_for_signal().await;
    warn!(signal, "terminating");

    let notice = OutgoingMessage::new(operator_chat_id, escape(&format!("tgfeed: {signal}")))
        .silent();
    if let Err(e) = telegram.send(&notice).await {
        warn!(error = %e, "failed to notify operator");
    }

    std::process::exit(1);
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable");
            let _ = tokio::signal::ctrl_c().await;
            return "interrupt";
        }
    };

    tokio::select! {
        _ = terminate.recv() => "sigterm",
        _ = tokio::signal::ctrl_c() => "interrupt",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "interrupt"
}
