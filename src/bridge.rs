//! The bridge cycle.
//!
//! One cycle loads the configuration, drains operator commands, sweeps the
//! watched feeds and writes the configuration back. Cycles run one after
//! another on a fixed cadence; nothing inside a cycle runs concurrently.

use chrono::Utc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::command::CommandProcessor;
use crate::config::{Config, DEFAULT_POLL_INTERVAL_SECS};
use crate::feed::{FeedSource, FeedSynchronizer, SweepReport};
use crate::notify::Dispatcher;
use crate::store::ConfigStore;
use crate::telegram::markup::escape;
use crate::telegram::{Messenger, OutgoingMessage};
use crate::Result;

/// What a cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Operator updates processed, if a drain was due.
    pub updates: Option<usize>,
    /// Sweep outcome, if a sweep was due and completed.
    pub sweep: Option<SweepReport>,
    /// Whether the configuration was written back.
    pub saved: bool,
}

pub struct Bridge<S, M, F> {
    store: S,
    messenger: M,
    source: F,
    /// State at the end of the previous cycle.
    previous: Option<Config>,
    /// The previous cycle's state never reached the store.
    unsaved: bool,
}

impl<S: ConfigStore, M: Messenger, F: FeedSource> Bridge<S, M, F> {
    pub fn new(store: S, messenger: M, source: F) -> Self {
        Self {
            store,
            messenger,
            source,
            previous: None,
            unsaved: false,
        }
    }

    /// Seed the in-memory state, e.g. with the document read at startup.
    pub fn with_state(mut self, config: Config) -> Self {
        self.previous = Some(config);
        self
    }

    /// State left by the last cycle.
    pub fn state(&self) -> Option<&Config> {
        self.previous.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn messenger(&self) -> &M {
        &self.messenger
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    /// Load the document and reconcile it with the in-memory state.
    async fn reconcile(&self) -> Result<Config> {
        let mut config = self.store.load().await?;
        config.apply_defaults();
        config.validate()?;
        if let Some(previous) = &self.previous {
            config.merge_runtime(previous, self.unsaved);
        }
        config.dedup_feeds();
        Ok(config)
    }

    /// Run a single cycle.
    ///
    /// Load and validation failures are returned as fatal errors. A failed
    /// sweep or save is returned after the in-memory state was updated, so
    /// the next cycle starts from what this one achieved.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let mut config = self.reconcile().await?;
        let now = Utc::now();
        let dispatcher = Dispatcher::from_config(&self.messenger, &config);
        let mut report = CycleReport::default();

        let mut added = Vec::new();
        if config
            .last_command_poll_time
            .is_due(now, config.command_poll_interval())
        {
            let processor = CommandProcessor::new(&self.messenger, &self.source, &dispatcher);
            let drained = processor.drain(&mut config).await;
            report.updates = Some(drained.updates);
            added = drained.added;
        }

        let mut sweep_result = Ok(());
        let sweep_due = config
            .last_feed_check_time
            .is_due(now, config.feed_check_interval());
        if sweep_due {
            // Feeds added just now were already previewed.
            let synchronizer = FeedSynchronizer::new(&self.source, &dispatcher).skipping(&added);
            match synchronizer.sweep(&mut config).await {
                Ok(sweep) => report.sweep = Some(sweep),
                Err(e) => sweep_result = Err(e),
            }
        }

        let save_result = if report.updates.is_some() || sweep_due || self.unsaved {
            let result = self.store.save(&config).await;
            self.unsaved = result.is_err();
            report.saved = result.is_ok();
            result
        } else {
            Ok(())
        };

        self.previous = Some(config);

        if let Err(e) = &save_result {
            warn!(error = %e, "state not persisted, kept in memory");
        }
        sweep_result?;
        save_result?;
        Ok(report)
    }

    /// Run cycles forever.
    ///
    /// Returns only with a fatal error, after reporting it to the operator.
    pub async fn run(&mut self) -> Result<()> {
        info!("bridge started");

        loop {
            let started = Instant::now();

            match self.run_cycle().await {
                Ok(report) => debug!(?report, "cycle finished"),
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "fatal error, stopping");
                    self.report(&format!("fatal: {e}")).await;
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, "cycle failed");
                    self.report(&format!("cycle error: {e}")).await;
                }
            }

            sleep_until(started + self.poll_interval()).await;
        }
    }

    fn poll_interval(&self) -> std::time::Duration {
        self.previous
            .as_ref()
            .map(Config::poll_interval)
            .unwrap_or(std::time::Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS))
    }

    /// Best-effort silent notice to the operator chat.
    pub async fn report(&self, text: &str) {
        let Some(chat_id) = self
            .previous
            .as_ref()
            .map(|c| c.operator_chat_id.as_str())
            .filter(|id| !id.is_empty())
        else {
            return;
        };

        let message = OutgoingMessage::new(chat_id, escape(text)).silent();
        if let Err(e) = self.messenger.send_message(&message).await {
            warn!(error = %e, "failed to report to operator");
        }
    }
}
