use crate::app::SharedState;
use crate::clipboard::{ClipboardError, ClipboardHandle};
use crate::history::InsertOutcome;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

/// Text as it is compared and recorded: trimmed, `None` when blank.
pub fn normalize(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// What the watcher remembers between polls.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WatcherState {
    last_observed: Option<String>,
}

impl WatcherState {
    pub fn last_observed(&self) -> Option<&str> {
        self.last_observed.as_deref()
    }

    /// Process one clipboard read and return the text to record, if any.
    ///
    /// Read errors count as "no change". While paused the value is still
    /// remembered so that resuming does not record it.
    pub fn observe(&mut self, read: Result<String, ClipboardError>, paused: bool) -> Option<String> {
        let text = read.ok()?;
        let text = normalize(&text)?;

        if self.last_observed.as_deref() == Some(text) {
            return None;
        }
        self.last_observed = Some(text.to_string());

        (!paused).then(|| text.to_string())
    }

    /// Treat `text` as already seen, e.g. after writing it ourselves.
    /// Returns the previous value so a failed write can be rolled back.
    pub fn adopt(&mut self, text: &str) -> Option<String> {
        match normalize(text) {
            Some(text) => self.last_observed.replace(text.to_string()),
            None => self.last_observed.clone(),
        }
    }

    pub fn restore(&mut self, previous: Option<String>) {
        self.last_observed = previous;
    }
}

pub enum WatcherCommand {
    /// Write text to the clipboard without recording it.
    CopyBack {
        text: String,
        reply: oneshot::Sender<Result<(), ClipboardError>>,
    },
}

/// Sends commands to a running [`Watcher`].
#[derive(Clone)]
pub struct WatcherHandle {
    tx: mpsc::Sender<WatcherCommand>,
}

impl WatcherHandle {
    pub async fn copy_back(&self, text: String) -> Result<(), ClipboardError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(WatcherCommand::CopyBack { text, reply })
            .await
            .map_err(|_| ClipboardError::WorkerStopped)?;
        response.await.map_err(|_| ClipboardError::WorkerStopped)?
    }
}

pub fn command_channel() -> (WatcherHandle, mpsc::Receiver<WatcherCommand>) {
    let (tx, rx) = mpsc::channel(8);
    (WatcherHandle { tx }, rx)
}

/// Polls the clipboard and records changes into the shared history.
pub struct Watcher {
    state: WatcherState,
    // Cleared by the first non-blank read after startup.
    seeding: bool,
    shared: SharedState,
    clipboard: ClipboardHandle,
}

impl Watcher {
    pub fn new(shared: SharedState, clipboard: ClipboardHandle) -> Self {
        Self {
            state: WatcherState::default(),
            seeding: true,
            shared,
            clipboard,
        }
    }

    pub fn state(&self) -> &WatcherState {
        &self.state
    }

    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<WatcherCommand>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut period = self.poll_interval();
        let mut ticker = ticker(period, Instant::now());
        let mut revisions = self.shared.subscribe();
        info!(interval_ms = period.as_millis() as u64, "Clipboard watcher started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                Ok(()) = revisions.changed() => {
                    let current = self.poll_interval();
                    if current != period {
                        debug!(interval_ms = current.as_millis() as u64, "Polling interval changed");
                        period = current;
                        ticker = ticker_after(period);
                    }
                }
                Some(command) = commands.recv() => {
                    self.handle_command(command).await;
                }
                _ = shutdown.changed() => break,
            }
        }

        info!("Clipboard watcher stopped");
    }

    /// One polling step: read, compare, record.
    pub async fn poll_once(&mut self) -> Option<InsertOutcome> {
        let paused = self.shared.read(|state| state.store().is_paused());
        let read = self.clipboard.read_text().await;

        if let Err(e) = &read {
            if *e != ClipboardError::NoText {
                trace!(error = %e, "Clipboard read failed, skipping tick");
            }
        }

        if self.seeding {
            if let Some(text) = read.as_ref().ok().and_then(|text| normalize(text)) {
                self.seeding = false;
                let stored = self
                    .shared
                    .read(|state| state.store().list().iter().any(|e| e.content == text));
                if stored {
                    debug!("Clipboard holds a stored entry at startup, not recording it");
                    self.state.adopt(text);
                    return None;
                }
            }
        }

        let content = self.state.observe(read, paused)?;
        let outcome = self.shared.mutate(|state| state.insert(content));

        match &outcome {
            InsertOutcome::Inserted { entry, evicted } => {
                debug!(
                    id = %entry.id,
                    len = entry.content.len(),
                    evicted = evicted.len(),
                    "Captured clipboard text"
                );
            }
            other => trace!(outcome = ?other, "Clipboard change not recorded"),
        }
        Some(outcome)
    }

    async fn handle_command(&mut self, command: WatcherCommand) {
        match command {
            WatcherCommand::CopyBack { text, reply } => {
                // Adopt first so a late write is still not recorded.
                let previous = self.state.adopt(&text);
                let result = self.clipboard.write_text(&text).await;
                match &result {
                    // A timed-out write may still land.
                    Err(ClipboardError::TimedOut) => {
                        warn!("Clipboard write timed out");
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to write clipboard");
                        self.state.restore(previous);
                    }
                    Ok(()) => {}
                }
                let _ = reply.send(result);
            }
        }
    }

    fn poll_interval(&self) -> Duration {
        self.shared
            .read(|state| state.settings().poll_interval())
            .max(Duration::from_millis(1))
    }
}

fn ticker(period: Duration, start: Instant) -> Interval {
    let mut interval = interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

fn ticker_after(period: Duration) -> Interval {
    ticker(period, Instant::now() + period)
}
