use super::shared::SharedState;
use crate::storage::Persistence;
use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Upper bound for one save on the blocking pool.
pub const SAVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Persists the shared state in the background.
///
/// Bursts of mutations within `debounce` collapse into one save of the
/// latest snapshot. A failed save is logged and retried on the next change;
/// a final save runs when `shutdown` fires.
pub struct Saver {
    shared: SharedState,
    persistence: Arc<dyn Persistence>,
    debounce: Duration,
    saved_revision: Option<u64>,
    // Keeps a timed-out save from overlapping the next one.
    write_lock: Arc<Mutex<()>>,
}

impl Saver {
    pub fn new(shared: SharedState, persistence: Arc<dyn Persistence>, debounce: Duration) -> Self {
        let saved_revision = Some(shared.read(|state| state.revision()));
        Self {
            shared,
            persistence,
            debounce,
            saved_revision,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut revisions = self.shared.subscribe();

        loop {
            tokio::select! {
                changed = revisions.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if !self.debounce.is_zero() {
                        sleep(self.debounce).await;
                    }
                    revisions.borrow_and_update();
                    if let Err(e) = self.save_latest().await {
                        warn!(error = %e, "Failed to save clipboard history, will retry on next change");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        match self.save_latest().await {
            Ok(()) => info!("Final save complete"),
            Err(e) => warn!(error = %e, "Final save failed"),
        }
    }

    /// Save the current snapshot unless it is already on disk.
    pub async fn save_latest(&mut self) -> Result<()> {
        let (revision, snapshot) = self
            .shared
            .read(|state| (state.revision(), state.to_persisted()));

        if self.saved_revision == Some(revision) {
            return Ok(());
        }

        let persistence = Arc::clone(&self.persistence);
        let write_lock = Arc::clone(&self.write_lock);
        let task = tokio::task::spawn_blocking(move || {
            let _guard = write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            persistence.save(&snapshot)
        });

        match timeout(SAVE_TIMEOUT, task).await {
            Ok(Ok(Ok(()))) => {
                debug!(revision, "Saved clipboard history");
                self.saved_revision = Some(revision);
                Ok(())
            }
            Ok(Ok(Err(e))) => Err(e),
            Ok(Err(join_error)) => Err(anyhow!("save task failed: {join_error}")),
            Err(_) => Err(anyhow!("save did not finish within {SAVE_TIMEOUT:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::settings::Settings;
    use crate::storage::PersistedState;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct RecordingStorage {
        saves: AtomicUsize,
        last: Mutex<Option<PersistedState>>,
        fail: AtomicBool,
    }

    impl Persistence for RecordingStorage {
        fn load(&self) -> PersistedState {
            PersistedState::default()
        }

        fn save(&self, state: &PersistedState) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow!("disk full"));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(state.clone());
            Ok(())
        }
    }

    fn setup() -> (SharedState, Arc<RecordingStorage>) {
        let shared = SharedState::new(AppState::new(Settings::default()));
        (shared, Arc::new(RecordingStorage::default()))
    }

    #[tokio::test]
    async fn test_save_latest_skips_unchanged_state() {
        let (shared, storage) = setup();
        let mut saver = Saver::new(shared.clone(), storage.clone(), Duration::ZERO);

        saver.save_latest().await.unwrap();
        assert_eq!(storage.saves.load(Ordering::SeqCst), 0);

        shared.mutate(|state| state.insert("a"));
        saver.save_latest().await.unwrap();
        saver.save_latest().await.unwrap();
        assert_eq!(storage.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_save_is_retried() {
        let (shared, storage) = setup();
        let mut saver = Saver::new(shared.clone(), storage.clone(), Duration::ZERO);

        storage.fail.store(true, Ordering::SeqCst);
        shared.mutate(|state| state.insert("a"));
        assert!(saver.save_latest().await.is_err());

        storage.fail.store(false, Ordering::SeqCst);
        saver.save_latest().await.unwrap();
        assert_eq!(storage.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_flushes_on_shutdown() {
        let (shared, storage) = setup();
        let saver = Saver::new(shared.clone(), storage.clone(), Duration::from_millis(10));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(saver.run(shutdown_rx));

        shared.mutate(|state| state.insert("a"));
        shared.mutate(|state| state.insert("b"));
        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        let last = storage.last.lock().unwrap().clone().unwrap();
        let contents: Vec<&str> = last.entries.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["b", "a"]);
    }
}
