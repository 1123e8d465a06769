use super::state::AppState;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// `AppState` behind a lock, shared by the watcher, the saver and the
/// control API.
///
/// Every closure passed to [`mutate`](Self::mutate) runs with the lock held,
/// so readers only ever see whole mutations. Subscribers are told the new
/// revision after each change.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<Mutex<AppState>>,
    revisions: watch::Sender<u64>,
}

impl SharedState {
    pub fn new(state: AppState) -> Self {
        let (revisions, _) = watch::channel(state.revision());
        Self {
            inner: Arc::new(Mutex::new(state)),
            revisions,
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.lock())
    }

    pub fn mutate<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let (result, revision) = {
            let mut state = self.lock();
            let before = state.revision();
            let result = f(&mut state);
            let after = state.revision();
            (result, (after != before).then_some(after))
        };

        if let Some(revision) = revision {
            self.revisions.send_replace(revision);
        }
        result
    }

    /// Receiver that observes the revision after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revisions.subscribe()
    }

    // Store operations never leave the state half-updated, so a poisoned
    // lock still guards a consistent value.
    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    #[test]
    fn test_mutate_notifies_subscribers() {
        let shared = SharedState::new(AppState::new(Settings::default()));
        let mut rx = shared.subscribe();
        assert!(!rx.has_changed().unwrap());

        shared.mutate(|state| state.insert("hello"));
        assert!(rx.has_changed().unwrap());
        let revision = *rx.borrow_and_update();
        assert_eq!(revision, shared.read(|state| state.revision()));
    }

    #[test]
    fn test_noop_mutation_does_not_notify() {
        let shared = SharedState::new(AppState::new(Settings::default()));
        shared.mutate(|state| state.insert("same"));
        let mut rx = shared.subscribe();
        rx.borrow_and_update();

        let outcome = shared.mutate(|state| state.insert("same"));
        assert!(!outcome.is_inserted());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_clones_share_state() {
        let shared = SharedState::new(AppState::new(Settings::default()));
        let other = shared.clone();
        other.mutate(|state| state.insert("shared"));
        assert_eq!(shared.read(|state| state.store().len()), 1);
    }

    #[test]
    fn test_concurrent_inserts_keep_capacity() {
        let shared = SharedState::new(AppState::new(Settings {
            capacity: 5,
            ..Settings::default()
        }));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        shared.mutate(|state| state.insert(format!("t{t}-{i}")));
                        let unpinned = shared.read(|state| state.store().unpinned_count());
                        assert!(unpinned <= 5);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(shared.read(|state| state.store().len()), 5);
    }
}
