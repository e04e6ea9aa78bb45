use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

use super::HistoryEntry;
use super::store::{HistoryStore, PersistError};

/// Attempts per entry before it is dropped.
pub const MAX_ATTEMPTS: u32 = 3;

/// Pause between attempts.
pub const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Crashed rounds waiting for the store. Further rounds are dropped.
pub const QUEUE_CAPACITY: usize = 64;

/// Fire-and-forget mirror of crashed rounds into a [`HistoryStore`].
///
/// Entries go through a bounded queue to a task on the runtime; the store
/// itself runs on the blocking pool, so callers never wait on storage I/O.
/// Failures are logged and dropped.
#[derive(Clone)]
pub struct Persister {
    tx: Option<Sender<HistoryEntry>>,
}

impl Persister {
    /// A persister with no durable store behind it.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Start the worker task. Must be called from inside the runtime.
    pub fn spawn(store: Arc<dyn HistoryStore>) -> Self {
        Self::spawn_with(store, RETRY_BACKOFF, QUEUE_CAPACITY)
    }

    fn spawn_with(store: Arc<dyn HistoryStore>, backoff: Duration, capacity: usize) -> Self {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("HISTORY - could not start persister, history stays in memory: {e}");
                return Self::disabled();
            }
        };

        let (tx, rx) = mpsc::channel(capacity);
        handle.spawn(run(store, rx, backoff));
        info!("HISTORY - persister started (queue {capacity})");
        Self { tx: Some(tx) }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue `entry` for storage. Never blocks, never fails.
    pub fn dispatch(&self, entry: HistoryEntry) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                warn!("HISTORY - persist queue full, dropping round {}", entry.id);
            }
            Err(TrySendError::Closed(entry)) => {
                warn!("HISTORY - persister gone, dropping round {}", entry.id);
            }
        }
    }
}

async fn run(store: Arc<dyn HistoryStore>, mut rx: Receiver<HistoryEntry>, backoff: Duration) {
    while let Some(entry) = rx.recv().await {
        persist_with_retry(&store, &entry, backoff).await;
    }
    debug!("HISTORY - persister channel closed");
}

async fn persist_once(
    store: &Arc<dyn HistoryStore>,
    entry: &HistoryEntry,
) -> Result<(), PersistError> {
    let store = Arc::clone(store);
    let entry = entry.clone();
    tokio::task::spawn_blocking(move || store.persist(&entry))
        .await
        .unwrap_or_else(|e| Err(std::io::Error::other(e).into()))
}

/// Store one entry with a bounded number of attempts. Returns whether it
/// landed.
async fn persist_with_retry(
    store: &Arc<dyn HistoryStore>,
    entry: &HistoryEntry,
    backoff: Duration,
) -> bool {
    for attempt in 1..=MAX_ATTEMPTS {
        match persist_once(store, entry).await {
            Ok(()) => {
                debug!("HISTORY - persisted round {} (attempt {})", entry.id, attempt);
                return true;
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(
                    "HISTORY - persist round {} failed (attempt {}/{}): {}",
                    entry.id, attempt, MAX_ATTEMPTS, e
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => {
                error!(
                    "HISTORY - giving up on round {} after {} attempts: {}",
                    entry.id, MAX_ATTEMPTS, e
                );
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn entry(id: &str) -> HistoryEntry {
        HistoryEntry {
            id: id.into(),
            crash_point: 1.5,
            hash: "h".into(),
            commitment: "c".into(),
            crashed_at: 0,
        }
    }

    /// Fails the first `failures` calls, then records.
    struct FlakyStore {
        failures: u32,
        calls: AtomicU32,
        stored: Mutex<Vec<String>>,
        notify: Mutex<Option<UnboundedSender<String>>>,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                stored: Mutex::new(Vec::new()),
                notify: Mutex::new(None),
            }
        }

        fn watched(failures: u32) -> (Arc<Self>, UnboundedReceiver<String>) {
            let (tx, rx) = unbounded_channel();
            let store = Arc::new(Self::new(failures));
            *store.notify.lock().unwrap() = Some(tx);
            (store, rx)
        }
    }

    impl HistoryStore for FlakyStore {
        fn persist(&self, entry: &HistoryEntry) -> Result<(), PersistError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(std::io::Error::other("disk on fire").into());
            }
            self.stored.lock().unwrap().push(entry.id.clone());
            if let Some(tx) = self.notify.lock().unwrap().as_ref() {
                let _ = tx.send(entry.id.clone());
            }
            Ok(())
        }
    }

    #[actix_web::test]
    async fn retries_until_success() {
        let store = Arc::new(FlakyStore::new(2));
        let dyn_store: Arc<dyn HistoryStore> = store.clone();
        assert!(persist_with_retry(&dyn_store, &entry("r1"), Duration::ZERO).await);
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert_eq!(*store.stored.lock().unwrap(), ["r1"]);
    }

    #[actix_web::test]
    async fn gives_up_after_bounded_attempts() {
        let store = Arc::new(FlakyStore::new(u32::MAX));
        let dyn_store: Arc<dyn HistoryStore> = store.clone();
        assert!(!persist_with_retry(&dyn_store, &entry("r1"), Duration::ZERO).await);
        assert_eq!(store.calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }

    #[actix_web::test]
    async fn worker_stores_dispatched_entries() {
        let (store, mut rx) = FlakyStore::watched(1);

        let persister = Persister::spawn_with(store.clone(), Duration::ZERO, QUEUE_CAPACITY);
        assert!(persister.is_enabled());
        persister.dispatch(entry("a"));
        persister.dispatch(entry("b"));

        assert_eq!(timeout(WAIT, rx.recv()).await.unwrap().unwrap(), "a");
        assert_eq!(timeout(WAIT, rx.recv()).await.unwrap().unwrap(), "b");
    }

    #[actix_web::test]
    async fn full_queue_drops_new_entries() {
        let (store, mut rx) = FlakyStore::watched(0);
        let persister = Persister::spawn_with(store.clone(), Duration::ZERO, 2);

        // The worker cannot run until this task yields, so the third entry
        // finds the queue full.
        persister.dispatch(entry("a"));
        persister.dispatch(entry("b"));
        persister.dispatch(entry("c"));

        assert_eq!(timeout(WAIT, rx.recv()).await.unwrap().unwrap(), "a");
        assert_eq!(timeout(WAIT, rx.recv()).await.unwrap().unwrap(), "b");
        assert!(timeout(Duration::from_millis(200), rx.recv()).await.is_err());
        assert_eq!(*store.stored.lock().unwrap(), ["a", "b"]);
    }

    #[test]
    fn spawn_outside_runtime_stays_disabled() {
        let persister = Persister::spawn(Arc::new(FlakyStore::new(0)));
        assert!(!persister.is_enabled());
    }

    #[test]
    fn disabled_persister_swallows_entries() {
        let persister = Persister::disabled();
        assert!(!persister.is_enabled());
        persister.dispatch(entry("ignored"));
    }
}
