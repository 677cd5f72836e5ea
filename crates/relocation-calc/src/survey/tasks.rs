//! Named background operations.
//!
//! Slow work (routing, isochrones) is scheduled under a name so the caller can
//! answer immediately and collect the result later. Scheduling a name again
//! flags the previous run as cancelled; its output is discarded.
//!
//! A finished outcome is handed out once: `status` or `wait` removes the entry
//! that delivered it. Outcomes nobody collects are dropped after the retention
//! window.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::watch;

/// Cooperative cancellation signal handed to each operation.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "lowercase")]
pub enum OperationStatus<T> {
    Unknown,
    Pending,
    Completed(T),
    Failed(String),
}

/// How long an uncollected outcome stays in the registry.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(15 * 60);

type Outcome<T> = Option<Result<T, String>>;
type Entries<T> = Arc<Mutex<HashMap<String, Entry<T>>>>;

struct Entry<T> {
    generation: u64,
    flag: CancellationFlag,
    outcome: watch::Receiver<Outcome<T>>,
}

/// Registry of named background operations running on the tokio runtime.
pub struct DeferredOperations<T> {
    entries: Entries<T>,
    generations: AtomicU64,
    retention: Duration,
}

impl<T> Default for DeferredOperations<T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            generations: AtomicU64::new(1),
            retention: DEFAULT_RETENTION,
        }
    }
}

/// Removes `name` if it still belongs to `generation`.
fn evict<T>(entries: &Entries<T>, name: &str, generation: u64) -> bool {
    let mut entries = entries.lock().expect("operation registry poisoned");
    match entries.get(name) {
        Some(entry) if entry.generation == generation => {
            entries.remove(name);
            true
        }
        _ => false,
    }
}

impl<T> DeferredOperations<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Starts `operation` under `name`, cancelling any run already registered
    /// under it. Must be called from within a tokio runtime.
    pub fn register<F, Fut>(&self, name: impl Into<String>, operation: F) -> CancellationFlag
    where
        F: FnOnce(CancellationFlag) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let name = name.into();
        let flag = CancellationFlag::default();
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = watch::channel(None);

        {
            let mut entries = self.entries.lock().expect("operation registry poisoned");
            if let Some(previous) = entries.insert(
                name.clone(),
                Entry {
                    generation,
                    flag: flag.clone(),
                    outcome: receiver,
                },
            ) {
                tracing::debug!(
                    operation = %name,
                    previous = previous.generation,
                    "cancelling previous run"
                );
                previous.flag.cancel();
            }
        }

        let future = operation(flag.clone());
        let task_name = name;
        let entries = self.entries.clone();
        let retention = self.retention;
        tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(future).catch_unwind().await {
                Ok(output) => Ok(output),
                Err(_) => {
                    tracing::error!(operation = %task_name, generation, "deferred operation panicked");
                    Err("operation panicked".to_string())
                }
            };
            // Nobody listens once the run was replaced.
            let _ = sender.send(Some(outcome));
            drop(sender);

            tokio::time::sleep(retention).await;
            if evict(&entries, &task_name, generation) {
                tracing::debug!(operation = %task_name, generation, "dropping uncollected outcome");
            }
        });

        flag
    }

    /// Current state of `name`. A finished outcome is removed once returned.
    pub fn status(&self, name: &str) -> OperationStatus<T> {
        let mut entries = self.entries.lock().expect("operation registry poisoned");
        let Some(entry) = entries.get(name) else {
            return OperationStatus::Unknown;
        };
        let status = match &*entry.outcome.borrow() {
            None => OperationStatus::Pending,
            Some(Ok(output)) => OperationStatus::Completed(output.clone()),
            Some(Err(reason)) => OperationStatus::Failed(reason.clone()),
        };
        if !matches!(status, OperationStatus::Pending) {
            entries.remove(name);
        }
        status
    }

    /// Waits for the current run under `name` to finish and collects it.
    pub async fn wait(&self, name: &str) -> OperationStatus<T> {
        let (generation, mut receiver) = {
            let entries = self.entries.lock().expect("operation registry poisoned");
            match entries.get(name) {
                Some(entry) => (entry.generation, entry.outcome.clone()),
                None => return OperationStatus::Unknown,
            }
        };

        let result = match receiver.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => Some(Err("operation stopped without a result".to_string())),
        };
        evict(&self.entries, name, generation);
        match result {
            Some(Ok(output)) => OperationStatus::Completed(output),
            Some(Err(reason)) => OperationStatus::Failed(reason),
            None => OperationStatus::Pending,
        }
    }

    /// Flags the run under `name` as cancelled. Returns whether one existed.
    pub fn cancel(&self, name: &str) -> bool {
        let entries = self.entries.lock().expect("operation registry poisoned");
        match entries.get(name) {
            Some(entry) => {
                entry.flag.cancel();
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> Vec<String> {
        let entries = self.entries.lock().expect("operation registry poisoned");
        let mut names: Vec<String> = entries.keys().cloned().collect();
        names.sort();
        names
    }

    #[cfg(test)]
    fn generation(&self, name: &str) -> Option<u64> {
        let entries = self.entries.lock().expect("operation registry poisoned");
        entries.get(name).map(|entry| entry.generation)
    }
}
