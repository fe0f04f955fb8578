//! Tracking the host's open files.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::domain::errors::HostError;
use crate::domain::model::{FileHandle, Snapshot};
use crate::infra::dispatch::UiQueue;
use crate::infra::host::{EditorHost, EditorListener, LifecycleEvent, SubscriptionId};

type SnapshotObserver = Box<dyn Fn(&Snapshot) + Send + Sync>;

/// Owns the current snapshot of open files and keeps it in sync with the host.
///
/// Every refresh re-reads the full list from the host and replaces the stored snapshot; there is
/// no incremental bookkeeping to drift out of sync with the editor.
pub struct OpenFilesTracker {
    host: Arc<dyn EditorHost>,
    snapshot: RwLock<Snapshot>,
    observers: Mutex<Vec<SnapshotObserver>>,
    subscription: Mutex<Option<Subscription>>,
}

struct Subscription {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
}

impl OpenFilesTracker {
    pub fn new(host: Arc<dyn EditorHost>) -> Self {
        Self {
            host,
            snapshot: RwLock::new(Snapshot::default()),
            observers: Mutex::new(Vec::new()),
            subscription: Mutex::new(None),
        }
    }

    /// Most recently stored snapshot. Empty until the first successful refresh.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.read().clone()
    }

    /// Register a callback invoked with every new snapshot.
    ///
    /// Observers must not register further observers from inside the callback.
    pub fn observe(&self, observer: impl Fn(&Snapshot) + Send + Sync + 'static) {
        self.observers.lock().push(Box::new(observer));
    }

    /// Replace the stored snapshot with the host's current open files.
    ///
    /// On host failure the previous snapshot is kept and observers are not notified.
    pub fn refresh(&self) -> Result<Snapshot, HostError> {
        let files = self.host.list_open_files().inspect_err(|err| {
            tracing::warn!(error = %err, "failed to list open files");
        })?;
        let snapshot = Snapshot::new(files);
        *self.snapshot.write() = snapshot.clone();
        tracing::debug!(files = snapshot.len(), "refreshed open files");

        for observer in self.observers.lock().iter() {
            observer(&snapshot);
        }
        Ok(snapshot)
    }

    /// React to a host notification by refreshing. Failures are logged, not returned.
    pub fn on_host_lifecycle_event(&self, event: LifecycleEvent) {
        tracing::trace!(%event, "host lifecycle event");
        let _ = self.refresh();
    }

    /// Listen for host lifecycle events. Each event posts one refresh onto `queue`.
    ///
    /// Calling this while already subscribed does nothing.
    pub fn subscribe(self: &Arc<Self>, queue: &UiQueue) -> Result<(), HostError> {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return Ok(());
        }

        let active = Arc::new(AtomicBool::new(true));
        let listener = TrackerListener {
            tracker: Arc::downgrade(self),
            queue: queue.clone(),
            active: Arc::clone(&active),
        };
        let id = self.host.subscribe(Arc::new(listener))?;
        *subscription = Some(Subscription { id, active });
        tracing::debug!("subscribed to host lifecycle events");
        Ok(())
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Stop listening for host events. Safe to call any number of times.
    ///
    /// Refreshes already queued by earlier events are skipped as well.
    pub fn dispose(&self) {
        let Some(subscription) = self.subscription.lock().take() else {
            return;
        };
        subscription.active.store(false, Ordering::SeqCst);
        self.host.unsubscribe(subscription.id);
        tracing::debug!("unsubscribed from host lifecycle events");
    }
}

impl Drop for OpenFilesTracker {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for OpenFilesTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenFilesTracker")
            .field("snapshot", &self.snapshot.read().len())
            .field("observers", &self.observers.lock().len())
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

struct TrackerListener {
    tracker: Weak<OpenFilesTracker>,
    queue: UiQueue,
    active: Arc<AtomicBool>,
}

impl TrackerListener {
    fn schedule(&self, event: LifecycleEvent) {
        if !self.active.load(Ordering::SeqCst) {
            return;
        }
        let tracker = Weak::clone(&self.tracker);
        let active = Arc::clone(&self.active);
        self.queue.post(move || {
            if !active.load(Ordering::SeqCst) {
                return;
            }
            if let Some(tracker) = tracker.upgrade() {
                tracker.on_host_lifecycle_event(event);
            }
        });
    }
}

impl EditorListener for TrackerListener {
    fn file_opened(&self, _file: &FileHandle) {
        self.schedule(LifecycleEvent::Opened);
    }

    fn file_closed(&self, _file: &FileHandle) {
        self.schedule(LifecycleEvent::Closed);
    }

    fn selection_changed(&self, _selected: Option<&FileHandle>) {
        self.schedule(LifecycleEvent::SelectionChanged);
    }
}
