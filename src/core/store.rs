use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::watch;

use crate::model::{Request, RequestKind, RequestStatus};

/// In-memory working set of requests for one kind, keyed by id.
///
/// Screens never mutate this directly; the `LifecycleController` writes to it
/// and screens re-render when the revision counter moves. The watch channel
/// replaces the CustomEvent broadcast/listen pairs the old screens used.
pub struct RequestStore {
    kind: RequestKind,
    inner: Mutex<Inner>,
    notify: watch::Sender<u64>,
}

struct Inner {
    by_id: HashMap<u64, Request>,
    /// False until the first successful refresh completes. Lets screens
    /// distinguish "nothing yet" from "first load failed, show empty + error".
    loaded: bool,
    /// Bumped on every mutation, under the same lock, so a reader can tell
    /// whether the store changed between two observations.
    revision: u64,
}

impl RequestStore {
    pub fn new(kind: RequestKind) -> Self {
        let (notify, _) = watch::channel(0);
        RequestStore {
            kind,
            inner: Mutex::new(Inner {
                by_id: HashMap::new(),
                loaded: false,
                revision: 0,
            }),
            notify,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Subscribe to store changes. The payload is a revision counter; any
    /// change means "recompute your view".
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Current mutation generation. Capture before a fetch, pass to
    /// [`RequestStore::replace_all_if_unchanged`] after it.
    pub fn revision(&self) -> u64 {
        self.inner.lock().unwrap().revision
    }

    fn bump(&self, inner: &mut Inner) {
        inner.revision += 1;
        self.notify.send_replace(inner.revision);
    }

    /// Wholesale replacement after a successful backend fetch. On a failed
    /// fetch the controller does not call this, so the last-known list stays.
    pub fn replace_all(&self, requests: Vec<Request>) {
        let mut inner = self.inner.lock().unwrap();
        inner.by_id = requests.into_iter().map(|r| (r.id, r)).collect();
        inner.loaded = true;
        self.bump(&mut inner);
    }

    /// Replaces the working set only if no mutation landed since `since` was
    /// captured. A fetch that raced a local transition is reported stale
    /// (`false`) and dropped, so a poll response from before a decision
    /// cannot resurrect the decided request.
    pub fn replace_all_if_unchanged(&self, since: u64, requests: Vec<Request>) -> bool {
        let mut inner = self.inner.lock().unwrap();
        if inner.revision != since {
            return false;
        }
        inner.by_id = requests.into_iter().map(|r| (r.id, r)).collect();
        inner.loaded = true;
        self.bump(&mut inner);
        true
    }

    pub fn upsert(&self, request: Request) {
        let mut inner = self.inner.lock().unwrap();
        inner.by_id.insert(request.id, request);
        self.bump(&mut inner);
    }

    pub fn remove(&self, id: u64) -> Option<Request> {
        let mut inner = self.inner.lock().unwrap();
        let removed = inner.by_id.remove(&id);
        if removed.is_some() {
            self.bump(&mut inner);
        }
        removed
    }

    pub fn get(&self, id: u64) -> Option<Request> {
        self.inner.lock().unwrap().by_id.get(&id).cloned()
    }

    pub fn has_loaded(&self) -> bool {
        self.inner.lock().unwrap().loaded
    }

    /// All held requests, newest submission first. Uniform ordering for
    /// every kind and both roles; id breaks timestamp ties so the order is
    /// deterministic.
    pub fn all(&self) -> Vec<Request> {
        let mut list: Vec<Request> = self
            .inner
            .lock()
            .unwrap()
            .by_id
            .values()
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        list
    }

    /// Pending subset, newest submission first.
    pub fn pending(&self) -> Vec<Request> {
        let mut list = self.all();
        list.retain(|r| r.status == RequestStatus::Pending);
        list
    }
}
