//! Page-scoped fetch state.
//!
//! A page owns a [`PageScope`] and one [`Slice`] per collection or record it shows. Fetches are
//! independent tasks that complete in any order. A fetch that fails is logged, reported as an
//! error [`Notice`], and leaves its slice exactly as it was.
//!
//! A dependent fetch ([`PageScope::fetch_when`]) follows a prerequisite slice for the lifetime of
//! the page, refetching whenever the key it derives from the prerequisite changes.
//!
//! Dropping the scope (or calling [`PageScope::teardown`]) aborts every task still in flight, so
//! nothing writes into a page after it is gone.

use crate::error::ApiResult;
use clinic_core::{Loadable, Notice};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

#[derive(Debug)]
struct SliceState<T> {
    value: Loadable<T>,
    /// The last fetch for this slice failed.
    failed: bool,
    /// Bumped on every change, so dependents can tell whether they have caught up.
    version: u64,
}

/// One piece of page data, observable by dependent fetches.
#[derive(Debug)]
pub struct Slice<T> {
    state: Arc<watch::Sender<SliceState<T>>>,
}

impl<T> Clone for Slice<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for Slice<T> {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(SliceState {
            value: Loadable::Loading,
            failed: false,
            version: 0,
        });
        Self {
            state: Arc::new(tx),
        }
    }
}

impl<T: Clone> Slice<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> Loadable<T> {
        self.state.borrow().value.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.borrow().value.is_loaded()
    }

    pub fn set(&self, value: T) {
        self.state.send_modify(|state| {
            state.value = Loadable::Loaded(value);
            state.failed = false;
            state.version += 1;
        });
    }

    /// Edit a loaded value in place. Does nothing while loading.
    pub fn update(&self, edit: impl FnOnce(&mut T)) {
        self.state.send_if_modified(|state| match &mut state.value {
            Loadable::Loaded(value) => {
                edit(value);
                state.version += 1;
                true
            }
            Loadable::Loading => false,
        });
    }

    fn mark_failed(&self) {
        self.state.send_modify(|state| {
            state.failed = true;
            state.version += 1;
        });
    }

    fn version(&self) -> u64 {
        self.state.borrow().version
    }

    fn subscribe(&self) -> watch::Receiver<SliceState<T>> {
        self.state.subscribe()
    }
}

/// Bookkeeping for one dependent fetch, read by [`PageScope::settle`].
struct Dependent {
    what: &'static str,
    /// Latest prerequisite version the dependent has finished reacting to.
    progress: watch::Receiver<u64>,
    prerequisite_version: Box<dyn Fn() -> u64 + Send + Sync>,
    stopped: bool,
}

/// Owner of a page's fetch tasks and the notices they raise.
pub struct PageScope {
    page: &'static str,
    tasks: JoinSet<()>,
    watchers: JoinSet<()>,
    dependents: Vec<Dependent>,
    notices_tx: mpsc::UnboundedSender<Notice>,
    notices_rx: mpsc::UnboundedReceiver<Notice>,
}

impl std::fmt::Debug for PageScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageScope")
            .field("page", &self.page)
            .field("in_flight", &self.tasks.len())
            .field("dependents", &self.dependents.len())
            .finish()
    }
}

async fn store<T, Fut>(
    page: &'static str,
    what: &'static str,
    slice: &Slice<T>,
    notices: &mpsc::UnboundedSender<Notice>,
    load: Fut,
) where
    T: Clone,
    Fut: Future<Output = ApiResult<T>>,
{
    match load.await {
        Ok(value) => {
            tracing::debug!(page, what, "loaded");
            slice.set(value);
        }
        Err(err) => {
            tracing::warn!(page, what, error = %err, "fetch failed");
            slice.mark_failed();
            // The receiver lives in the scope that owns this task.
            let _ = notices.send(Notice::error(format!("Failed to load {what}: {err}")));
        }
    }
}

impl PageScope {
    pub fn new(page: &'static str) -> Self {
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        Self {
            page,
            tasks: JoinSet::new(),
            watchers: JoinSet::new(),
            dependents: Vec::new(),
            notices_tx,
            notices_rx,
        }
    }

    /// Fetch into `slice` as an independent task.
    pub fn fetch<T, Fut>(&mut self, what: &'static str, slice: &Slice<T>, load: Fut)
    where
        T: Clone + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let page = self.page;
        let slice = slice.clone();
        let notices = self.notices_tx.clone();
        self.tasks
            .spawn(async move { store(page, what, &slice, &notices, load).await });
    }

    /// Keep `slice` fetched for whatever key `prerequisite` currently yields.
    ///
    /// The dependent fetch runs as soon as the prerequisite loads with a key, and again whenever
    /// a change to the prerequisite yields a different key. While the prerequisite is loading,
    /// has failed, or yields no key, nothing is fetched and the slice keeps its value.
    pub fn fetch_when<P, K, T, Fut>(
        &mut self,
        what: &'static str,
        prerequisite: &Slice<P>,
        key: impl Fn(&P) -> Option<K> + Send + 'static,
        slice: &Slice<T>,
        load: impl Fn(K) -> Fut + Send + 'static,
    ) where
        P: Clone + Send + Sync + 'static,
        K: Clone + PartialEq + Send + 'static,
        T: Clone + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let mut rx = prerequisite.subscribe();
        let (progress_tx, progress_rx) = watch::channel(0);
        let page = self.page;
        let slice = slice.clone();
        let notices = self.notices_tx.clone();

        self.watchers.spawn(async move {
            let mut fetched: Option<K> = None;
            loop {
                let (version, failed, next) = {
                    let state = rx.borrow_and_update();
                    let next = state.value.loaded().and_then(|value| key(value));
                    (state.version, state.failed, next)
                };
                match next {
                    Some(next) if fetched.as_ref() != Some(&next) => {
                        fetched = Some(next.clone());
                        store(page, what, &slice, &notices, load(next)).await;
                    }
                    Some(_) => {}
                    None if failed => {
                        tracing::debug!(page, what, "prerequisite unavailable, skipping");
                    }
                    None => {}
                }
                progress_tx.send_replace(version);
                if rx.changed().await.is_err() {
                    return;
                }
            }
        });

        let prerequisite = prerequisite.clone();
        self.dependents.push(Dependent {
            what,
            progress: progress_rx,
            prerequisite_version: Box::new(move || prerequisite.version()),
            stopped: false,
        });
    }

    /// Wait until every fetch has finished and every dependent fetch has caught up with its
    /// prerequisite.
    pub async fn settle(&mut self) {
        loop {
            while let Some(joined) = self.tasks.join_next().await {
                if let Err(err) = joined {
                    if err.is_panic() {
                        tracing::error!(page = self.page, error = %err, "fetch task panicked");
                    }
                }
            }

            let mut quiet = true;
            for dependent in self.dependents.iter_mut().filter(|d| !d.stopped) {
                let target = (dependent.prerequisite_version)();
                if *dependent.progress.borrow() >= target {
                    continue;
                }
                quiet = false;
                if dependent.progress.wait_for(|seen| *seen >= target).await.is_err() {
                    tracing::error!(page = self.page, what = dependent.what, "dependent fetch stopped");
                    dependent.stopped = true;
                }
            }
            if quiet {
                break;
            }
        }
    }

    /// Abort every task still in flight.
    pub fn teardown(&mut self) {
        if !self.tasks.is_empty() {
            tracing::debug!(page = self.page, in_flight = self.tasks.len(), "tearing down");
        }
        self.tasks.abort_all();
        self.watchers.abort_all();
    }

    /// Notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.notices_rx.try_recv() {
            notices.push(notice);
        }
        notices
    }
}

impl Drop for PageScope {
    fn drop(&mut self) {
        self.teardown();
    }
}
