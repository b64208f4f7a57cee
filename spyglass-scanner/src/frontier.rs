// Crawl frontier and visitation tracking shared by the worker pool

use crate::domain::url_identity;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use url::Url;

/// A URL waiting to be crawled, with its hop count from the seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: usize,
}

impl FrontierEntry {
    pub fn new(url: Url, depth: usize) -> Self {
        Self { url, depth }
    }

    pub fn seed(url: Url) -> Self {
        Self::new(url, 0)
    }
}

/// Records every URL identity dispatched to a fetch during one run.
pub struct VisitTracker {
    visited: Mutex<HashSet<String>>,
    max_depth: usize,
}

impl VisitTracker {
    pub fn new(max_depth: usize) -> Self {
        Self {
            visited: Mutex::new(HashSet::new()),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Check-and-mark in one step. Returns false when the identity was
    /// already admitted or `depth` lies beyond the bound.
    pub fn admit(&self, url: &Url, depth: usize) -> bool {
        if depth > self.max_depth {
            return false;
        }
        let mut visited = self.visited.lock().unwrap_or_else(|e| e.into_inner());
        visited.insert(url_identity(url))
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        let visited = self.visited.lock().unwrap_or_else(|e| e.into_inner());
        visited.contains(&url_identity(url))
    }

    pub fn visited_count(&self) -> usize {
        self.visited.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Work queue with an outstanding counter covering queued and in-flight
/// entries. The crawl is drained once the counter returns to zero.
pub struct Frontier {
    queue: Mutex<VecDeque<FrontierEntry>>,
    outstanding: AtomicUsize,
    notify: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            outstanding: AtomicUsize::new(0),
            notify: Notify::new(),
        }
    }

    pub fn push(&self, entry: FrontierEntry) {
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(entry);
        self.notify.notify_one();
    }

    /// Waits for the next entry. Returns `None` once the frontier is drained.
    ///
    /// Every entry handed out must be acknowledged with [`Frontier::complete`]
    /// after its children have been pushed.
    pub async fn next(&self) -> Option<FrontierEntry> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let next = self
                .queue
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front();
            if next.is_some() {
                return next;
            }
            if self.outstanding.load(Ordering::SeqCst) == 0 {
                return None;
            }

            notified.await;
        }
    }

    pub fn complete(&self) {
        if self.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.notify.notify_waiters();
        }
    }

    /// Completes one entry when dropped, including on unwind.
    pub fn completion_guard(&self) -> CompletionGuard<'_> {
        CompletionGuard { frontier: self }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

pub struct CompletionGuard<'a> {
    frontier: &'a Frontier,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        self.frontier.complete();
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}
