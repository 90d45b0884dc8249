use std::{
    collections::{HashSet, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use crate::urlnorm;

struct FrontierState {
    /// FIFO of admitted, unclaimed canonical URLs.
    pending: VecDeque<String>,
    /// Everything currently in `pending`. Disjoint from `visited`.
    queued: HashSet<String>,
    /// Everything ever claimed, whatever the fetch outcome.
    visited: HashSet<String>,
}

/// Shared crawl frontier: a work queue plus the bookkeeping that guarantees
/// each URL is claimed at most once, and the active-worker counter that the
/// termination predicate depends on.
///
/// One mutex covers all three collections: `pending` membership mirrors
/// `queued`, and `queued`/`visited` must stay disjoint.
pub struct Frontier {
    allowed_domains: HashSet<String>,
    allowed_extensions: HashSet<String>,
    state: Mutex<FrontierState>,
    active: AtomicUsize,
}

impl Frontier {
    /// `allowed_domains` entries must be lowercase; `allowed_extensions`
    /// entries lowercase and dot-prefixed (`Config` produces both).
    pub fn new(allowed_domains: HashSet<String>, allowed_extensions: HashSet<String>) -> Self {
        Self {
            allowed_domains,
            allowed_extensions,
            state: Mutex::new(FrontierState {
                pending: VecDeque::new(),
                queued: HashSet::new(),
                visited: HashSet::new(),
            }),
            active: AtomicUsize::new(0),
        }
    }

    /// Canonicalize and admit a candidate URL. Returns whether it was
    /// actually added to the queue.
    ///
    /// Admission requires: parseable after fragment strip, host on the
    /// allow-list, extension empty or allowed, not already queued or
    /// visited.
    pub fn enqueue(&self, raw: &str) -> bool {
        let canonical = match urlnorm::canonicalize(raw) {
            Some(c) => c,
            None => return false,
        };
        let parsed = match urlnorm::parse(&canonical) {
            Some(p) => p,
            None => return false,
        };
        if !self.allowed_domains.contains(&parsed.host) {
            return false;
        }
        let ext = urlnorm::extension(&canonical);
        if !ext.is_empty() && !self.allowed_extensions.contains(&format!(".{ext}")) {
            return false;
        }

        let mut st = self.state.lock().unwrap();
        if st.queued.contains(&canonical) || st.visited.contains(&canonical) {
            return false;
        }
        st.queued.insert(canonical.clone());
        st.pending.push_back(canonical);
        true
    }

    /// Pop the head of the queue, moving it into `visited` and counting the
    /// caller as active. `None` when the queue is empty.
    ///
    /// The active counter is bumped inside the critical section, before the
    /// URL leaves `pending`, so `should_stop` can never observe an empty
    /// queue with the claimed URL unaccounted for.
    pub fn claim(&self) -> Option<String> {
        let mut st = self.state.lock().unwrap();
        if st.pending.is_empty() {
            return None;
        }
        self.active.fetch_add(1, Ordering::SeqCst);
        let url = st.pending.pop_front().unwrap();
        st.queued.remove(&url);
        st.visited.insert(url.clone());
        Some(url)
    }

    /// Mark the caller as no longer active.
    pub fn release(&self) {
        let _ = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Termination predicate: nothing left to claim and nobody mid-fetch.
    pub fn should_stop(&self) -> bool {
        let st = self.state.lock().unwrap();
        st.pending.is_empty() && self.active.load(Ordering::SeqCst) == 0
    }

    pub fn visited_count(&self) -> usize {
        self.state.lock().unwrap().visited.len()
    }

    pub fn queued_count(&self) -> usize {
        self.state.lock().unwrap().queued.len()
    }
}
