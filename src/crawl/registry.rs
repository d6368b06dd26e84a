// src/crawl/registry.rs
// =============================================================================
// The URL registry: every URL the crawler has ever seen, plus which of them
// have already been handed out for processing.
//
// How it works:
// - Entries live in an arena (a Vec) and are never removed
// - An index maps the canonical URL string to its slot in the arena
// - A pending list holds the slots that are still unused
//
// All three live behind ONE mutex. Flipping an entry to "used" and taking
// it off the pending list happen in the same critical section, so no caller
// can ever observe an entry that is used but still pending (or the reverse).
//
// Rust concepts:
// - parking_lot::Mutex: like std's Mutex, but lock() can't fail (no poisoning)
// - Interior mutability: methods take &self, the mutex guards the state
// - Arc<UrlRegistry>: shared ownership across tokio tasks
// =============================================================================

use parking_lot::Mutex;
use std::collections::HashMap;
use url::Url;

#[derive(Debug)]
struct Entry {
    url: Url,
    used: bool,
}

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<Entry>,
    // canonical string -> slot in `entries`
    index: HashMap<String, usize>,
    // slots whose entry is still unused; order is not significant
    pending: Vec<usize>,
}

/// Thread-safe set of discovered URLs with a one-way unused -> used status.
#[derive(Debug, Default)]
pub struct UrlRegistry {
    inner: Mutex<Inner>,
}

// Returns the canonical form of a URL: the absolute URL without its fragment
//
// The url crate already normalizes scheme/host case, default ports and
// dot segments while parsing, so only the fragment needs stripping.
//
// Example:
//   "https://Example.com:443/a/../doc.pdf#page=2" -> "https://example.com/doc.pdf"
pub fn canonicalize(url: &Url) -> Url {
    let mut canonical = url.clone();
    canonical.set_fragment(None);
    canonical
}

impl UrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the canonical form of `url` if it is not already present.
    ///
    /// Returns `true` only for the call that actually inserted the entry.
    pub fn add(&self, url: &Url) -> bool {
        let canonical = canonicalize(url);
        let key = canonical.as_str().to_owned();

        let mut inner = self.inner.lock();
        if inner.index.contains_key(&key) {
            return false;
        }

        let slot = inner.entries.len();
        inner.entries.push(Entry { url: canonical, used: false });
        inner.index.insert(key, slot);
        inner.pending.push(slot);
        true
    }

    /// Parses and inserts a raw URL string. Empty or unparsable input is
    /// rejected with `false`.
    #[cfg(test)]
    pub fn add_str(&self, raw: &str) -> bool {
        let raw = raw.trim();
        if raw.is_empty() {
            return false;
        }
        match Url::parse(raw) {
            Ok(url) => self.add(&url),
            Err(_) => false,
        }
    }

    /// Takes one unused entry, marks it used and returns a copy of its URL.
    ///
    /// Returns `None` once every entry has been handed out. No entry is ever
    /// returned twice.
    pub fn acquire_next(&self) -> Option<Url> {
        let mut inner = self.inner.lock();
        let slot = inner.pending.pop()?;
        let entry = &mut inner.entries[slot];
        entry.used = true;
        Some(entry.url.clone())
    }

    /// Snapshot of every URL ever added, in discovery order.
    pub fn all(&self) -> Vec<Url> {
        let inner = self.inner.lock();
        inner.entries.iter().map(|entry| entry.url.clone()).collect()
    }

    /// Point lookup: (exists, used).
    #[cfg(test)]
    pub fn status(&self, url: &Url) -> (bool, bool) {
        let key = canonicalize(url);
        let inner = self.inner.lock();
        match inner.index.get(key.as_str()) {
            Some(&slot) => (true, inner.entries[slot].used),
            None => (false, false),
        }
    }

    /// Diagnostic counters: (total, used).
    pub fn counts(&self) -> (usize, usize) {
        let inner = self.inner.lock();
        let total = inner.entries.len();
        // pending holds exactly the unused entries
        (total, total - inner.pending.len())
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why one lock instead of one per field?
//    - add() touches the index, the arena and the pending list together
//    - With separate locks, another thread could run between the updates
//      and see a half-finished insert (a classic check-then-act race)
//
// 2. Why is acquire_next() a pop()?
//    - pending only ever holds unused slots
//    - Popping under the lock removes the slot and flips its status in one
//      step, so two callers can't both get it
//
// 3. Why return Url clones?
//    - Callers get their own copy and can't mutate registry state
//    - The registry keeps sole ownership of its entries
// -----------------------------------------------------------------------------
