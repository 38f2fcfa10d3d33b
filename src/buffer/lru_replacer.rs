use crate::buffer::replace::Replacer;
use crate::storage::page::PageId;
use hashlink::LinkedHashMap;
use std::collections::HashSet;

/// Least-recently-used replacer over a hash-indexed linked list.
///
/// Evictable pages live in `evictable`, least recently used at the front,
/// so `victim` is a single `pop_front`. Pinned pages are kept aside and
/// re-enter the list as most recently used when unpinned.
#[derive(Default)]
pub struct LruReplacer {
    evictable: LinkedHashMap<PageId, ()>,
    pinned: HashSet<PageId>,
}

impl LruReplacer {
    pub fn new(num_pages: usize) -> Self {
        Self {
            evictable: LinkedHashMap::with_capacity(num_pages),
            pinned: HashSet::with_capacity(num_pages),
        }
    }

    /// Evictable pages, least recently used first.
    pub fn lru_order(&self) -> Vec<PageId> {
        self.evictable.keys().copied().collect()
    }

    pub fn is_pinned(&self, page_id: PageId) -> bool {
        self.pinned.contains(&page_id)
    }

    fn touch(&mut self, page_id: PageId) {
        self.evictable.remove(&page_id);
        self.evictable.insert(page_id, ());
    }
}

impl Replacer for LruReplacer {
    fn victim(&mut self) -> Option<PageId> {
        self.evictable.pop_front().map(|(page_id, _)| page_id)
    }

    fn pin(&mut self, page_id: PageId) {
        self.evictable.remove(&page_id);
        self.pinned.insert(page_id);
    }

    fn unpin(&mut self, page_id: PageId) {
        self.pinned.remove(&page_id);
        self.touch(page_id);
    }

    fn record_access(&mut self, page_id: PageId) {
        if !self.pinned.contains(&page_id) {
            self.touch(page_id);
        }
    }

    fn remove(&mut self, page_id: PageId) {
        self.evictable.remove(&page_id);
        self.pinned.remove(&page_id);
    }

    fn size(&self) -> usize {
        self.evictable.len()
    }
}
