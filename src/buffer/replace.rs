use crate::storage::page::PageId;

/// Chooses which cached page to discard. Pinned pages are never chosen.
pub trait Replacer {
    fn victim(&mut self) -> Option<PageId>;
    fn pin(&mut self, page_id: PageId);
    fn unpin(&mut self, page_id: PageId);
    fn record_access(&mut self, page_id: PageId);
    fn remove(&mut self, page_id: PageId);
    fn size(&self) -> usize;
}
