pub mod heap_page;


use crate::concurrency::transaction::TransactionId;
use crate::errors::Result;
use crate::{PageNo, TableId};
use heap_page::HeapPage;
use std::fmt;

/// Identity of a page: the table it belongs to and its position in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    table_id: TableId,
    page_no: PageNo,
}

impl PageId {
    pub fn new(table_id: TableId, page_no: PageNo) -> Self {
        Self { table_id, page_no }
    }
    pub fn table_id(&self) -> TableId {
        self.table_id
    }
    pub fn page_no(&self) -> PageNo {
        self.page_no
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page {}:{}", self.table_id, self.page_no)
    }
}

/// Every physical page format the engine knows how to read.
#[derive(Debug, Clone)]
pub enum Page {
    Heap(HeapPage),
}

impl Page {
    pub fn get_id(&self) -> PageId {
        match self {
            Page::Heap(page) => page.get_id(),
        }
    }

    /// Byte-exact on-disk image of the page.
    pub fn get_data(&self) -> Result<Vec<u8>> {
        match self {
            Page::Heap(page) => page.get_data(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirtier().is_some()
    }

    /// Transaction that last dirtied the page, `None` while clean.
    pub fn dirtier(&self) -> Option<TransactionId> {
        match self {
            Page::Heap(page) => page.dirtier(),
        }
    }

    pub fn mark_dirty(&mut self, tid: TransactionId) {
        match self {
            Page::Heap(page) => page.mark_dirty(tid),
        }
    }

    pub fn mark_clean(&mut self) {
        match self {
            Page::Heap(page) => page.mark_clean(),
        }
    }

    pub fn as_heap(&self) -> &HeapPage {
        match self {
            Page::Heap(page) => page,
        }
    }

    pub fn as_heap_mut(&mut self) -> &mut HeapPage {
        match self {
            Page::Heap(page) => page,
        }
    }
}
