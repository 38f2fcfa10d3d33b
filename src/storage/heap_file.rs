use crate::buffer::buffer_pool::{BufferPool, PageRef};
use crate::concurrency::transaction::{Permission, TransactionId};
use crate::errors::{DbError, Result};
use crate::storage::disk::disk_manager::DiskManager;
use crate::storage::page::heap_page::HeapPage;
use crate::storage::page::{Page, PageId};
use crate::storage::tuple::{Tuple, TupleDesc};
use crate::{PageNo, TableId};
use parking_lot::Mutex;
use slog::Logger;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Unordered collection of one table's tuples stored in fixed-size heap
/// pages. Page `n` lives at byte offset `n * page_size` of the backing file.
pub struct HeapFile {
    id: TableId,
    desc: Arc<TupleDesc>,
    page_size: usize,
    disk_manager: Mutex<DiskManager>,
    logger: Logger,
}

impl HeapFile {
    /// Opens (or creates empty) the heap file at `path`.
    pub fn open<P: AsRef<Path>>(
        path: P,
        desc: Arc<TupleDesc>,
        page_size: usize,
        logger: &Logger,
    ) -> Result<Self> {
        if HeapPage::num_slots_for(page_size, &desc) == 0 {
            bail!(
                "{}-byte tuples do not fit a {}-byte page",
                desc.size(),
                page_size
            );
        }
        let disk_manager = DiskManager::new(path, page_size, logger)?;
        let id = Self::table_id_for(disk_manager.path())?;
        let logger = logger.new(o!("table" => id));
        debug!(logger, "heap file opened"; "path" => %disk_manager.path().display(), "schema" => %desc);

        Ok(Self {
            id,
            desc,
            page_size,
            disk_manager: Mutex::new(disk_manager),
            logger,
        })
    }

    // Stable for a given file: hash of its absolute path.
    fn table_id_for(path: &Path) -> Result<TableId> {
        let mut hasher = DefaultHasher::new();
        path.canonicalize()?.hash(&mut hasher);
        Ok(hasher.finish())
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn tuple_desc(&self) -> &Arc<TupleDesc> {
        &self.desc
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn path(&self) -> PathBuf {
        self.disk_manager.lock().path().to_path_buf()
    }

    pub fn num_pages(&self) -> Result<usize> {
        self.disk_manager.lock().num_pages()
    }

    pub fn read_page(&self, pid: PageId) -> Result<Page> {
        if pid.table_id() != self.id {
            bail!("{} does not belong to table {}", pid, self.id);
        }
        let mut data = vec![0u8; self.page_size];
        self.disk_manager.lock().read_page(pid, &mut data)?;
        Ok(Page::Heap(HeapPage::new(pid, self.desc.clone(), &data)?))
    }

    /// Writes the page image back and marks the page clean.
    pub fn write_page(&self, page: &mut Page) -> Result<()> {
        let data = page.get_data()?;
        self.disk_manager.lock().write_page(page.get_id(), &data)?;
        page.mark_clean();
        Ok(())
    }

    /// Grows the file by one empty page.
    pub fn allocate_page(&self) -> Result<PageId> {
        let page_no = self.disk_manager.lock().allocate_page()?;
        Ok(PageId::new(self.id, page_no))
    }

    /// Places the tuple in the first page with a free slot, appending a page
    /// when every existing one is full. Returns the page that was modified.
    ///
    /// Full pages are unlocked again unless `tid` already held a lock on
    /// them before this call.
    pub fn insert_tuple(
        &self,
        buffer_pool: &BufferPool,
        tid: TransactionId,
        tuple: &mut Tuple,
    ) -> Result<Vec<PageRef>> {
        if **tuple.desc() != *self.desc {
            return Err(DbError::SchemaMismatch(self.id).into());
        }

        let mut page_no = 0;
        loop {
            let num_pages = self.num_pages()?;
            while page_no < num_pages {
                let pid = PageId::new(self.id, page_no as PageNo);
                let held_before = buffer_pool.holds_lock(tid, pid);
                let page = buffer_pool.get_page(tid, pid, Permission::ReadWrite)?;

                let inserted = {
                    let mut guard = page.write();
                    if guard.as_heap().num_unused_slots() > 0 {
                        guard.as_heap_mut().insert_tuple(tuple)?;
                        guard.mark_dirty(tid);
                        true
                    } else {
                        false
                    }
                };
                if inserted {
                    return Ok(vec![page]);
                }

                if !held_before {
                    buffer_pool.unsafe_release_page(tid, pid);
                }
                page_no += 1;
            }

            // another transaction may fill the new page first; rescan from it
            let pid = self.allocate_page()?;
            debug!(self.logger, "file grown"; "page" => %pid, "tid" => %tid);
        }
    }

    /// Frees the slot named by the tuple's record id.
    pub fn delete_tuple(
        &self,
        buffer_pool: &BufferPool,
        tid: TransactionId,
        tuple: &Tuple,
    ) -> Result<Vec<PageRef>> {
        let record_id = tuple.record_id();
        let pid = match record_id {
            Some(rid)
                if rid.page_id().table_id() == self.id
                    && (rid.page_id().page_no() as usize) < self.num_pages()? =>
            {
                rid.page_id()
            }
            _ => return Err(DbError::TupleNotFound(record_id).into()),
        };

        let page = buffer_pool.get_page(tid, pid, Permission::ReadWrite)?;
        {
            let mut guard = page.write();
            guard.as_heap_mut().delete_tuple(tuple)?;
            guard.mark_dirty(tid);
        }
        Ok(vec![page])
    }

    pub fn iterator<'a>(
        self: &Arc<Self>,
        buffer_pool: &'a BufferPool,
        tid: TransactionId,
    ) -> HeapFileIterator<'a> {
        HeapFileIterator::new(self.clone(), buffer_pool, tid)
    }
}

/// Forward scan over every tuple of a heap file in page order.
///
/// Pages are fetched lazily with read permission on behalf of `tid`. The
/// scan yields nothing until `open` is called and can be restarted with
/// `rewind`.
pub struct HeapFileIterator<'a> {
    file: Arc<HeapFile>,
    buffer_pool: &'a BufferPool,
    tid: TransactionId,
    next_page: usize,
    tuples: VecDeque<Tuple>,
    opened: bool,
}

impl<'a> HeapFileIterator<'a> {
    pub fn new(file: Arc<HeapFile>, buffer_pool: &'a BufferPool, tid: TransactionId) -> Self {
        Self {
            file,
            buffer_pool,
            tid,
            next_page: 0,
            tuples: VecDeque::new(),
            opened: false,
        }
    }

    pub fn open(&mut self) {
        self.next_page = 0;
        self.tuples.clear();
        self.opened = true;
    }

    pub fn has_next(&mut self) -> Result<bool> {
        if !self.opened {
            return Ok(false);
        }
        // skip over empty pages
        while self.tuples.is_empty() {
            if self.next_page >= self.file.num_pages()? {
                return Ok(false);
            }
            let pid = PageId::new(self.file.id(), self.next_page as PageNo);
            let page = self
                .buffer_pool
                .get_page(self.tid, pid, Permission::ReadOnly)?;
            self.tuples
                .extend(page.read().as_heap().tuples().cloned());
            self.next_page += 1;
        }
        Ok(true)
    }

    pub fn rewind(&mut self) {
        self.close();
        self.open();
    }

    pub fn close(&mut self) {
        self.opened = false;
        self.tuples.clear();
    }
}

impl Iterator for HeapFileIterator<'_> {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => self.tuples.pop_front().map(Ok),
            Ok(false) => None,
            Err(e) => {
                self.close();
                Some(Err(e))
            }
        }
    }
}
