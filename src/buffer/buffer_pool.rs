use crate::buffer::lru_replacer::LruReplacer;
use crate::buffer::replace::Replacer;
use crate::catalog::Catalog;
use crate::concurrency::lock_manager::{LockManager, LockMode};
use crate::concurrency::transaction::{Permission, TransactionId};
use crate::config::{Config, DeadlockPolicy};
use crate::errors::{DbError, Result};
use crate::storage::page::{Page, PageId};
use crate::storage::tuple::Tuple;
use crate::TableId;
use parking_lot::{Mutex, RwLock};
use slog::Logger;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Shared handle to a cached page. The latch only guards memory; logical
/// access is governed by the page locks taken in [`BufferPool::get_page`].
pub type PageRef = Arc<RwLock<Page>>;

struct PoolState {
    // Page table for keeping track of buffer pool pages
    pages: HashMap<PageId, PageRef>,
    // Dirty pages are pinned: NO-STEAL forbids dropping them before commit
    replacer: LruReplacer,
}

/// Transactional page cache.
///
/// Every page access first takes a page lock through the [`LockManager`]
/// (strict two-phase locking: locks are held until `transaction_complete`).
/// Dirty pages are never written out or evicted before their transaction
/// commits, so an abort only has to re-read the on-disk image.
pub struct BufferPool {
    // Number of pages in the buffer pool
    pool_size: usize,
    state: Mutex<PoolState>,
    lock_manager: LockManager,
    catalog: Arc<Catalog>,
    lock_timeout: Duration,
    lock_poll_interval: Duration,
    deadlock_policy: DeadlockPolicy,
    logger: Logger,
}

impl BufferPool {
    pub fn new(config: &Config, catalog: Arc<Catalog>, logger: &Logger) -> Self {
        let pool_size = config.buffer_pool_pages;
        Self {
            pool_size,
            state: Mutex::new(PoolState {
                pages: HashMap::with_capacity(pool_size),
                replacer: LruReplacer::new(pool_size),
            }),
            lock_manager: LockManager::new(logger),
            catalog,
            lock_timeout: config.lock_timeout,
            lock_poll_interval: config.lock_poll_interval,
            deadlock_policy: config.deadlock_policy,
            logger: logger.clone(),
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }

    /// Locks `pid` for `tid` and returns the cached page, reading it from its
    /// heap file on a miss.
    ///
    /// Fails with `DbError::TransactionAborted` when the lock cannot be
    /// granted in time; the caller must then abort the transaction.
    pub fn get_page(&self, tid: TransactionId, pid: PageId, perm: Permission) -> Result<PageRef> {
        self.acquire_lock(tid, pid, perm.into())?;

        let mut state = self.state.lock();
        if let Some(page) = state.pages.get(&pid).cloned() {
            state.replacer.record_access(pid);
            return Ok(page);
        }

        let file = self.catalog.database_file(pid.table_id())?;
        let page = Arc::new(RwLock::new(file.read_page(pid)?));
        self.admit(&mut state, pid, page.clone())?;
        debug!(self.logger, "page loaded"; "page" => %pid, "tid" => %tid, "cached" => state.pages.len());
        Ok(page)
    }

    fn acquire_lock(&self, tid: TransactionId, pid: PageId, mode: LockMode) -> Result<()> {
        let start = Instant::now();
        loop {
            if self.lock_manager.try_acquire(tid, pid, mode) {
                return Ok(());
            }

            if self.deadlock_policy == DeadlockPolicy::WaitsForGraph {
                if let Some(cycle) = self.lock_manager.find_deadlock(tid) {
                    self.lock_manager.cancel_wait(tid);
                    warn!(self.logger, "deadlock, aborting"; "tid" => %tid, "page" => %pid, "cycle" => ?cycle);
                    return Err(DbError::DeadlockDetected(tid).into());
                }
            }

            if start.elapsed() > self.lock_timeout {
                self.lock_manager.cancel_wait(tid);
                warn!(self.logger, "lock wait timed out, aborting"; "tid" => %tid, "page" => %pid, "mode" => ?mode);
                return Err(DbError::TransactionAborted(tid).into());
            }

            thread::sleep(self.lock_poll_interval);
        }
    }

    // Inserts a page not yet cached, evicting first when the pool is full.
    fn admit(&self, state: &mut PoolState, pid: PageId, page: PageRef) -> Result<()> {
        if !state.pages.contains_key(&pid) && state.pages.len() >= self.pool_size {
            self.evict_page(state)?;
        }
        state.pages.insert(pid, page);
        state.replacer.record_access(pid);
        Ok(())
    }

    // Discards the least recently used clean page.
    fn evict_page(&self, state: &mut PoolState) -> Result<()> {
        while let Some(pid) = state.replacer.victim() {
            let dirty = match state.pages.get(&pid) {
                Some(page) => page.read().is_dirty(),
                None => continue,
            };
            if dirty {
                // dirtied behind the pool's back; keep it until its transaction ends
                state.replacer.pin(pid);
                continue;
            }
            state.pages.remove(&pid);
            debug!(self.logger, "page evicted"; "page" => %pid);
            return Ok(());
        }

        warn!(self.logger, "eviction failed, every cached page is dirty"; "cached" => state.pages.len());
        Err(DbError::AllPagesDirty(state.pages.len()).into())
    }

    /// Adds a tuple to `table_id` on behalf of `tid`, setting the tuple's
    /// record id. Touched pages are marked dirty and kept cached.
    pub fn insert_tuple(&self, tid: TransactionId, table_id: TableId, tuple: &mut Tuple) -> Result<()> {
        let file = self.catalog.database_file(table_id)?;
        for page in file.insert_tuple(self, tid, tuple)? {
            self.cache_dirtied(tid, page)?;
        }
        Ok(())
    }

    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> Result<()> {
        let record_id = tuple
            .record_id()
            .ok_or(DbError::TupleNotFound(None))?;
        let file = self.catalog.database_file(record_id.page_id().table_id())?;
        for page in file.delete_tuple(self, tid, tuple)? {
            self.cache_dirtied(tid, page)?;
        }
        Ok(())
    }

    fn cache_dirtied(&self, tid: TransactionId, page: PageRef) -> Result<()> {
        let pid = {
            let mut guard = page.write();
            guard.mark_dirty(tid);
            guard.get_id()
        };

        let mut state = self.state.lock();
        let cached = state.pages.get(&pid).cloned();
        match cached {
            Some(current) if Arc::ptr_eq(&current, &page) => state.replacer.record_access(pid),
            Some(_) => {
                state.pages.insert(pid, page);
                state.replacer.record_access(pid);
            }
            None => self.admit(&mut state, pid, page)?,
        }
        state.replacer.pin(pid);
        Ok(())
    }

    /// Releases one lock before the transaction ends.
    ///
    /// This breaks strict two-phase locking unless the transaction never
    /// read or wrote anything on the page.
    pub fn unsafe_release_page(&self, tid: TransactionId, pid: PageId) {
        self.lock_manager.release(tid, pid);
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.lock_manager.holds_lock(tid, pid)
    }

    /// Commits (flushes) or aborts (reverts) every page `tid` dirtied, then
    /// releases all of its locks. Locks are released even if the flush or
    /// revert fails; that failure is returned afterwards.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> Result<()> {
        let result = if commit {
            self.flush_pages(tid)
        } else {
            self.revert_pages(tid)
        };
        let released = self.lock_manager.release_all(tid);
        info!(
            self.logger,
            "transaction complete";
            "tid" => %tid, "commit" => commit, "locks_released" => released.len(), "ok" => result.is_ok()
        );
        result
    }

    /// Writes every page dirtied by `tid` to disk.
    ///
    /// A page that cannot be written is dropped from the cache, so the disk
    /// keeps its last committed image. Every page is handled before the
    /// first failure is returned.
    pub fn flush_pages(&self, tid: TransactionId) -> Result<()> {
        let mut state = self.state.lock();
        let mut result = Ok(());
        for (pid, page) in Self::dirtied_by(&state, Some(tid)) {
            match self.write_back(&page) {
                Ok(()) => state.replacer.unpin(pid),
                Err(e) => {
                    error!(self.logger, "flush failed, dropping page"; "page" => %pid, "tid" => %tid, "error" => %e);
                    Self::discard(&mut state, pid);
                    result = result.and(Err(e));
                }
            }
        }
        result
    }

    // NO-STEAL means the on-disk image is the last committed one, so a page
    // that cannot be reloaded is simply dropped.
    fn revert_pages(&self, tid: TransactionId) -> Result<()> {
        let mut state = self.state.lock();
        let mut result = Ok(());
        for (pid, page) in Self::dirtied_by(&state, Some(tid)) {
            let reloaded = self
                .catalog
                .database_file(pid.table_id())
                .and_then(|file| file.read_page(pid));
            match reloaded {
                Ok(clean) => {
                    *page.write() = clean;
                    state.replacer.unpin(pid);
                    debug!(self.logger, "page reverted"; "page" => %pid, "tid" => %tid);
                }
                Err(e) => {
                    warn!(self.logger, "revert failed, dropping page"; "page" => %pid, "tid" => %tid, "error" => %e);
                    Self::discard(&mut state, pid);
                    result = result.and(Err(e));
                }
            }
        }
        result
    }

    /// Writes every dirty page to disk, whoever dirtied it.
    ///
    /// This writes uncommitted data, which an abort cannot undo.
    pub fn flush_all_pages(&self) -> Result<()> {
        let mut state = self.state.lock();
        for (pid, page) in Self::dirtied_by(&state, None) {
            self.write_back(&page)?;
            state.replacer.unpin(pid);
        }
        Ok(())
    }

    pub fn flush_page(&self, pid: PageId) -> Result<()> {
        let mut state = self.state.lock();
        let page = match state.pages.get(&pid).cloned() {
            Some(page) => page,
            None => return Ok(()),
        };
        if page.read().is_dirty() {
            self.write_back(&page)?;
            state.replacer.unpin(pid);
        }
        Ok(())
    }

    /// Drops `pid` from the cache without writing it.
    pub fn remove_page(&self, pid: PageId) {
        let mut state = self.state.lock();
        if Self::discard(&mut state, pid) {
            debug!(self.logger, "page removed"; "page" => %pid);
        }
    }

    fn discard(state: &mut PoolState, pid: PageId) -> bool {
        state.replacer.remove(pid);
        state.pages.remove(&pid).is_some()
    }

    pub fn is_cached(&self, pid: PageId) -> bool {
        self.state.lock().pages.contains_key(&pid)
    }

    pub fn num_cached(&self) -> usize {
        self.state.lock().pages.len()
    }

    /// Evictable pages from least to most recently used, then the dirty ones.
    pub fn cached_page_ids(&self) -> Vec<PageId> {
        let state = self.state.lock();
        let mut ids = state.replacer.lru_order();
        let mut dirty: Vec<PageId> = state
            .pages
            .keys()
            .filter(|pid| state.replacer.is_pinned(**pid))
            .copied()
            .collect();
        dirty.sort();
        ids.extend(dirty);
        ids
    }

    // Dirty pages, restricted to one transaction's when `tid` is given.
    fn dirtied_by(state: &PoolState, tid: Option<TransactionId>) -> Vec<(PageId, PageRef)> {
        state
            .pages
            .iter()
            .filter(|(_, page)| {
                let dirtier = page.read().dirtier();
                dirtier.is_some() && (tid.is_none() || dirtier == tid)
            })
            .map(|(pid, page)| (*pid, page.clone()))
            .collect()
    }

    fn write_back(&self, page: &PageRef) -> Result<()> {
        let mut page = page.write();
        let file = self.catalog.database_file(page.get_id().table_id())?;
        file.write_page(&mut page)
    }
}
