use crate::concurrency::deadlock::DeadlockDetector;
use crate::concurrency::transaction::TransactionId;
use crate::storage::page::PageId;
use parking_lot::Mutex;
use slog::Logger;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

#[derive(Default)]
struct LockTable {
    // Holders per page: all Shared, or exactly one Exclusive.
    pages: HashMap<PageId, HashMap<TransactionId, LockMode>>,
    // Pages each transaction holds a lock on
    held: HashMap<TransactionId, HashSet<PageId>>,
    // Holders each blocked transaction was denied by on its latest attempt
    waits_for: HashMap<TransactionId, HashSet<TransactionId>>,
}

impl LockTable {
    // Grants the lock or returns the holders standing in the way.
    fn grant(
        &mut self,
        tid: TransactionId,
        pid: PageId,
        mode: LockMode,
    ) -> Result<(), HashSet<TransactionId>> {
        let holders = self.pages.entry(pid).or_default();
        let blockers: HashSet<TransactionId> = match (mode, holders.get(&tid)) {
            (_, Some(LockMode::Exclusive)) | (LockMode::Shared, Some(LockMode::Shared)) => {
                return Ok(())
            }
            (LockMode::Shared, None) => holders
                .iter()
                .filter(|(_, m)| **m == LockMode::Exclusive)
                .map(|(t, _)| *t)
                .collect(),
            // fresh exclusive request, or an upgrade that is only legal for the sole holder
            (LockMode::Exclusive, _) => holders.keys().filter(|t| **t != tid).copied().collect(),
        };

        if !blockers.is_empty() {
            return Err(blockers);
        }
        holders.insert(tid, mode);
        self.held.entry(tid).or_default().insert(pid);
        Ok(())
    }

    fn release(&mut self, tid: TransactionId, pid: PageId) -> bool {
        let (removed, now_empty) = match self.pages.get_mut(&pid) {
            Some(holders) => (holders.remove(&tid).is_some(), holders.is_empty()),
            None => (false, false),
        };
        if now_empty {
            self.pages.remove(&pid);
        }
        if let Some(pages) = self.held.get_mut(&tid) {
            pages.remove(&pid);
            if pages.is_empty() {
                self.held.remove(&tid);
            }
        }
        removed
    }
}

/// Page-granularity shared/exclusive lock table.
///
/// Granting only looks at the current holders of the requested page, so a
/// denied caller is expected to poll `try_acquire` until it succeeds or
/// gives up. Denials are remembered as waits-for edges for
/// [`LockManager::find_deadlock`].
pub struct LockManager {
    table: Mutex<LockTable>,
    logger: Logger,
}

impl LockManager {
    pub fn new(logger: &Logger) -> Self {
        Self {
            table: Mutex::new(LockTable::default()),
            logger: logger.clone(),
        }
    }

    /// Non-blocking acquire. Re-requesting a held lock is a no-op, and a
    /// sole shared holder asking for exclusive is upgraded in place.
    pub fn try_acquire(&self, tid: TransactionId, pid: PageId, mode: LockMode) -> bool {
        let mut table = self.table.lock();
        match table.grant(tid, pid, mode) {
            Ok(()) => {
                table.waits_for.remove(&tid);
                debug!(self.logger, "lock granted"; "tid" => %tid, "page" => %pid, "mode" => ?mode);
                true
            }
            Err(blockers) => {
                table.waits_for.insert(tid, blockers);
                false
            }
        }
    }

    pub fn release(&self, tid: TransactionId, pid: PageId) -> bool {
        self.table.lock().release(tid, pid)
    }

    /// Drops every lock `tid` holds and forgets it was waiting. Returns the
    /// pages that were unlocked.
    pub fn release_all(&self, tid: TransactionId) -> Vec<PageId> {
        let mut table = self.table.lock();
        table.waits_for.remove(&tid);
        let pages: Vec<PageId> = table
            .held
            .get(&tid)
            .map(|pages| pages.iter().copied().collect())
            .unwrap_or_default();
        for pid in &pages {
            table.release(tid, *pid);
        }
        debug!(self.logger, "released all locks"; "tid" => %tid, "count" => pages.len());
        pages
    }

    /// Stop treating `tid` as blocked, e.g. after it gave up waiting.
    pub fn cancel_wait(&self, tid: TransactionId) {
        self.table.lock().waits_for.remove(&tid);
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        self.lock_mode(tid, pid).is_some()
    }

    pub fn lock_mode(&self, tid: TransactionId, pid: PageId) -> Option<LockMode> {
        let table = self.table.lock();
        table
            .pages
            .get(&pid)
            .and_then(|holders| holders.get(&tid))
            .copied()
    }

    pub fn pages_locked_by(&self, tid: TransactionId) -> Vec<PageId> {
        let table = self.table.lock();
        let mut pages: Vec<PageId> = table
            .held
            .get(&tid)
            .map(|pages| pages.iter().copied().collect())
            .unwrap_or_default();
        pages.sort();
        pages
    }

    /// A cycle of the waits-for graph passing through `tid`, if any.
    pub fn find_deadlock(&self, tid: TransactionId) -> Option<Vec<TransactionId>> {
        let table = self.table.lock();
        DeadlockDetector::find_cycle(&table.waits_for, tid)
    }
}
