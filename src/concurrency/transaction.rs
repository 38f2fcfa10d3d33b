use crate::buffer::buffer_pool::BufferPool;
use crate::concurrency::lock_manager::LockMode;
use crate::errors::Result;
use slog::Logger;
use std::fmt;

/// Opaque transaction token; compared and hashed by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn new(id: u64) -> Self {
        TransactionId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

/// Access a transaction asks for when fetching a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

impl From<Permission> for LockMode {
    fn from(perm: Permission) -> Self {
        match perm {
            Permission::ReadOnly => LockMode::Shared,
            Permission::ReadWrite => LockMode::Exclusive,
        }
    }
}

/// A running transaction. Dropping it without `commit` aborts it.
pub struct Transaction<'a> {
    id: TransactionId,
    buffer_pool: &'a BufferPool,
    completed: bool,
    logger: Logger,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(id: TransactionId, buffer_pool: &'a BufferPool, logger: &Logger) -> Self {
        debug!(logger, "transaction started"; "tid" => %id);
        Self {
            id,
            buffer_pool,
            completed: false,
            logger: logger.clone(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn commit(mut self) -> Result<()> {
        self.complete(true)
    }

    pub fn abort(mut self) -> Result<()> {
        self.complete(false)
    }

    fn complete(&mut self, commit: bool) -> Result<()> {
        self.completed = true;
        self.buffer_pool.transaction_complete(self.id, commit)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        warn!(self.logger, "transaction dropped while active, aborting"; "tid" => %self.id);
        if let Err(e) = self.complete(false) {
            error!(self.logger, "abort on drop failed"; "tid" => %self.id, "error" => %e);
        }
    }
}
