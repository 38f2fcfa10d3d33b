mod buffer;
mod catalog;
mod concurrency;
mod config;
mod database;
mod storage;
#[cfg(test)]
mod test_util;

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate slog;
extern crate slog_async;
extern crate slog_term;

pub use self::buffer::buffer_pool::{BufferPool, PageRef};
pub use self::buffer::lru_replacer::LruReplacer;
pub use self::buffer::replace::Replacer;
pub use self::catalog::Catalog;
pub use self::concurrency::deadlock::DeadlockDetector;
pub use self::concurrency::lock_manager::{LockManager, LockMode};
pub use self::concurrency::transaction::{Permission, Transaction, TransactionId};
pub use self::config::{Config, DeadlockPolicy};
pub use self::database::Database;
pub use self::storage::disk::disk_manager;
pub use self::storage::heap_file::{HeapFile, HeapFileIterator};
pub use self::storage::page::heap_page::HeapPage;
pub use self::storage::page::{Page, PageId};
pub use self::storage::tuple::{Field, RecordId, Tuple, TupleDesc, Type};

pub mod errors {
    pub use anyhow::Error;
    pub use anyhow::Result;

    use crate::{PageId, RecordId, TableId, TransactionId};

    #[derive(thiserror::Error, Debug)]
    pub enum DbError {
        #[error("{0} aborted: lock wait timed out")]
        TransactionAborted(TransactionId),

        #[error("{0} aborted: waits-for cycle detected")]
        DeadlockDetected(TransactionId),

        #[error("{page_id} is out of range, file has {num_pages} pages")]
        PageOutOfRange { page_id: PageId, num_pages: usize },

        #[error("short read on {page_id}: got {read} of {expected} bytes")]
        ShortRead {
            page_id: PageId,
            read: usize,
            expected: usize,
        },

        #[error("malformed page {0}: {1}")]
        MalformedPage(PageId, String),

        #[error("cannot evict: all {0} cached pages are dirty")]
        AllPagesDirty(usize),

        #[error("{0} has no empty slot")]
        PageFull(PageId),

        #[error("tuple {0:?} not found")]
        TupleNotFound(Option<RecordId>),

        #[error("tuple schema does not match table {0}")]
        SchemaMismatch(TableId),

        #[error("no table with id {0}")]
        NoSuchTable(TableId),

        #[error("no table named {0:?}")]
        NoSuchTableName(String),

        #[error("no field named {0:?}")]
        NoSuchField(String),
    }

    /// True for both ways a lock wait gives up: timeout and waits-for cycle.
    pub fn is_transaction_aborted(err: &Error) -> bool {
        matches!(
            err.downcast_ref::<DbError>(),
            Some(DbError::TransactionAborted(_)) | Some(DbError::DeadlockDetected(_))
        )
    }
}

pub fn default_logger() -> slog::Logger {
    use slog::Drain;

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    slog::Logger::root(drain, o!())
}

/// Bytes per page, header included.
pub const PAGE_SIZE: usize = 4096;
/// Pages cached by a buffer pool built from `Config::default()`.
pub const DEFAULT_POOL_PAGES: usize = 50;
/// Bytes of character data in a `Type::String` field.
pub const STRING_LEN: usize = 128;

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 500;
const DEFAULT_LOCK_POLL_MS: u64 = 5;

pub type TableId = u64;
pub type PageNo = u32;
pub type SlotId = usize;
