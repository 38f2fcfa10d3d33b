use crate::buffer::buffer_pool::BufferPool;
use crate::catalog::Catalog;
use crate::concurrency::transaction::{Transaction, TransactionId};
use crate::config::Config;
use crate::errors::Result;
use crate::storage::heap_file::{HeapFile, HeapFileIterator};
use crate::storage::tuple::TupleDesc;
use crate::TableId;
use slog::Logger;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Top-level context: the catalog, the buffer pool in front of it, and the
/// source of transaction ids. Everything else borrows from here.
pub struct Database {
    config: Config,
    catalog: Arc<Catalog>,
    buffer_pool: BufferPool,
    next_txn_id: AtomicU64,
    logger: Logger,
}

impl Database {
    pub fn new(config: Config, logger: &Logger) -> Result<Self> {
        if config.page_size == 0 || config.buffer_pool_pages == 0 {
            bail!(
                "page size and buffer pool size must be positive, got {} and {}",
                config.page_size,
                config.buffer_pool_pages
            );
        }
        let catalog = Arc::new(Catalog::new(logger));
        let buffer_pool = BufferPool::new(&config, catalog.clone(), logger);
        info!(logger, "database ready"; "page_size" => config.page_size, "pool_pages" => config.buffer_pool_pages);

        Ok(Self {
            config,
            catalog,
            buffer_pool,
            next_txn_id: AtomicU64::new(1),
            logger: logger.clone(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &BufferPool {
        &self.buffer_pool
    }

    /// Opens (creating if needed) a heap file with the configured page size
    /// and registers it under `name`.
    pub fn create_table<P: AsRef<Path>>(
        &self,
        path: P,
        desc: TupleDesc,
        name: &str,
        primary_key: &str,
    ) -> Result<Arc<HeapFile>> {
        let file = HeapFile::open(path, Arc::new(desc), self.config.page_size, &self.logger)?;
        Ok(self.catalog.add_table(file, name, primary_key))
    }

    pub fn next_transaction_id(&self) -> TransactionId {
        TransactionId::new(self.next_txn_id.fetch_add(1, Ordering::SeqCst))
    }

    pub fn begin(&self) -> Transaction<'_> {
        Transaction::new(self.next_transaction_id(), &self.buffer_pool, &self.logger)
    }

    /// Opened scan over `table_id` on behalf of `tid`.
    pub fn scan(&self, tid: TransactionId, table_id: TableId) -> Result<HeapFileIterator<'_>> {
        let file = self.catalog.database_file(table_id)?;
        let mut iter = file.iterator(&self.buffer_pool, tid);
        iter.open();
        Ok(iter)
    }
}
