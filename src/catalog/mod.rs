#[cfg(test)]
mod catalog_test;

use crate::errors::{DbError, Result};
use crate::storage::heap_file::HeapFile;
use crate::storage::tuple::TupleDesc;
use crate::TableId;
use parking_lot::RwLock;
use slog::Logger;
use std::collections::HashMap;
use std::sync::Arc;

struct Table {
    file: Arc<HeapFile>,
    name: String,
    primary_key: String,
}

#[derive(Default)]
struct Tables {
    by_id: HashMap<TableId, Table>,
    by_name: HashMap<String, TableId>,
}

/// Registry of the tables a database knows about, keyed by table id and
/// by name. Constructed explicitly and shared by reference.
pub struct Catalog {
    tables: RwLock<Tables>,
    logger: Logger,
}

impl Catalog {
    pub fn new(logger: &Logger) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            logger: logger.clone(),
        }
    }

    /// Registers `file` as table `name`. An existing table with the same
    /// name or id is replaced.
    pub fn add_table(&self, file: HeapFile, name: &str, primary_key: &str) -> Arc<HeapFile> {
        let file = Arc::new(file);
        let id = file.id();
        let mut tables = self.tables.write();

        if let Some(old_id) = tables.by_name.remove(name) {
            if tables.by_id.remove(&old_id).is_some() && old_id != id {
                info!(self.logger, "table replaced"; "name" => name, "old_id" => old_id, "id" => id);
            }
        }
        if let Some(old) = tables.by_id.remove(&id) {
            let old_path = old.file.path();
            if old_path.canonicalize().ok() != file.path().canonicalize().ok() {
                warn!(
                    self.logger,
                    "table id collision, replacing";
                    "id" => id, "old_name" => %old.name, "old_path" => %old_path.display(), "name" => name
                );
            } else if old.name != name {
                info!(self.logger, "table renamed"; "id" => id, "old_name" => %old.name, "name" => name);
            }
            tables.by_name.remove(&old.name);
        }

        tables.by_name.insert(name.to_string(), id);
        tables.by_id.insert(
            id,
            Table {
                file: file.clone(),
                name: name.to_string(),
                primary_key: primary_key.to_string(),
            },
        );
        info!(self.logger, "table added"; "name" => name, "id" => id);
        file
    }

    pub fn table_id(&self, name: &str) -> Result<TableId> {
        self.tables
            .read()
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| DbError::NoSuchTableName(name.to_string()).into())
    }

    pub fn database_file(&self, table_id: TableId) -> Result<Arc<HeapFile>> {
        self.with_table(table_id, |t| t.file.clone())
    }

    pub fn tuple_desc(&self, table_id: TableId) -> Result<Arc<TupleDesc>> {
        self.with_table(table_id, |t| t.file.tuple_desc().clone())
    }

    pub fn table_name(&self, table_id: TableId) -> Result<String> {
        self.with_table(table_id, |t| t.name.clone())
    }

    pub fn primary_key(&self, table_id: TableId) -> Result<String> {
        self.with_table(table_id, |t| t.primary_key.clone())
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.read().by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn clear(&self) {
        let mut tables = self.tables.write();
        tables.by_id.clear();
        tables.by_name.clear();
    }

    fn with_table<T>(&self, table_id: TableId, f: impl FnOnce(&Table) -> T) -> Result<T> {
        self.tables
            .read()
            .by_id
            .get(&table_id)
            .map(f)
            .ok_or_else(|| DbError::NoSuchTable(table_id).into())
    }
}
