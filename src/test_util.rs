use crate::errors::Result;
use crate::{default_logger, Config, Database, Field, HeapFile, Tuple, TupleDesc, Type};
use std::sync::Arc;
use tempfile::TempDir;

/// Page size giving 7 slots for two-int tuples, so tests cross page
/// boundaries quickly.
pub const SMALL_PAGE_SIZE: usize = 64;

pub fn int_desc(num_fields: usize) -> TupleDesc {
    let types = vec![Type::Int; num_fields];
    TupleDesc::with_types(&types)
}

pub fn int_tuple(desc: &Arc<TupleDesc>, values: &[i32]) -> Tuple {
    let fields = values.iter().map(|v| Field::Int(*v)).collect();
    Tuple::new(desc.clone(), fields).expect("values match the schema")
}

pub fn open_db(config: Config) -> Result<(TempDir, Database)> {
    let dir = tempfile::tempdir()?;
    let db = Database::new(config, &default_logger())?;
    Ok((dir, db))
}

/// Registers table `name` backed by a file of `empty_pages` empty pages.
pub fn create_table(
    db: &Database,
    dir: &TempDir,
    name: &str,
    desc: TupleDesc,
    empty_pages: usize,
) -> Result<Arc<HeapFile>> {
    let file = db.create_table(dir.path().join(format!("{}.dat", name)), desc, name, "")?;
    for _ in 0..empty_pages {
        file.allocate_page()?;
    }
    Ok(file)
}

/// All values of field 0 visible to a fresh transaction, which is then
/// committed.
pub fn committed_values(db: &Database, file: &Arc<HeapFile>) -> Result<Vec<i32>> {
    let txn = db.begin();
    let mut values = Vec::new();
    for tuple in db.scan(txn.id(), file.id())? {
        if let Some(Field::Int(v)) = tuple?.field(0) {
            values.push(*v);
        }
    }
    txn.commit()?;
    values.sort_unstable();
    Ok(values)
}
