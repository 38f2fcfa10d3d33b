use crate::catalog::Catalog;
use crate::errors::{DbError, Result};
use crate::test_util::int_desc;
use crate::{default_logger, HeapFile, PAGE_SIZE};
use std::sync::Arc;
use tempfile::TempDir;

fn open_file(dir: &TempDir, name: &str, num_fields: usize) -> Result<HeapFile> {
    HeapFile::open(
        dir.path().join(name),
        Arc::new(int_desc(num_fields)),
        PAGE_SIZE,
        &default_logger(),
    )
}

#[test]
fn tables_are_found_by_id_and_name() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let catalog = Catalog::new(&default_logger());

    let users = catalog.add_table(open_file(&dir, "users.dat", 2)?, "users", "id");
    let orders = catalog.add_table(open_file(&dir, "orders.dat", 3)?, "orders", "");
    assert_ne!(users.id(), orders.id());

    assert_eq!(catalog.table_id("users")?, users.id());
    assert_eq!(catalog.table_name(orders.id())?, "orders");
    assert_eq!(catalog.primary_key(users.id())?, "id");
    assert_eq!(catalog.tuple_desc(orders.id())?.num_fields(), 3);
    assert!(Arc::ptr_eq(&catalog.database_file(users.id())?, &users));

    let mut ids = vec![users.id(), orders.id()];
    ids.sort_unstable();
    assert_eq!(catalog.table_ids(), ids);
    Ok(())
}

#[test]
fn adding_a_name_again_replaces_the_table() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let catalog = Catalog::new(&default_logger());

    let old = catalog.add_table(open_file(&dir, "a.dat", 2)?, "t", "");
    let new = catalog.add_table(open_file(&dir, "b.dat", 4)?, "t", "");

    assert_eq!(catalog.table_id("t")?, new.id());
    assert_eq!(catalog.table_ids(), vec![new.id()]);
    assert!(catalog.database_file(old.id()).is_err());

    // same file under a new name drops the old name
    let renamed = catalog.add_table(open_file(&dir, "b.dat", 4)?, "u", "");
    assert_eq!(renamed.id(), new.id());
    assert!(catalog.table_id("t").is_err());
    assert_eq!(catalog.table_name(new.id())?, "u");
    Ok(())
}

#[test]
fn missing_tables_are_errors() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let catalog = Catalog::new(&default_logger());
    let file = catalog.add_table(open_file(&dir, "a.dat", 2)?, "t", "");

    let err = catalog.table_id("nope").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DbError>(),
        Some(DbError::NoSuchTableName(name)) if name == "nope"
    ));
    let missing = file.id().wrapping_add(1);
    let err = catalog.tuple_desc(missing).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DbError>(),
        Some(DbError::NoSuchTable(id)) if *id == missing
    ));

    catalog.clear();
    assert!(catalog.table_ids().is_empty());
    assert!(catalog.database_file(file.id()).is_err());
    Ok(())
}
