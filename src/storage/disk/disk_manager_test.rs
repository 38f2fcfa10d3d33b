use crate::disk_manager::DiskManager;
use crate::errors::{DbError, Result};
use crate::storage::page::PageId;
use crate::default_logger;
use tempfile::tempdir;

const PAGE_SIZE: usize = 256;

#[test]
fn read_write_page_test() -> Result<()> {
    let logger = default_logger();
    let dir = tempdir()?;

    let mut buf = [0u8; PAGE_SIZE];
    let mut data = [0u8; PAGE_SIZE];

    let mut dm = DiskManager::new(dir.path().join("read_write_page.dat"), PAGE_SIZE, &logger)?;
    assert_eq!(dm.num_pages()?, 0);

    let test_data = b"A test string.";
    data[..test_data.len()].copy_from_slice(test_data);

    assert_eq!(dm.allocate_page()?, 0);
    dm.write_page(PageId::new(1, 0), &data)?;
    debug!(logger, "second read");
    dm.read_page(PageId::new(1, 0), &mut buf)?;
    assert_eq!(data.to_vec(), buf.to_vec());

    // writing one past the end grows the file by a page
    buf = [0u8; PAGE_SIZE];
    dm.write_page(PageId::new(1, 1), &data)?;
    dm.read_page(PageId::new(1, 1), &mut buf)?;
    assert_eq!(data.to_vec(), buf.to_vec());
    assert_eq!(dm.num_pages()?, 2);
    assert_eq!(dm.page_size(), PAGE_SIZE);
    assert_eq!(dm.num_writes(), 2);
    assert_eq!(dm.num_reads(), 2);

    Ok(())
}

#[test]
fn read_past_end_fails() -> Result<()> {
    let logger = default_logger();
    let dir = tempdir()?;
    let mut dm = DiskManager::new(dir.path().join("past_end.dat"), PAGE_SIZE, &logger)?;
    dm.allocate_page()?;

    let mut buf = [0u8; PAGE_SIZE];
    let err = dm.read_page(PageId::new(1, 3), &mut buf).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DbError>(),
        Some(DbError::PageOutOfRange { num_pages: 1, .. })
    ));

    let err = dm.write_page(PageId::new(1, 5), &buf).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DbError>(),
        Some(DbError::PageOutOfRange { .. })
    ));
    Ok(())
}

#[test]
fn allocate_page_appends_zeroed_block() -> Result<()> {
    let logger = default_logger();
    let dir = tempdir()?;
    let path = dir.path().join("allocate.dat");
    let mut dm = DiskManager::new(&path, PAGE_SIZE, &logger)?;

    for expected in 0..3 {
        assert_eq!(dm.allocate_page()?, expected);
    }
    assert_eq!(std::fs::metadata(&path)?.len(), 3 * PAGE_SIZE as u64);

    let mut buf = [0xffu8; PAGE_SIZE];
    dm.read_page(PageId::new(1, 2), &mut buf)?;
    assert!(buf.iter().all(|b| *b == 0));
    assert_eq!(dm.num_reads(), 1);
    Ok(())
}
