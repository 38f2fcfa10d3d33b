use crate::errors::{DbError, Result};
use crate::storage::page::PageId;
use crate::PageNo;
use slog::Logger;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

// DiskManager performs the reading and writing of fixed-size pages to and from one backing file. The file is
// always an exact multiple of the page size; growing it means appending one zero-filled page.
pub struct DiskManager {
    path: PathBuf,
    page_size: usize,
    num_reads: u64,
    num_writes: u64,
    db_file: File,
    logger: Logger,
}

impl DiskManager {
    // Opens the specified file, creating it empty when missing.
    pub fn new<P: AsRef<Path>>(path: P, page_size: usize, logger: &Logger) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;

        let len = db_file.metadata()?.len();
        if len % page_size as u64 != 0 {
            warn!(
                logger,
                "file length is not a multiple of the page size";
                "path" => %path.display(), "len" => len, "page_size" => page_size
            );
        }

        Ok(Self {
            path,
            page_size,
            num_reads: 0,
            num_writes: 0,
            db_file,
            logger: logger.clone(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn num_pages(&self) -> Result<usize> {
        Ok((self.db_file.metadata()?.len() / self.page_size as u64) as usize)
    }

    // Write the contents of the specified page into disk file
    pub fn write_page(&mut self, page_id: PageId, page_data: &[u8]) -> Result<()> {
        if page_data.len() != self.page_size {
            bail!(
                "{} image is {} bytes, page size is {}",
                page_id,
                page_data.len(),
                self.page_size
            );
        }
        let num_pages = self.num_pages()?;
        if page_id.page_no() as usize > num_pages {
            return Err(DbError::PageOutOfRange { page_id, num_pages }.into());
        }

        let offset = self.offset_of(page_id.page_no());
        self.num_writes += 1;
        debug!(self.logger, "write_page"; "page" => %page_id, "num_writes" => self.num_writes);
        self.db_file.seek(SeekFrom::Start(offset))?;
        self.db_file.write_all(page_data)?;
        self.db_file.flush()?;
        Ok(())
    }

    // Read the contents of the specified page into the given memory area
    pub fn read_page(&mut self, page_id: PageId, page_data: &mut [u8]) -> Result<()> {
        let offset = self.offset_of(page_id.page_no());
        let file_len = self.db_file.metadata()?.len();

        debug!(self.logger, "read_page"; "page" => %page_id, "offset" => offset, "file_len" => file_len);

        if offset + self.page_size as u64 > file_len {
            return Err(DbError::PageOutOfRange {
                page_id,
                num_pages: self.num_pages()?,
            }
            .into());
        }

        // set read cursor to offset
        self.db_file.seek(SeekFrom::Start(offset))?;
        let mut n = 0;
        while n < page_data.len() {
            match self.db_file.read(&mut page_data[n..])? {
                0 => break,
                read => n += read,
            }
        }
        self.num_reads += 1;
        if n < self.page_size {
            warn!(
                self.logger,
                "Read less than a page, n: {}, page_size: {}", n, self.page_size
            );
            return Err(DbError::ShortRead {
                page_id,
                read: n,
                expected: self.page_size,
            }
            .into());
        }
        Ok(())
    }

    // Appends one zero-filled page and returns its page number.
    pub fn allocate_page(&mut self) -> Result<PageNo> {
        let page_no = self.num_pages()? as PageNo;
        let offset = self.offset_of(page_no);
        self.db_file.seek(SeekFrom::Start(offset))?;
        self.db_file.write_all(&vec![0u8; self.page_size])?;
        self.db_file.flush()?;
        debug!(self.logger, "allocate_page"; "path" => %self.path.display(), "page_no" => page_no);
        Ok(page_no)
    }

    pub fn num_reads(&self) -> u64 {
        self.num_reads
    }

    pub fn num_writes(&self) -> u64 {
        self.num_writes
    }

    fn offset_of(&self, page_no: PageNo) -> u64 {
        page_no as u64 * self.page_size as u64
    }
}
