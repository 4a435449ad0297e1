use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{QubError, Result};

/// Positioned reads over a volume image.
pub trait BlockSource {
    /// Read exactly `len` bytes starting at absolute `offset`.
    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>>;

    fn read_block(&mut self, block: u32, block_size: usize) -> Result<Vec<u8>> {
        self.read_at(block as u64 * block_size as u64, block_size)
    }
}

/// A [`BlockSource`] over anything seekable: an image file or an in-memory cursor.
pub struct ImageSource<R: Read + Seek> {
    reader: R,
}

impl<R: Read + Seek> ImageSource<R> {
    pub fn new(reader: R) -> Self {
        ImageSource { reader }
    }
}

impl ImageSource<File> {
    /// Open an image file read-only.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(ImageSource::new(File::open(path)?))
    }
}

impl<R: Read + Seek> BlockSource for ImageSource<R> {
    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(offset))?;
        // `len` may come from a corrupt header; grow only with bytes actually read.
        let mut buf = Vec::new();
        (&mut self.reader).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(QubError::ShortRead {
                offset,
                requested: len,
                actual: buf.len(),
            });
        }
        Ok(buf)
    }
}
