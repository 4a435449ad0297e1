use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use log::debug;
use std::io::{Cursor, Read};

use crate::error::{QubError, Result};
use crate::layout::{DIR_ENTRY_SIZE, FILE_TYPE_DIRECTORY};
use crate::source::BlockSource;
use crate::volume::FileBlockChain;

pub const NAME_FIELD_SIZE: usize = 36;

/// One 64-byte directory record.
///
/// `file_length` includes the 64-byte self-record that leads every file's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    pub file_length: u32,
    pub file_mode: u8,
    pub file_type: u8,
    pub reserved_data_space: u32,
    pub spare: [u8; 4],
    pub name_length: u16,
    pub name: [u8; NAME_FIELD_SIZE],
    pub update_timestamp: u32,
    pub version: u16,
    pub file_number: u16,
    pub backup_timestamp: u32,
}

impl Default for DirectoryRecord {
    fn default() -> Self {
        DirectoryRecord {
            file_length: 0,
            file_mode: 0,
            file_type: 0,
            reserved_data_space: 0,
            spare: [0; 4],
            name_length: 0,
            name: [0; NAME_FIELD_SIZE],
            update_timestamp: 0,
            version: 0,
            file_number: 0,
            backup_timestamp: 0,
        }
    }
}

/// A decoded record slot: either a live record or the empty/end marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryEntry {
    Record(DirectoryRecord),
    EndMarker,
}

impl DirectoryRecord {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < DIR_ENTRY_SIZE {
            return Err(QubError::MalformedRecord { len: bytes.len() });
        }
        let mut cursor = Cursor::new(&bytes[..DIR_ENTRY_SIZE]);
        let mut record = DirectoryRecord {
            file_length: cursor.read_u32::<BigEndian>()?,
            file_mode: cursor.read_u8()?,
            file_type: cursor.read_u8()?,
            reserved_data_space: cursor.read_u32::<BigEndian>()?,
            ..Default::default()
        };
        cursor.read_exact(&mut record.spare)?;
        record.name_length = cursor.read_u16::<BigEndian>()?;
        cursor.read_exact(&mut record.name)?;
        record.update_timestamp = cursor.read_u32::<BigEndian>()?;
        record.version = cursor.read_u16::<BigEndian>()?;
        record.file_number = cursor.read_u16::<BigEndian>()?;
        record.backup_timestamp = cursor.read_u32::<BigEndian>()?;
        Ok(record)
    }

    pub fn encode(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut out = [0u8; DIR_ENTRY_SIZE];
        BigEndian::write_u32(&mut out[0..], self.file_length);
        out[4] = self.file_mode;
        out[5] = self.file_type;
        BigEndian::write_u32(&mut out[6..], self.reserved_data_space);
        out[10..14].copy_from_slice(&self.spare);
        BigEndian::write_u16(&mut out[14..], self.name_length);
        out[16..52].copy_from_slice(&self.name);
        BigEndian::write_u32(&mut out[52..], self.update_timestamp);
        BigEndian::write_u16(&mut out[56..], self.version);
        BigEndian::write_u16(&mut out[58..], self.file_number);
        BigEndian::write_u32(&mut out[60..], self.backup_timestamp);
        out
    }

    pub fn is_end_marker(&self) -> bool {
        self.file_length == 0 && self.name_length == 0
    }

    pub fn is_directory(&self) -> bool {
        self.file_type == FILE_TYPE_DIRECTORY
    }

    /// The significant bytes of the name field.
    pub fn name_bytes(&self) -> &[u8] {
        let len = (self.name_length as usize).min(NAME_FIELD_SIZE);
        &self.name[..len]
    }

    /// Name bytes as printed: the significant bytes, cut at any NUL.
    pub fn display_name_bytes(&self) -> &[u8] {
        let bytes = self.name_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        &bytes[..end]
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.name_bytes()).into_owned()
    }

    /// Case-sensitive comparison of the first `name_length` bytes of `name`.
    ///
    /// A query longer than the stored name matches on its prefix; a shorter one
    /// never matches.
    pub fn matches(&self, name: &[u8]) -> bool {
        let stored = self.name_bytes();
        name.get(..stored.len()) == Some(stored)
    }

    /// Bytes of content, excluding the leading self-record.
    pub fn content_length(&self) -> i64 {
        self.file_length as i64 - DIR_ENTRY_SIZE as i64
    }
}

impl DirectoryEntry {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let record = DirectoryRecord::decode(bytes)?;
        if record.is_end_marker() {
            Ok(DirectoryEntry::EndMarker)
        } else {
            Ok(DirectoryEntry::Record(record))
        }
    }
}

/// The decoded contents of one directory.
#[derive(Debug, Clone)]
pub struct Directory {
    /// Record at logical offset 0; its `file_length` bounds the child records.
    pub self_record: DirectoryRecord,
    /// Child slots in on-disk order, end markers included.
    pub entries: Vec<DirectoryEntry>,
}

impl Directory {
    /// Walk a directory's chain as one continuous byte stream.
    ///
    /// Records are read from logical offset 64 up to the self-record's declared
    /// length, fetching a new block whenever the offset crosses a block boundary.
    /// Trailing chain blocks beyond that length are never read.
    pub fn read<S: BlockSource + ?Sized>(
        source: &mut S,
        chain: &FileBlockChain,
        block_size: usize,
    ) -> Result<Self> {
        let first = chain.block(0).ok_or(QubError::DirectoryNotFound {
            file_number: chain.file_number,
        })?;
        let mut block = source.read_block(first, block_size)?;
        let self_record = DirectoryRecord::decode(&block[..DIR_ENTRY_SIZE])?;
        let total_length = self_record.file_length as usize;

        let needed_blocks = total_length.div_ceil(block_size);
        if needed_blocks > chain.block_count() {
            return Err(QubError::TruncatedFile {
                file_number: chain.file_number,
                needed_blocks,
                chain_blocks: chain.block_count(),
            });
        }
        debug!(
            "Directory {}: {} bytes over {} blocks",
            chain.file_number, total_length, needed_blocks
        );

        let mut entries = Vec::new();
        let mut current = 0;
        let mut offset = DIR_ENTRY_SIZE;
        while offset + DIR_ENTRY_SIZE <= total_length {
            let index = offset / block_size;
            if index != current {
                // Bounded by needed_blocks above.
                let physical = chain.blocks[index];
                block = source.read_block(physical, block_size)?;
                current = index;
            }
            let within = offset % block_size;
            entries.push(DirectoryEntry::decode(
                &block[within..within + DIR_ENTRY_SIZE],
            )?);
            offset += DIR_ENTRY_SIZE;
        }

        Ok(Directory {
            self_record,
            entries,
        })
    }

    /// Live child records, end markers skipped.
    pub fn records(&self) -> impl Iterator<Item = &DirectoryRecord> {
        self.entries.iter().filter_map(|entry| match entry {
            DirectoryEntry::Record(record) => Some(record),
            DirectoryEntry::EndMarker => None,
        })
    }

    /// First record whose name equals `name`.
    pub fn find(&self, name: &[u8]) -> Option<&DirectoryRecord> {
        self.records().find(|record| record.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ImageSource;
    use std::io::Cursor;

    fn record(name: &str, file_length: u32, file_number: u16) -> DirectoryRecord {
        let mut r = DirectoryRecord {
            file_length,
            name_length: name.len() as u16,
            file_number,
            ..Default::default()
        };
        r.name[..name.len()].copy_from_slice(name.as_bytes());
        r
    }

    #[test]
    fn decodes_field_offsets() {
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        raw[0..4].copy_from_slice(&164u32.to_be_bytes());
        raw[4] = 3;
        raw[5] = 1;
        raw[6..10].copy_from_slice(&4096u32.to_be_bytes());
        raw[14..16].copy_from_slice(&4u16.to_be_bytes());
        raw[16..20].copy_from_slice(b"TEST");
        raw[52..56].copy_from_slice(&1_000_000u32.to_be_bytes());
        raw[56..58].copy_from_slice(&2u16.to_be_bytes());
        raw[58..60].copy_from_slice(&17u16.to_be_bytes());
        raw[60..64].copy_from_slice(&5u32.to_be_bytes());

        let r = DirectoryRecord::decode(&raw).unwrap();
        assert_eq!(r.file_length, 164);
        assert_eq!(r.file_mode, 3);
        assert_eq!(r.file_type, 1);
        assert_eq!(r.reserved_data_space, 4096);
        assert_eq!(r.name(), "TEST");
        assert_eq!(r.update_timestamp, 1_000_000);
        assert_eq!(r.version, 2);
        assert_eq!(r.file_number, 17);
        assert_eq!(r.backup_timestamp, 5);
        assert_eq!(r.content_length(), 100);
        assert_eq!(r.encode(), raw);
    }

    #[test]
    fn empty_slot_is_end_marker() {
        assert_eq!(
            DirectoryEntry::decode(&[0u8; DIR_ENTRY_SIZE]).unwrap(),
            DirectoryEntry::EndMarker
        );
        let live = record("A", 64, 1);
        assert!(matches!(
            DirectoryEntry::decode(&live.encode()).unwrap(),
            DirectoryEntry::Record(_)
        ));
    }

    #[test]
    fn short_slice_is_malformed() {
        assert!(matches!(
            DirectoryRecord::decode(&[0u8; 10]),
            Err(QubError::MalformedRecord { len: 10 })
        ));
    }

    #[test]
    fn name_match_compares_stored_length_case_sensitively() {
        let r = record("TEST", 164, 1);
        assert!(r.matches(b"TEST"));
        assert!(r.matches(b"TESTX"));
        assert!(!r.matches(b"test"));
        assert!(!r.matches(b"TES"));
        assert!(!r.matches(b"TEXT"));
    }

    #[test]
    fn walk_crosses_blocks_and_stops_at_declared_length() {
        // Directory over blocks 2 and 1 (in that order), 512-byte blocks. The self
        // record declares 9 records of content: 7 in block 2, 2 in block 1.
        let bs = 512;
        let mut image = vec![0u8; bs * 4];
        let declared = (DIR_ENTRY_SIZE * 10) as u32;
        image[2 * bs..2 * bs + DIR_ENTRY_SIZE].copy_from_slice(&record("", declared, 0).encode());
        for i in 1..8 {
            let at = 2 * bs + i * DIR_ENTRY_SIZE;
            image[at..at + DIR_ENTRY_SIZE]
                .copy_from_slice(&record(&format!("F{}", i), 64, i as u16).encode());
        }
        for i in 0..8 {
            let at = bs + i * DIR_ENTRY_SIZE;
            image[at..at + DIR_ENTRY_SIZE]
                .copy_from_slice(&record(&format!("G{}", i), 64, 100 + i as u16).encode());
        }
        // Block 9 is chained past the declared length and lies outside the image.
        let chain = FileBlockChain {
            file_number: 0,
            blocks: vec![2, 1, 9],
        };
        let mut src = ImageSource::new(Cursor::new(image));
        let dir = Directory::read(&mut src, &chain, bs).unwrap();
        let names: Vec<String> = dir.records().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec!["F1", "F2", "F3", "F4", "F5", "F6", "F7", "G0", "G1"]
        );
        assert_eq!(dir.find(b"G1").map(|r| r.file_number), Some(101));
        assert!(dir.find(b"G2").is_none());
    }

    #[test]
    fn declared_length_beyond_chain_is_truncated() {
        let bs = 512;
        let mut image = vec![0u8; bs * 2];
        image[bs..bs + DIR_ENTRY_SIZE].copy_from_slice(&record("", 2000, 0).encode());
        let chain = FileBlockChain {
            file_number: 0,
            blocks: vec![1],
        };
        let mut src = ImageSource::new(Cursor::new(image));
        assert!(matches!(
            Directory::read(&mut src, &chain, bs),
            Err(QubError::TruncatedFile {
                needed_blocks: 4,
                chain_blocks: 1,
                ..
            })
        ));
    }
}
