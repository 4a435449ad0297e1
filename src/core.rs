// src/core.rs
use log::debug;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::date::format_timestamp;
use crate::error::{QubError, Result};
use crate::layout::{DIR_ENTRY_SIZE, HEADER_SIZE, ROOT_FILE_NUMBER};
use crate::source::{BlockSource, ImageSource};
use crate::volume::directory::NAME_FIELD_SIZE;
use crate::volume::{BlockMap, Directory, DirectoryRecord, FileBlockChain, VolumeHeader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    /// Name, type, length, date and version per entry, after a volume summary.
    Long,
    /// Names only.
    Short,
}

/// A mounted volume: the image source plus its decoded header and block map.
pub struct Volume<S: BlockSource> {
    source: S,
    header: VolumeHeader,
    map: BlockMap,
}

impl Volume<ImageSource<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Volume::mount(ImageSource::open(path)?)
    }
}

impl<S: BlockSource> Volume<S> {
    pub fn mount(mut source: S) -> Result<Self> {
        let raw = source.read_at(0, HEADER_SIZE)?;
        let header = VolumeHeader::decode(&raw)?;
        header.validate()?;
        debug!(
            "Mounted {:?}: {} blocks of {} bytes, {} free, {} map blocks",
            header.medium_name(),
            header.total_blocks,
            header.block_size(),
            header.free_blocks,
            header.partition1_map_blocks
        );
        let map = BlockMap::load(&mut source, &header)?;
        Ok(Volume {
            source,
            header,
            map,
        })
    }

    pub fn header(&self) -> &VolumeHeader {
        &self.header
    }

    pub fn map(&self) -> &BlockMap {
        &self.map
    }

    pub fn block_size(&self) -> usize {
        self.header.block_size()
    }

    pub fn resolve_chain(&self, file_number: u16) -> Result<FileBlockChain> {
        self.map.resolve_chain(file_number)
    }

    /// Decode the directory stored as file `file_number`.
    pub fn read_directory(&mut self, file_number: u16) -> Result<Directory> {
        let chain = self.resolve_chain(file_number)?;
        if chain.is_empty() {
            return Err(QubError::DirectoryNotFound { file_number });
        }
        Directory::read(&mut self.source, &chain, self.header.block_size())
    }

    /// Write a listing of directory `file_number` to `out`.
    pub fn list_directory<W: Write + ?Sized>(
        &mut self,
        file_number: u16,
        mode: ListingMode,
        local_offset: i64,
        out: &mut W,
    ) -> Result<()> {
        let directory = self.read_directory(file_number)?;
        if mode == ListingMode::Long {
            out.write_all(self.header.medium_name_bytes())?;
            out.write_all(b"\n")?;
            write!(
                out,
                "{}/{} blocks.\n\n",
                self.header.free_blocks, self.header.total_blocks
            )?;
        }
        for record in directory.records() {
            out.write_all(&render_entry(record, mode, local_offset))?;
        }
        Ok(())
    }

    pub fn list_root<W: Write + ?Sized>(
        &mut self,
        mode: ListingMode,
        local_offset: i64,
        out: &mut W,
    ) -> Result<()> {
        self.list_directory(ROOT_FILE_NUMBER, mode, local_offset, out)
    }

    /// Find `name` in the directory whose chain is `directory`.
    ///
    /// Returns the matched file number and a copy of its record.
    pub fn search(
        &mut self,
        directory: &FileBlockChain,
        name: &[u8],
    ) -> Result<Option<(u16, DirectoryRecord)>> {
        if directory.is_empty() {
            return Err(QubError::DirectoryNotFound {
                file_number: directory.file_number,
            });
        }
        let dir = Directory::read(&mut self.source, directory, self.header.block_size())?;
        Ok(dir
            .find(name)
            .map(|record| (record.file_number, record.clone())))
    }

    /// Write the content of the file in `chain` to `out`.
    ///
    /// The leading 64-byte self-record of block 0 is skipped and exactly
    /// `file_length - 64` bytes are written. Returns the number of bytes written.
    pub fn extract<W: Write + ?Sized>(
        &mut self,
        chain: &FileBlockChain,
        file_length: u32,
        out: &mut W,
    ) -> Result<u64> {
        let block_size = self.header.block_size();
        let needed_blocks = (file_length as usize).div_ceil(block_size);
        if needed_blocks > chain.block_count() {
            return Err(QubError::TruncatedFile {
                file_number: chain.file_number,
                needed_blocks,
                chain_blocks: chain.block_count(),
            });
        }

        let mut remaining = (file_length as usize).saturating_sub(DIR_ENTRY_SIZE);
        let mut written = 0u64;
        for (position, &physical) in chain.blocks.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            let block = self.source.read_block(physical, block_size)?;
            let start = if position == 0 { DIR_ENTRY_SIZE } else { 0 };
            let take = (block_size - start).min(remaining);
            out.write_all(&block[start..start + take])?;
            remaining -= take;
            written += take as u64;
        }
        debug!("Extracted {} bytes from file {}", written, chain.file_number);
        Ok(written)
    }

    pub fn read_file(&mut self, chain: &FileBlockChain, file_length: u32) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity((file_length as usize).saturating_sub(DIR_ENTRY_SIZE));
        self.extract(chain, file_length, &mut data)?;
        Ok(data)
    }

    /// Look `name` up in the root directory and write its content to `out`.
    pub fn dump_file<W: Write + ?Sized>(&mut self, name: &str, out: &mut W) -> Result<u64> {
        let root = self.resolve_chain(ROOT_FILE_NUMBER)?;
        let (file_number, record) = self.search(&root, name.as_bytes())?.ok_or_else(|| {
            QubError::FileNotFound {
                name: name.to_string(),
            }
        })?;
        let chain = self.resolve_chain(file_number)?;
        if chain.is_empty() {
            return Err(QubError::EmptyChain { file_number });
        }
        self.extract(&chain, record.file_length, out)
    }

    pub fn device_info(&self) -> String {
        let h = &self.header;
        let mut output = Vec::new();
        output.push(format!("Medium Name {}", h.medium_name()));
        output.push(format!("Rand Number {:x}", h.random_number));
        output.push(format!("Number Updates {:x}", h.update_count));
        output.push(format!("Free Blocks {:x}", h.free_blocks));
        output.push(format!("Good Blocks {:x}", h.good_blocks));
        output.push(format!("Total Blocks {:x}", h.total_blocks));
        output.push("----------------".to_string());
        output.push(format!("Sectors Per Track {:x}", h.sectors_per_track));
        output.push(format!("Sectors Per Cylinder {:x}", h.sectors_per_cylinder));
        output.push(format!("Number of Tracks {:x}", h.track_count));
        output.push(format!("Sectors Per Block {:x}", h.sectors_per_block));
        output.push(format!("Fat Size {:x}", h.fat_size));
        output.push(format!("Fat Type {:x}", h.fat_type));
        output.push("----------------".to_string());
        output.push(format!("Number of Heads {:x}", h.head_count));
        output.push(format!("Number of Partitions {:x}", h.partition_count));
        output.push("----------------".to_string());
        output.push(format!(
            "Part1: Number of Mapping blocks {:x}",
            h.partition1_map_blocks
        ));
        output.push(format!(
            "Part1: Start Track of Partition {:x}",
            h.partition1_start_track
        ));
        output.join("\n")
    }
}

/// One listing line for `record`, newline included. End markers render as nothing.
///
/// The name is copied byte for byte; long mode pads it to the 36-byte name field.
pub fn render_entry(record: &DirectoryRecord, mode: ListingMode, local_offset: i64) -> Vec<u8> {
    if record.is_end_marker() {
        return Vec::new();
    }
    let mut line = record.display_name_bytes().to_vec();
    if mode == ListingMode::Long && line.len() < NAME_FIELD_SIZE {
        line.resize(NAME_FIELD_SIZE, b' ');
    }

    let mut tail = String::new();
    if record.is_directory() {
        if mode == ListingMode::Long {
            tail.push_str(&format!("(dir) {}", record.content_length()));
        }
    } else if mode == ListingMode::Long {
        match record.file_type {
            0 => tail.push(' '),
            1 => tail.push('E'),
            2 => tail.push('r'),
            other => tail.push_str(&format!("{:3}", other)),
        }
        tail.push_str(&format!(
            " {:7} {} v{:<5}",
            record.content_length(),
            format_timestamp(record.update_timestamp, local_offset),
            record.version
        ));
        if record.file_type == 1 && record.reserved_data_space != 0 {
            tail.push_str(&format!(" ({})", record.reserved_data_space));
        }
    }
    tail.push('\n');
    line.extend_from_slice(tail.as_bytes());
    line
}
