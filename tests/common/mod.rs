//! Synthetic volume images for the integration tests.

#![allow(dead_code)]

use qubide::layout::{DIR_ENTRY_SIZE, MAP_ENTRY_BASE, MAP_ENTRY_SIZE, TIME_DIFF};
use qubide::volume::{DirectoryRecord, VolumeHeader};

pub const BLOCK_SIZE: usize = 512;

/// One day after the Unix epoch, in volume seconds.
pub const DAY_ONE: u32 = TIME_DIFF as u32 + 86_400;

pub struct ImageBuilder {
    pub header: VolumeHeader,
    data: Vec<u8>,
}

impl ImageBuilder {
    /// A volume of `total_blocks` 512-byte blocks with a one-block map. Every
    /// block starts out owned by file 0xffff.
    pub fn new(total_blocks: u16) -> Self {
        let mut medium_name = [b' '; 10];
        medium_name[..6].copy_from_slice(b"QLDISK");
        let header = VolumeHeader {
            id: u32::from_be_bytes(*b"QLWA"),
            medium_name,
            free_blocks: 2,
            good_blocks: total_blocks,
            total_blocks,
            sectors_per_track: 16,
            sectors_per_cylinder: 32,
            track_count: 10,
            sectors_per_block: 1,
            partition_count: 1,
            partition1_map_blocks: 1,
            ..Default::default()
        };
        let mut builder = ImageBuilder {
            header,
            data: vec![0u8; BLOCK_SIZE * total_blocks as usize],
        };
        for block in 0..total_blocks as u32 {
            builder.own(block, 0xffff, 0);
        }
        builder
    }

    pub fn own(&mut self, block: u32, file_number: u16, position: u16) -> &mut Self {
        let at = MAP_ENTRY_BASE + block as usize * MAP_ENTRY_SIZE;
        self.data[at..at + 2].copy_from_slice(&file_number.to_be_bytes());
        self.data[at + 2..at + 4].copy_from_slice(&position.to_be_bytes());
        self
    }

    pub fn write(&mut self, block: u32, offset: usize, bytes: &[u8]) -> &mut Self {
        let at = block as usize * BLOCK_SIZE + offset;
        self.data[at..at + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn record(&mut self, block: u32, slot: usize, record: &DirectoryRecord) -> &mut Self {
        self.write(block, slot * DIR_ENTRY_SIZE, &record.encode())
    }

    pub fn build(&self) -> Vec<u8> {
        let mut image = self.data.clone();
        image[..qubide::layout::HEADER_SIZE].copy_from_slice(&self.header.encode());
        image
    }
}

pub fn record(name: &str, file_type: u8, file_length: u32, file_number: u16) -> DirectoryRecord {
    let mut r = DirectoryRecord {
        file_length,
        file_type,
        name_length: name.len() as u16,
        update_timestamp: DAY_ONE,
        version: 2,
        file_number,
        ..Default::default()
    };
    r.name[..name.len()].copy_from_slice(name.as_bytes());
    r
}

/// Self-record declaring `length` bytes of content, header included.
pub fn self_record(length: u32) -> DirectoryRecord {
    record("", 255, length, 0)
}

pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(7).wrapping_add(seed)).collect()
}

/// Root directory (file 0) in block 1 with a single data file `TEST` (file 5)
/// of 100 content bytes in block 3.
pub fn single_file_volume() -> ImageBuilder {
    let mut b = ImageBuilder::new(8);
    b.own(1, 0, 0)
        .record(1, 0, &self_record(128))
        .record(1, 1, &record("TEST", 0, 164, 5))
        .own(3, 5, 0)
        .record(3, 0, &record("TEST", 0, 164, 5))
        .write(3, DIR_ENTRY_SIZE, &pattern(100, 1));
    b
}
