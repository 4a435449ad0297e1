// src/layout.rs

/// Bytes per physical sector.
pub const SECTOR_SIZE: usize = 512;

/// Size of the volume header at image offset 0.
pub const HEADER_SIZE: usize = 52;

/// Size of one directory record, and of the self-record leading every file.
pub const DIR_ENTRY_SIZE: usize = 0x40;

/// Offset of the first (owner, position) pair in the block map.
pub const MAP_ENTRY_BASE: usize = 0x100;

/// Bytes per block map entry: u16 owner followed by u16 chain position.
pub const MAP_ENTRY_SIZE: usize = 4;

/// Seconds between the volume epoch (1961-01-01) and the Unix epoch.
pub const TIME_DIFF: i64 = 283_996_800;

/// File number of the root directory.
pub const ROOT_FILE_NUMBER: u16 = 0;

/// `file_type` value marking a subdirectory.
pub const FILE_TYPE_DIRECTORY: u8 = 255;
