// src/volume/mod.rs

pub mod directory;
pub mod header;
pub mod map;

pub use directory::{Directory, DirectoryEntry, DirectoryRecord};
pub use header::VolumeHeader;
pub use map::{BlockMap, FileBlockChain};
