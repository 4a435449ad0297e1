use byteorder::{BigEndian, ByteOrder};
use log::{debug, warn};

use crate::error::{QubError, Result};
use crate::layout::{MAP_ENTRY_BASE, MAP_ENTRY_SIZE};
use crate::source::BlockSource;
use crate::volume::VolumeHeader;

/// The block ownership map: one (owner file, chain position) pair per physical block.
///
/// The map is read from image offset 0, so it overlaps the header sector; entries
/// start at `0x100`.
pub struct BlockMap {
    data: Vec<u8>,
    total_blocks: u16,
}

impl BlockMap {
    pub fn load<S: BlockSource + ?Sized>(source: &mut S, header: &VolumeHeader) -> Result<Self> {
        let data = source.read_at(0, header.map_size())?;
        let map = BlockMap::from_bytes(data, header.total_blocks);
        debug!(
            "Loaded block map: {} bytes, {} of {} blocks described",
            map.data.len(),
            map.described_blocks(),
            map.total_blocks
        );
        if map.described_blocks() < map.total_blocks as usize {
            warn!(
                "Block map holds entries for {} blocks but the volume has {}; the rest are treated as unowned",
                map.described_blocks(),
                map.total_blocks
            );
        }
        Ok(map)
    }

    pub fn from_bytes(data: Vec<u8>, total_blocks: u16) -> Self {
        BlockMap { data, total_blocks }
    }

    pub fn total_blocks(&self) -> u16 {
        self.total_blocks
    }

    /// Number of blocks whose entry lies inside the loaded map.
    pub fn described_blocks(&self) -> usize {
        let room = self.data.len().saturating_sub(MAP_ENTRY_BASE) / MAP_ENTRY_SIZE;
        room.min(self.total_blocks as usize)
    }

    fn entry(&self, block: u32) -> Option<&[u8]> {
        if block >= self.total_blocks as u32 {
            return None;
        }
        let start = MAP_ENTRY_BASE + block as usize * MAP_ENTRY_SIZE;
        self.data.get(start..start + MAP_ENTRY_SIZE)
    }

    pub fn owner_of(&self, block: u32) -> Option<u16> {
        self.entry(block).map(|e| BigEndian::read_u16(&e[0..2]))
    }

    pub fn position_of(&self, block: u32) -> Option<u16> {
        self.entry(block).map(|e| BigEndian::read_u16(&e[2..4]))
    }

    /// Collect the physical blocks owned by `file_number`, ordered by chain position.
    ///
    /// Every block in the volume is scanned once. A file owning no blocks yields an
    /// empty chain; a chain with a missing position is a [`QubError::ChainGap`].
    pub fn resolve_chain(&self, file_number: u16) -> Result<FileBlockChain> {
        let mut slots: Vec<Option<u32>> = Vec::new();
        for block in 0..self.described_blocks() as u32 {
            let (Some(owner), Some(position)) = (self.owner_of(block), self.position_of(block))
            else {
                break;
            };
            if owner != file_number {
                continue;
            }
            let position = position as usize;
            if slots.len() <= position {
                slots.resize(position + 1, None);
            }
            slots[position] = Some(block);
        }

        let blocks = slots
            .iter()
            .enumerate()
            .map(|(position, slot)| {
                slot.ok_or(QubError::ChainGap {
                    file_number,
                    position: position as u16,
                })
            })
            .collect::<Result<Vec<u32>>>()?;
        debug!("File {} resolved to blocks {:?}", file_number, blocks);
        Ok(FileBlockChain {
            file_number,
            blocks,
        })
    }
}

/// Physical blocks of one file in logical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlockChain {
    pub file_number: u16,
    pub blocks: Vec<u32>,
}

impl FileBlockChain {
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, position: usize) -> Option<u32> {
        self.blocks.get(position).copied()
    }
}
