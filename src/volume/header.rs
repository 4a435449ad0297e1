use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::error::{QubError, Result};
use crate::layout::{HEADER_SIZE, SECTOR_SIZE};

/// Volume geometry from the first sector of the image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeHeader {
    pub id: u32,
    pub medium_name: [u8; 10],
    pub random_number: u16,
    pub update_count: u32,
    pub free_blocks: u16,
    pub good_blocks: u16,
    pub total_blocks: u16,
    pub sectors_per_track: u16,
    pub sectors_per_cylinder: u16,
    pub track_count: u16,
    pub sectors_per_block: u16,
    pub fat_size: u16,
    pub fat_type: u8,
    pub head_count: u8,
    pub partition_count: u8,
    pub partition1_map_blocks: u16,
    pub partition1_start_track: u16,
}

impl VolumeHeader {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(QubError::MalformedHeader { len: bytes.len() });
        }
        let mut cursor = Cursor::new(&bytes[..HEADER_SIZE]);
        let mut header = VolumeHeader {
            id: cursor.read_u32::<BigEndian>()?,
            ..Default::default()
        };
        cursor.read_exact(&mut header.medium_name)?;
        header.random_number = cursor.read_u16::<BigEndian>()?;
        header.update_count = cursor.read_u32::<BigEndian>()?;
        header.free_blocks = cursor.read_u16::<BigEndian>()?;
        header.good_blocks = cursor.read_u16::<BigEndian>()?;
        header.total_blocks = cursor.read_u16::<BigEndian>()?;
        header.sectors_per_track = cursor.read_u16::<BigEndian>()?;
        header.sectors_per_cylinder = cursor.read_u16::<BigEndian>()?;
        header.track_count = cursor.read_u16::<BigEndian>()?;
        header.sectors_per_block = cursor.read_u16::<BigEndian>()?;
        header.fat_size = cursor.read_u16::<BigEndian>()?;
        cursor.set_position(38);
        header.fat_type = cursor.read_u8()?;
        cursor.set_position(42);
        header.head_count = cursor.read_u8()?;
        header.partition_count = cursor.read_u8()?;
        cursor.set_position(48);
        header.partition1_map_blocks = cursor.read_u16::<BigEndian>()?;
        header.partition1_start_track = cursor.read_u16::<BigEndian>()?;
        Ok(header)
    }

    /// Serialise back to the 52-byte on-disk form, spare bytes zeroed.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        BigEndian::write_u32(&mut out[0..], self.id);
        out[4..14].copy_from_slice(&self.medium_name);
        BigEndian::write_u16(&mut out[14..], self.random_number);
        BigEndian::write_u32(&mut out[16..], self.update_count);
        BigEndian::write_u16(&mut out[20..], self.free_blocks);
        BigEndian::write_u16(&mut out[22..], self.good_blocks);
        BigEndian::write_u16(&mut out[24..], self.total_blocks);
        BigEndian::write_u16(&mut out[26..], self.sectors_per_track);
        BigEndian::write_u16(&mut out[28..], self.sectors_per_cylinder);
        BigEndian::write_u16(&mut out[30..], self.track_count);
        BigEndian::write_u16(&mut out[32..], self.sectors_per_block);
        BigEndian::write_u16(&mut out[34..], self.fat_size);
        out[38] = self.fat_type;
        out[42] = self.head_count;
        out[43] = self.partition_count;
        BigEndian::write_u16(&mut out[48..], self.partition1_map_blocks);
        BigEndian::write_u16(&mut out[50..], self.partition1_start_track);
        out
    }

    pub fn block_size(&self) -> usize {
        self.sectors_per_block as usize * SECTOR_SIZE
    }

    /// Length in bytes of the block map at the start of the image.
    pub fn map_size(&self) -> usize {
        self.block_size() * self.partition1_map_blocks as usize
    }

    /// Raw medium name up to the first NUL, at most 10 bytes.
    pub fn medium_name_bytes(&self) -> &[u8] {
        let end = self
            .medium_name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.medium_name.len());
        &self.medium_name[..end]
    }

    pub fn medium_name(&self) -> String {
        String::from_utf8_lossy(self.medium_name_bytes()).into_owned()
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_blocks == 0 {
            return Err(QubError::InvalidGeometry("total block count is zero".into()));
        }
        if self.sectors_per_block == 0 {
            return Err(QubError::InvalidGeometry("sectors per block is zero".into()));
        }
        if self.partition1_map_blocks == 0 {
            return Err(QubError::InvalidGeometry("partition 1 has no map blocks".into()));
        }
        Ok(())
    }
}
