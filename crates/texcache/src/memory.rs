//! Source memory access and the checksum oracle.
//!
//! Implementors only have to provide [`TextureMemory::read`]; the checksum and
//! color-index scans have reference implementations built on top of it that a
//! host may override with faster or format-specific versions.

use crate::types::{PixelSize, Region};

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

pub trait TextureMemory {
    /// Returns `len` bytes starting at `address`, or `None` if the range is unmapped.
    fn read(&self, address: u32, len: usize) -> Option<&[u8]>;

    /// Content checksum over the rows of `region`. Unmapped rows only contribute
    /// their row number.
    fn checksum(&self, region: &Region) -> u32 {
        let row_bytes = region.row_bytes();
        let mut hash = FNV_OFFSET;
        for y in 0..region.height {
            hash = (hash ^ y).wrapping_mul(FNV_PRIME);
            if let Some(row) = self.read(region.row_address(y), row_bytes) {
                for &byte in row {
                    hash = (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME);
                }
            }
        }
        hash
    }

    /// Largest palette index referenced inside `region`.
    fn max_color_index(&self, region: &Region) -> u8 {
        let ceiling = match region.size {
            PixelSize::Bits4 => 0x0f,
            PixelSize::Bits8 => 0xff,
            _ => return 0xff,
        };
        let row_bytes = region.row_bytes();
        let mut max = 0u8;
        for y in 0..region.height {
            let Some(row) = self.read(region.row_address(y), row_bytes) else {
                continue;
            };
            for &byte in row {
                let value = if region.size == PixelSize::Bits4 {
                    (byte >> 4).max(byte & 0x0f)
                } else {
                    byte
                };
                max = max.max(value);
                if max == ceiling {
                    return max;
                }
            }
        }
        max
    }
}

/// Flat byte image of emulated memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rdram {
    bytes: Vec<u8>,
}

impl Rdram {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Copies `data` to `address`. Returns `false` (writing nothing) when the range is unmapped.
    pub fn write(&mut self, address: u32, data: &[u8]) -> bool {
        let start = address as usize;
        match self.bytes.get_mut(start..start + data.len()) {
            Some(target) => {
                target.copy_from_slice(data);
                true
            }
            None => false,
        }
    }
}

impl TextureMemory for Rdram {
    fn read(&self, address: u32, len: usize) -> Option<&[u8]> {
        let start = address as usize;
        self.bytes.get(start..start.checked_add(len)?)
    }
}
