//! Simulated ECU address space
//!
//! A flat, fixed-size byte array with a deterministic power-on image.
//! All access is bounds-checked over the whole requested range.

use thiserror::Error;

/// Size of the simulated address space (1 MiB)
pub const MEMORY_SIZE: usize = 0x10_0000;

/// Non-zero bytes of the power-on image: (address, value)
pub const INITIAL_FILL: &[(usize, u8)] = &[
    (0x00_1000, 0xAA),
    (0x00_1001, 0xBB),
    (0x00_1002, 0xCC),
    // Configuration bytes
    (0x00_2000, 0x01),
    (0x00_2001, 0x02),
    // High-address test pattern
    (0x01_0000, 0xAA),
    (0x0F_FFFF, 0xBB),
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Range 0x{address:06X}+{length} exceeds memory size 0x{size:06X}")]
    OutOfRange {
        address: usize,
        length: usize,
        size: usize,
    },
}

pub type MemoryResult<T> = Result<T, MemoryError>;

/// Simulated ECU memory
pub struct MemoryStore {
    bytes: Box<[u8]>,
}

impl MemoryStore {
    /// Create a store holding the power-on image
    pub fn new() -> Self {
        let mut store = Self {
            bytes: vec![0u8; MEMORY_SIZE].into_boxed_slice(),
        };
        store.apply_initial_fill();
        store
    }

    /// Size of the address space in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Read `length` bytes starting at `address`
    pub fn read(&self, address: usize, length: usize) -> MemoryResult<&[u8]> {
        let end = self.checked_end(address, length)?;
        Ok(&self.bytes[address..end])
    }

    /// Write `data` starting at `address`. Nothing is written on failure.
    pub fn write(&mut self, address: usize, data: &[u8]) -> MemoryResult<()> {
        let end = self.checked_end(address, data.len())?;
        self.bytes[address..end].copy_from_slice(data);
        Ok(())
    }

    /// Restore the power-on image
    pub fn reset(&mut self) {
        self.bytes.fill(0);
        self.apply_initial_fill();
    }

    fn apply_initial_fill(&mut self) {
        for &(address, value) in INITIAL_FILL {
            self.bytes[address] = value;
        }
    }

    fn checked_end(&self, address: usize, length: usize) -> MemoryResult<usize> {
        let size = self.bytes.len();
        match address.checked_add(length) {
            Some(end) if address < size && end <= size => Ok(end),
            _ => Err(MemoryError::OutOfRange {
                address,
                length,
                size,
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
