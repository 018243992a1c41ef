//! Ordinary cells and a bit-level builder

use std::sync::Arc;

use sha2::{Digest, Sha256};
use thiserror::Error;

pub const MAX_CELL_BITS: usize = 1023;
pub const MAX_CELL_REFS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    #[error("cell overflow: {requested} bits requested, {available} available")]
    BitOverflow { requested: usize, available: usize },
    #[error("cell already holds 4 references")]
    RefOverflow,
    #[error("cannot store {0} bits from a u64")]
    InvalidWidth(usize),
}

/// An immutable ordinary cell: up to 1023 data bits and 4 child references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<Arc<Cell>>,
}

impl Cell {
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Raw data bytes; bits past `bit_len` in the last byte are zero.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn references(&self) -> &[Arc<Cell>] {
        &self.references
    }

    /// The two descriptor bytes `d1` (reference count) and `d2` (data length).
    pub fn descriptors(&self) -> [u8; 2] {
        let d1 = self.references.len() as u8;
        let d2 = (self.bit_len / 8 + self.bit_len.div_ceil(8)) as u8;
        [d1, d2]
    }

    /// Data bytes with the completion tag appended when the last byte is partial.
    pub fn augmented_data(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        let rem = self.bit_len % 8;
        if rem != 0 {
            if let Some(last) = out.last_mut() {
                *last |= 0x80 >> rem;
            }
        }
        out
    }

    pub fn depth(&self) -> u16 {
        self.references
            .iter()
            .map(|r| r.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Representation hash
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.descriptors());
        hasher.update(self.augmented_data());
        for r in &self.references {
            hasher.update(r.depth().to_be_bytes());
        }
        for r in &self.references {
            hasher.update(r.hash());
        }
        hasher.finalize().into()
    }
}

/// Incremental cell builder
#[derive(Debug, Clone, Default)]
pub struct CellBuilder {
    data: Vec<u8>,
    bit_len: usize,
    references: Vec<Arc<Cell>>,
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bits_left(&self) -> usize {
        MAX_CELL_BITS - self.bit_len
    }

    fn reserve(&self, bits: usize) -> Result<(), CellError> {
        if bits > self.bits_left() {
            return Err(CellError::BitOverflow {
                requested: bits,
                available: self.bits_left(),
            });
        }
        Ok(())
    }

    fn push_bit(&mut self, bit: bool) {
        if self.bit_len % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            let idx = self.bit_len / 8;
            self.data[idx] |= 0x80 >> (self.bit_len % 8);
        }
        self.bit_len += 1;
    }

    /// Store the low `width` bits of `value`, most significant first.
    pub fn store_bits(&mut self, value: u64, width: usize) -> Result<&mut Self, CellError> {
        if width > 64 {
            return Err(CellError::InvalidWidth(width));
        }
        self.reserve(width)?;
        for i in (0..width).rev() {
            self.push_bit((value >> i) & 1 == 1);
        }
        Ok(self)
    }

    /// Two's complement signed byte
    pub fn store_i8(&mut self, value: i8) -> Result<&mut Self, CellError> {
        self.store_bits(value as u8 as u64, 8)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, CellError> {
        self.reserve(bytes.len() * 8)?;
        if self.bit_len % 8 == 0 {
            self.data.extend_from_slice(bytes);
            self.bit_len += bytes.len() * 8;
        } else {
            for &byte in bytes {
                for i in (0..8).rev() {
                    self.push_bit((byte >> i) & 1 == 1);
                }
            }
        }
        Ok(self)
    }

    pub fn store_reference(&mut self, cell: Arc<Cell>) -> Result<&mut Self, CellError> {
        if self.references.len() >= MAX_CELL_REFS {
            return Err(CellError::RefOverflow);
        }
        self.references.push(cell);
        Ok(self)
    }

    pub fn build(&self) -> Cell {
        Cell {
            data: self.data.clone(),
            bit_len: self.bit_len,
            references: self.references.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unaligned_bits() {
        let mut b = CellBuilder::new();
        b.store_bits(0x44, 7).unwrap().store_i8(-1).unwrap();
        let cell = b.build();
        assert_eq!(cell.bit_len(), 15);
        // 1000100 11111111 -> 10001001 1111111(0)
        assert_eq!(cell.data(), &[0x89, 0xFE]);
        assert_eq!(cell.augmented_data(), vec![0x89, 0xFF]);
        assert_eq!(cell.descriptors(), [0, 3]);
    }

    #[test]
    fn test_aligned_bytes() {
        let mut b = CellBuilder::new();
        b.store_bytes(&[0xAB; 121]).unwrap();
        let cell = b.build();
        assert_eq!(cell.bit_len(), 968);
        assert_eq!(cell.descriptors(), [0x00, 0xF2]);
        assert_eq!(cell.augmented_data(), vec![0xAB; 121]);
    }

    #[test]
    fn test_overflow() {
        let mut b = CellBuilder::new();
        b.store_bytes(&[0u8; 127]).unwrap();
        b.store_bits(0, 7).unwrap();
        assert_eq!(
            b.store_bits(0, 1).unwrap_err(),
            CellError::BitOverflow {
                requested: 1,
                available: 0
            }
        );
        assert_eq!(b.store_bits(0, 65).unwrap_err(), CellError::InvalidWidth(65));
    }

    #[test]
    fn test_reference_limit_and_depth() {
        let leaf = Arc::new(CellBuilder::new().build());
        let mut b = CellBuilder::new();
        for _ in 0..MAX_CELL_REFS {
            b.store_reference(leaf.clone()).unwrap();
        }
        assert_eq!(b.store_reference(leaf.clone()).unwrap_err(), CellError::RefOverflow);

        let mid = Arc::new(b.build());
        let mut top = CellBuilder::new();
        top.store_reference(mid).unwrap();
        assert_eq!(top.build().depth(), 2);
        assert_eq!(leaf.depth(), 0);
    }

    #[test]
    fn test_empty_cell_hash() {
        let cell = CellBuilder::new().build();
        assert_eq!(
            hex::encode(cell.hash()),
            "96a296d224f285c67bee93c30f8a309157f0daa35dc5b87e410b78630a09cfc7"
        );
    }
}
