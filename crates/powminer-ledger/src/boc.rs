//! Bag-of-cells serialization
//!
//! Single-root, no index, no cache bits, CRC32-C trailer.

use std::collections::HashSet;

use crate::cell::Cell;
use crate::checksum::crc32c;

const BOC_MAGIC: [u8; 4] = [0xb5, 0xee, 0x9c, 0x72];
const FLAG_CRC32C: u8 = 0x40;

/// Smallest byte width able to hold `value` (at least 1)
fn width_for(value: usize) -> usize {
    let mut width = 1;
    while width < 8 && (value as u64) >> (width * 8) != 0 {
        width += 1;
    }
    width
}

fn push_uint(out: &mut Vec<u8>, value: usize, width: usize) {
    let bytes = (value as u64).to_be_bytes();
    out.extend_from_slice(&bytes[8 - width..]);
}

/// Cells in topological order (parents before children), de-duplicated by hash.
fn order_cells(root: &Cell) -> Vec<(&Cell, [u8; 32])> {
    fn visit<'a>(
        cell: &'a Cell,
        seen: &mut HashSet<[u8; 32]>,
        post: &mut Vec<(&'a Cell, [u8; 32])>,
    ) {
        let hash = cell.hash();
        if !seen.insert(hash) {
            return;
        }
        for r in cell.references() {
            visit(r, seen, post);
        }
        post.push((cell, hash));
    }

    let mut seen = HashSet::new();
    let mut post = Vec::new();
    visit(root, &mut seen, &mut post);
    post.reverse();
    post
}

/// Serialize a cell tree with `root` at index 0.
///
/// Output is deterministic for identical trees.
pub fn serialize_boc(root: &Cell) -> Vec<u8> {
    let cells = order_cells(root);
    let index_of = |hash: &[u8; 32]| {
        cells
            .iter()
            .position(|(_, h)| h == hash)
            .unwrap_or_default()
    };

    let size_bytes = width_for(cells.len());

    let mut body = Vec::new();
    for (cell, _) in &cells {
        body.extend_from_slice(&cell.descriptors());
        body.extend_from_slice(&cell.augmented_data());
        for r in cell.references() {
            push_uint(&mut body, index_of(&r.hash()), size_bytes);
        }
    }

    let off_bytes = width_for(body.len());

    let mut out = Vec::with_capacity(body.len() + 32);
    out.extend_from_slice(&BOC_MAGIC);
    out.push(FLAG_CRC32C | size_bytes as u8);
    out.push(off_bytes as u8);
    push_uint(&mut out, cells.len(), size_bytes); // cells
    push_uint(&mut out, 1, size_bytes); // roots
    push_uint(&mut out, 0, size_bytes); // absent
    push_uint(&mut out, body.len(), off_bytes);
    push_uint(&mut out, 0, size_bytes); // root index
    out.extend_from_slice(&body);

    let crc = crc32c(&out);
    out.extend_from_slice(&crc.to_le_bytes());
    out
}
