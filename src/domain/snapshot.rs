//! Binary snapshot codec for aggregated tries.
//!
//! Layout (little endian):
//!
//! ```text
//! magic    : 8 bytes "NGTRIE\0\0"
//! version  : u32
//! node     : [score: varint][terminal: u8][own: varint if terminal][child_count: varint]
//!            child_count x ([symbol_len: varint][symbol: UTF-8][node])
//! ```
//!
//! Nodes are emitted in pre-order, children in creation order. Varints are
//! unsigned LEB128. Both directions run on explicit stacks.

use std::io::{self, Read, Write};

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::{NodeData, TrieArena};
use crate::domain::error::{DomainError, TreeResult};
use crate::domain::trie::ScoredTrie;

pub const SNAPSHOT_MAGIC: &[u8; 8] = b"NGTRIE\0\0";
pub const SNAPSHOT_VERSION: u32 = 1;

/// A `char` is at most four UTF-8 bytes.
const MAX_SYMBOL_LEN: u64 = 4;

fn write_varint<W: Write>(w: &mut W, mut v: u64) -> io::Result<()> {
    let mut buf = [0u8; 10];
    let mut i = 0;
    while v >= 0x80 {
        buf[i] = (v as u8 & 0x7F) | 0x80;
        v >>= 7;
        i += 1;
    }
    buf[i] = v as u8;
    i += 1;
    w.write_all(&buf[..i])
}

fn write_node<W: Write>(w: &mut W, data: &NodeData, child_count: usize) -> io::Result<()> {
    write_varint(w, data.score)?;
    match data.own {
        Some(own) => {
            w.write_all(&[1])?;
            write_varint(w, own)?;
        }
        None => w.write_all(&[0])?,
    }
    write_varint(w, child_count as u64)
}

/// Reader that tracks its byte offset for error reporting.
struct SnapshotReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> SnapshotReader<R> {
    fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> TreeResult<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.offset += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(DomainError::corrupt(self.offset, "unexpected end of snapshot"))
            }
            Err(e) => Err(DomainError::SnapshotIo(e)),
        }
    }

    fn read_u8(&mut self) -> TreeResult<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    fn read_u32(&mut self) -> TreeResult<u32> {
        let mut bytes = [0u8; 4];
        self.read_exact(&mut bytes)?;
        Ok(u32::from_le_bytes(bytes))
    }

    fn read_varint(&mut self) -> TreeResult<u64> {
        let start = self.offset;
        let mut shift = 0u32;
        let mut out = 0u64;
        loop {
            let b = self.read_u8()?;
            let chunk = u64::from(b & 0x7F);
            if shift == 63 && chunk > 1 {
                return Err(DomainError::corrupt(start, "varint overflows u64"));
            }
            out |= chunk << shift;
            if b & 0x80 == 0 {
                return Ok(out);
            }
            shift += 7;
            if shift > 63 {
                return Err(DomainError::corrupt(start, "varint too long"));
            }
        }
    }

    fn read_node(&mut self) -> TreeResult<(NodeData, u64)> {
        let score = self.read_varint()?;
        let flag_offset = self.offset;
        let own = match self.read_u8()? {
            0 => None,
            1 => Some(self.read_varint()?),
            other => {
                return Err(DomainError::corrupt(
                    flag_offset,
                    format!("invalid terminal flag {other}"),
                ))
            }
        };
        let child_count = self.read_varint()?;
        Ok((NodeData { own, score }, child_count))
    }

    fn read_symbol(&mut self) -> TreeResult<char> {
        let start = self.offset;
        let len = self.read_varint()?;
        if len == 0 || len > MAX_SYMBOL_LEN {
            return Err(DomainError::corrupt(start, format!("invalid symbol length {len}")));
        }
        let mut bytes = [0u8; MAX_SYMBOL_LEN as usize];
        let bytes = &mut bytes[..len as usize];
        self.read_exact(bytes)?;
        let text = std::str::from_utf8(bytes)
            .map_err(|e| DomainError::corrupt(start, format!("symbol is not UTF-8: {e}")))?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(symbol), None) => Ok(symbol),
            _ => Err(DomainError::corrupt(start, "symbol is not a single character")),
        }
    }

    fn at_end(&mut self) -> TreeResult<bool> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(true),
                Ok(_) => return Ok(false),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(DomainError::SnapshotIo(e)),
            }
        }
    }
}

/// `own + Σ children` computed the same way aggregation does.
fn expected_score(tree: &TrieArena, idx: Index) -> u64 {
    let node = tree.node(idx);
    let children_sum = node
        .children
        .values()
        .map(|&child| tree.node(child).data.score)
        .fold(0u64, u64::saturating_add);
    node.data.own.unwrap_or(0).saturating_add(children_sum)
}

impl ScoredTrie {
    /// Serialize the whole tree into `wtr`.
    #[instrument(level = "debug", skip(self, wtr), fields(nodes = self.tree.len()))]
    pub fn write_to<W: Write>(&self, mut wtr: W) -> TreeResult<()> {
        self.encode(&mut wtr).map_err(DomainError::SnapshotIo)?;
        debug!("snapshot written");
        Ok(())
    }

    fn encode<W: Write>(&self, wtr: &mut W) -> io::Result<()> {
        wtr.write_all(SNAPSHOT_MAGIC)?;
        wtr.write_all(&SNAPSHOT_VERSION.to_le_bytes())?;

        let mut stack: Vec<(Option<char>, Index)> = vec![(None, self.tree.root())];
        let mut utf8 = [0u8; MAX_SYMBOL_LEN as usize];
        while let Some((symbol, idx)) = stack.pop() {
            if let Some(symbol) = symbol {
                let encoded = symbol.encode_utf8(&mut utf8);
                write_varint(wtr, encoded.len() as u64)?;
                wtr.write_all(encoded.as_bytes())?;
            }
            let node = self.tree.node(idx);
            write_node(wtr, &node.data, node.children.len())?;
            for (&child_symbol, &child) in node.children.iter().rev() {
                stack.push((Some(child_symbol), child));
            }
        }
        wtr.flush()
    }

    /// Reconstruct a tree written by [`ScoredTrie::write_to`].
    ///
    /// Rejects foreign files, other format versions, truncated or trailing
    /// data, and trees whose scores are not consistent aggregates.
    #[instrument(level = "debug", skip(rdr))]
    pub fn read_from<R: Read>(rdr: R) -> TreeResult<Self> {
        let mut rdr = SnapshotReader::new(rdr);

        let mut magic = [0u8; 8];
        rdr.read_exact(&mut magic).map_err(|e| match e {
            DomainError::CorruptSnapshot { .. } => DomainError::BadMagic,
            other => other,
        })?;
        if &magic != SNAPSHOT_MAGIC {
            return Err(DomainError::BadMagic);
        }
        let version = rdr.read_u32()?;
        if version != SNAPSHOT_VERSION {
            return Err(DomainError::UnsupportedVersion {
                found: version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut tree = TrieArena::new();
        let root = tree.root();
        let root_offset = rdr.offset;
        let (data, child_count) = rdr.read_node()?;
        if data.own.is_some() {
            return Err(DomainError::corrupt(root_offset, "root cannot be a terminal"));
        }
        tree.node_mut(root).data = data;

        // (node, children still to read, offset of the node record)
        let mut stack: Vec<(Index, u64, u64)> = vec![(root, child_count, root_offset)];
        while let Some(top) = stack.last_mut() {
            if top.1 == 0 {
                let (idx, _, offset) = *top;
                stack.pop();
                if tree.node(idx).data.score != expected_score(&tree, idx) {
                    return Err(DomainError::corrupt(
                        offset,
                        "score does not match own frequency plus children",
                    ));
                }
                continue;
            }
            top.1 -= 1;
            let parent = top.0;

            let symbol_offset = rdr.offset;
            let symbol = rdr.read_symbol()?;
            if tree.child(parent, symbol).is_some() {
                return Err(DomainError::corrupt(
                    symbol_offset,
                    format!("duplicate child symbol {symbol:?}"),
                ));
            }
            let node_offset = rdr.offset;
            let (data, child_count) = rdr.read_node()?;
            let child = tree.insert_child(parent, symbol);
            tree.node_mut(child).data = data;
            stack.push((child, child_count, node_offset));
        }

        if !rdr.at_end()? {
            return Err(DomainError::corrupt(rdr.offset, "trailing bytes after tree"));
        }

        debug!(nodes = tree.len(), "snapshot read");
        Ok(ScoredTrie::from_arena(tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::builder::TrieBuilder;
    use rstest::rstest;

    fn sample() -> ScoredTrie {
        let mut builder = TrieBuilder::new(0);
        for (path, frequency) in [("AB", 150), ("AC", 200), ("A", 0), ("天氣好", 70_000), ("𝄞x", 1)] {
            builder.ingest(path, frequency).unwrap();
        }
        builder.finish().aggregate()
    }

    fn encoded(trie: &ScoredTrie) -> Vec<u8> {
        let mut bytes = Vec::new();
        trie.write_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn given_tree_when_round_tripping_then_trees_are_identical() {
        let trie = sample();
        let restored = ScoredTrie::read_from(encoded(&trie).as_slice()).unwrap();

        assert_eq!(restored, trie);
        assert_eq!(restored.lookup("A").unwrap().own_score(), Some(0));
        assert!(restored.lookup("A").unwrap().is_terminal());
        assert_eq!(restored.root_score(), trie.root_score());
    }

    #[test]
    fn given_empty_tree_when_round_tripping_then_restores_root_only() {
        let trie = TrieBuilder::new(0).finish().aggregate();
        let bytes = encoded(&trie);
        assert_eq!(bytes.len(), 8 + 4 + 3);
        let restored = ScoredTrie::read_from(bytes.as_slice()).unwrap();
        assert_eq!(restored.node_count(), 1);
    }

    #[rstest]
    #[case(0)]
    #[case(127)]
    #[case(128)]
    #[case(300)]
    #[case(u64::MAX)]
    fn given_value_when_encoding_varint_then_reads_back(#[case] value: u64) {
        let mut bytes = Vec::new();
        write_varint(&mut bytes, value).unwrap();
        let mut rdr = SnapshotReader::new(bytes.as_slice());
        assert_eq!(rdr.read_varint().unwrap(), value);
        assert!(rdr.at_end().unwrap());
    }

    #[test]
    fn given_foreign_bytes_when_reading_then_rejects_magic() {
        let result = ScoredTrie::read_from(&b"PK\x03\x04 definitely not a trie"[..]);
        assert!(matches!(result, Err(DomainError::BadMagic)));

        let result = ScoredTrie::read_from(&b"NG"[..]);
        assert!(matches!(result, Err(DomainError::BadMagic)));
    }

    #[test]
    fn given_other_version_when_reading_then_rejects_version() {
        let mut bytes = encoded(&sample());
        bytes[8..12].copy_from_slice(&2u32.to_le_bytes());
        let result = ScoredTrie::read_from(bytes.as_slice());
        assert!(matches!(
            result,
            Err(DomainError::UnsupportedVersion { found: 2, expected: 1 })
        ));
    }

    #[test]
    fn given_truncated_snapshot_when_reading_then_reports_corruption() {
        let bytes = encoded(&sample());
        let result = ScoredTrie::read_from(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(DomainError::CorruptSnapshot { .. })));
    }

    #[test]
    fn given_trailing_bytes_when_reading_then_reports_corruption() {
        let mut bytes = encoded(&sample());
        bytes.push(0);
        let result = ScoredTrie::read_from(bytes.as_slice());
        assert!(matches!(result, Err(DomainError::CorruptSnapshot { .. })));
    }

    #[test]
    fn given_inconsistent_score_when_reading_then_reports_corruption() {
        // root: score 5, not terminal, one child 'a' with score 4, terminal own 4, no children
        let mut bytes = Vec::new();
        bytes.extend_from_slice(SNAPSHOT_MAGIC);
        bytes.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&[5, 0, 1]);
        bytes.extend_from_slice(&[1, b'a']);
        bytes.extend_from_slice(&[4, 1, 4, 0]);

        let result = ScoredTrie::read_from(bytes.as_slice());
        assert!(matches!(result, Err(DomainError::CorruptSnapshot { offset: 12, .. })));
    }

    #[test]
    fn given_duplicate_symbols_when_reading_then_reports_corruption() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(SNAPSHOT_MAGIC);
        bytes.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&[2, 0, 2]);
        bytes.extend_from_slice(&[1, b'a', 1, 1, 1, 0]);
        bytes.extend_from_slice(&[1, b'a', 1, 1, 1, 0]);

        let result = ScoredTrie::read_from(bytes.as_slice());
        assert!(matches!(result, Err(DomainError::CorruptSnapshot { .. })));
    }
}
