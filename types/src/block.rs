//! Blocks and block headers.

use crate::hash::{BlockHash, TxHash};
use crate::hashing::{blake2b_256_multi, CanonicalWriter};
use crate::time::Timestamp;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// Whether a stored header stands alone or has its full block body persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderKind {
    /// Header only (header-first sync).
    Header,
    /// Header whose transactions have been applied and persisted.
    Extended,
}

/// A full block. The hash is derived from the header fields and never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u32,
    pub previous_hash: BlockHash,
    pub timestamp: Timestamp,
    pub consensus_data: u64,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(
        index: u32,
        previous_hash: BlockHash,
        timestamp: Timestamp,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            index,
            previous_hash,
            timestamp,
            consensus_data: 0,
            transactions,
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    pub fn transaction_hashes(&self) -> Vec<TxHash> {
        self.transactions.iter().map(Transaction::hash).collect()
    }

    /// Compute the block hash. Identical to the hash of [`Block::header`].
    pub fn hash(&self) -> BlockHash {
        header_hash(
            self.index,
            &self.previous_hash,
            self.timestamp,
            self.consensus_data,
            &self.transaction_hashes(),
        )
    }

    /// Truncate to a header-only record.
    pub fn header(&self) -> BlockHeader {
        self.truncate(HeaderKind::Header)
    }

    /// Header recording that the full body has been persisted.
    pub fn extended_header(&self) -> BlockHeader {
        self.truncate(HeaderKind::Extended)
    }

    fn truncate(&self, kind: HeaderKind) -> BlockHeader {
        let transaction_hashes = self.transaction_hashes();
        let hash = header_hash(
            self.index,
            &self.previous_hash,
            self.timestamp,
            self.consensus_data,
            &transaction_hashes,
        );
        BlockHeader {
            index: self.index,
            previous_hash: self.previous_hash,
            timestamp: self.timestamp,
            consensus_data: self.consensus_data,
            transaction_count: transaction_hashes.len() as u32,
            transaction_hashes,
            kind,
            hash: Some(hash),
        }
    }
}

/// A block without its transaction bodies.
///
/// `hash` is materialized lazily: headers received from peers arrive without
/// it and get it filled in by [`BlockHeader::ensure_hash`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub index: u32,
    pub previous_hash: BlockHash,
    pub timestamp: Timestamp,
    pub consensus_data: u64,
    pub transaction_count: u32,
    pub transaction_hashes: Vec<TxHash>,
    pub kind: HeaderKind,
    #[serde(default)]
    pub hash: Option<BlockHash>,
}

impl BlockHeader {
    /// The cached hash, or a freshly computed one.
    pub fn hash(&self) -> BlockHash {
        self.hash.unwrap_or_else(|| self.compute_hash())
    }

    /// Compute and cache the hash if it is absent.
    pub fn ensure_hash(&mut self) -> BlockHash {
        *self.hash.get_or_insert_with(|| {
            header_hash(
                self.index,
                &self.previous_hash,
                self.timestamp,
                self.consensus_data,
                &self.transaction_hashes,
            )
        })
    }

    fn compute_hash(&self) -> BlockHash {
        header_hash(
            self.index,
            &self.previous_hash,
            self.timestamp,
            self.consensus_data,
            &self.transaction_hashes,
        )
    }
}

fn header_hash(
    index: u32,
    previous_hash: &BlockHash,
    timestamp: Timestamp,
    consensus_data: u64,
    transaction_hashes: &[TxHash],
) -> BlockHash {
    let tx_parts: Vec<&[u8]> = transaction_hashes
        .iter()
        .map(|h| h.as_bytes().as_slice())
        .collect();
    let tx_root = blake2b_256_multi(&tx_parts);

    let mut w = CanonicalWriter::new();
    w.u32(index)
        .fixed(previous_hash.as_bytes())
        .u32(timestamp.as_secs())
        .u64(consensus_data)
        .fixed(&tx_root);
    BlockHash::new(w.digest())
}
