use core::marker::PhantomData;
use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;
use typenum::Unsigned as _;
use types::{
    deneb::primitives::BlobIndex,
    phase0::primitives::{Epoch, H256},
    preset::Preset,
};

use crate::ident::BlobIdent;

#[derive(Debug, Error)]
#[error("blob index {index} is out of bounds (max blobs per block: {bound})")]
pub struct IndexOutOfBounds {
    pub index: BlobIndex,
    pub bound: u64,
}

/// Which indices of a block root are on disk, as a fixed-width bitfield.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct BlobIndexMask {
    bits: u16,
}

impl BlobIndexMask {
    #[must_use]
    pub const fn has(self, index: BlobIndex) -> bool {
        index < u16::BITS as u64 && self.bits & (1 << index) != 0
    }

    #[must_use]
    pub const fn count(self) -> usize {
        self.bits.count_ones() as usize
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    const fn with(self, index: BlobIndex) -> Self {
        Self {
            bits: self.bits | 1 << index,
        }
    }
}

/// Cached disk state for one block root.
///
/// The epoch rides along with the index mask so layouts that encode epochs in
/// directory names can find a root's directory without scanning the tree.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct BlobSummary {
    epoch: Epoch,
    mask: BlobIndexMask,
}

impl BlobSummary {
    #[must_use]
    pub const fn epoch(self) -> Epoch {
        self.epoch
    }

    #[must_use]
    pub const fn mask(self) -> BlobIndexMask {
        self.mask
    }

    #[must_use]
    pub const fn has_index(self, index: BlobIndex) -> bool {
        self.mask.has(index)
    }

    #[must_use]
    pub const fn count(self) -> usize {
        self.mask.count()
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.mask.is_empty()
    }
}

/// The authoritative quick-lookup surface over the on-disk blob tree.
pub struct SummaryCache<P> {
    summaries: RwLock<HashMap<H256, BlobSummary>>,
    phantom: PhantomData<P>,
}

impl<P> Default for SummaryCache<P> {
    fn default() -> Self {
        Self {
            summaries: RwLock::default(),
            phantom: PhantomData,
        }
    }
}

impl<P: Preset> SummaryCache<P> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure(&self, ident: BlobIdent) -> Result<(), IndexOutOfBounds> {
        let bound = P::MaxBlobsPerBlock::U64;

        if ident.index >= bound {
            return Err(IndexOutOfBounds {
                index: ident.index,
                bound,
            });
        }

        let mut summaries = self.summaries.write();
        let summary = summaries.entry(ident.root).or_default();

        summary.epoch = ident.epoch;
        summary.mask = summary.mask.with(ident.index);

        Ok(())
    }

    #[must_use]
    pub fn summary(&self, root: H256) -> BlobSummary {
        self.get(root).unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, root: H256) -> Option<BlobSummary> {
        self.summaries.read().get(&root).copied()
    }

    pub fn clear(&self, root: H256) {
        self.summaries.write().remove(&root);
    }

    pub fn clear_all(&self) {
        self.summaries.write().clear();
    }
}
