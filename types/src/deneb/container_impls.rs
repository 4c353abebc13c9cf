use tree_hash::TreeHash as _;

use crate::{
    deneb::containers::BlobSidecar,
    phase0::primitives::{Slot, H256},
    preset::Preset,
};

impl<P: Preset> BlobSidecar<P> {
    pub const fn slot(&self) -> Slot {
        self.signed_block_header.message.slot
    }

    #[must_use]
    pub fn block_root(&self) -> H256 {
        self.signed_block_header.message.tree_hash_root()
    }
}
