use ssz_types::FixedVector;
use typenum::U48;

use crate::{phase0::primitives::H256, preset::Preset};

pub type Blob<P> = FixedVector<u8, <P as Preset>::BytesPerBlob>;
pub type BlobIndex = u64;
pub type KzgCommitment = FixedVector<u8, U48>;
pub type KzgProof = FixedVector<u8, U48>;

pub type BlobCommitmentInclusionProof<P> =
    FixedVector<H256, <P as Preset>::KzgCommitmentInclusionProofDepth>;
