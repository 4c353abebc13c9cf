use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};

use crate::{
    deneb::primitives::{Blob, BlobCommitmentInclusionProof, BlobIndex, KzgCommitment, KzgProof},
    phase0::containers::SignedBeaconBlockHeader,
    preset::Preset,
};

#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize, Encode, Decode)]
#[serde(bound = "", deny_unknown_fields)]
pub struct BlobSidecar<P: Preset> {
    pub index: BlobIndex,
    #[serde(with = "ssz_types::serde_utils::hex_fixed_vec")]
    pub blob: Blob<P>,
    #[serde(with = "ssz_types::serde_utils::hex_fixed_vec")]
    pub kzg_commitment: KzgCommitment,
    #[serde(with = "ssz_types::serde_utils::hex_fixed_vec")]
    pub kzg_proof: KzgProof,
    pub signed_block_header: SignedBeaconBlockHeader,
    pub kzg_commitment_inclusion_proof: BlobCommitmentInclusionProof<P>,
}

impl<P: Preset> Eq for BlobSidecar<P> {}
