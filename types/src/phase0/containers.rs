use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

use crate::phase0::primitives::{SignatureBytes, Slot, ValidatorIndex, H256};

#[derive(Clone, PartialEq, Eq, Debug, Default, Deserialize, Serialize, Encode, Decode, TreeHash)]
#[serde(deny_unknown_fields)]
pub struct BeaconBlockHeader {
    pub slot: Slot,
    pub proposer_index: ValidatorIndex,
    pub parent_root: H256,
    pub state_root: H256,
    pub body_root: H256,
}

#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize, Encode, Decode)]
#[serde(deny_unknown_fields)]
pub struct SignedBeaconBlockHeader {
    pub message: BeaconBlockHeader,
    #[serde(with = "ssz_types::serde_utils::hex_fixed_vec")]
    pub signature: SignatureBytes,
}

impl Eq for SignedBeaconBlockHeader {}
