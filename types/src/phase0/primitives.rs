use ssz_types::FixedVector;
use typenum::U96;

pub type Epoch = u64;
pub type Slot = u64;
pub type UnixSeconds = u64;
pub type ValidatorIndex = u64;

pub type H256 = ethereum_types::H256;

// Signatures are opaque bytes here. Blob storage never verifies them.
pub type SignatureBytes = FixedVector<u8, U96>;
