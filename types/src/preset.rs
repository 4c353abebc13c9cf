use core::{fmt::Debug, hash::Hash};

use typenum::{NonZero, Unsigned, U128, U131072, U17, U32, U6, U8, U9};

/// Compile-time constants that vary between configurations of the consensus
/// protocol. Only the constants read by blob sidecar storage are present.
pub trait Preset: Copy + Eq + Ord + Hash + Default + Debug + Send + Sync + 'static {
    // Phase 0
    type SlotsPerEpoch: Unsigned + NonZero + Send + Sync;

    // Deneb
    type BytesPerBlob: Unsigned + Debug + Send + Sync;
    type KzgCommitmentInclusionProofDepth: Unsigned + Debug + Send + Sync;
    type MaxBlobsPerBlock: Unsigned + NonZero + Send + Sync;
}

/// [Mainnet preset](https://github.com/ethereum/consensus-specs/tree/v1.4.0/presets/mainnet).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Mainnet;

impl Preset for Mainnet {
    // Phase 0
    type SlotsPerEpoch = U32;

    // Deneb
    type BytesPerBlob = U131072;
    type KzgCommitmentInclusionProofDepth = U17;
    type MaxBlobsPerBlock = U6;
}

/// [Minimal preset](https://github.com/ethereum/consensus-specs/tree/v1.4.0/presets/minimal).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Minimal;

impl Preset for Minimal {
    // Phase 0
    type SlotsPerEpoch = U8;

    // Deneb
    type BytesPerBlob = U128;
    type KzgCommitmentInclusionProofDepth = U9;
    type MaxBlobsPerBlock = U6;
}
