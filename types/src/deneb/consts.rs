use crate::phase0::primitives::Epoch;

/// The shortest blob retention window a node may advertise.
/// <https://github.com/ethereum/consensus-specs/blob/v1.4.0/specs/deneb/p2p-interface.md#configuration>
pub const MIN_EPOCHS_FOR_BLOB_SIDECARS_REQUESTS: Epoch = 4096;
