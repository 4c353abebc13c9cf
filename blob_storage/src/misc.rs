use core::num::NonZeroU64;
use std::{fs::DirBuilder, io, path::Path};

use nonzero_ext::nonzero;
use typenum::Unsigned as _;
use types::{
    phase0::primitives::{Epoch, Slot, UnixSeconds},
    preset::Preset,
};

pub const DEFAULT_SECONDS_PER_SLOT: NonZeroU64 = nonzero!(12_u64);

pub(crate) const DIRECTORY_PERMISSIONS: u32 = 0o700;

#[must_use]
pub fn compute_epoch_at_slot<P: Preset>(slot: Slot) -> Epoch {
    slot / P::SlotsPerEpoch::U64
}

/// Maps wall-clock timestamps to epochs relative to genesis.
///
/// The flat layout does not persist epochs in paths and has to fall back to
/// directory modification times when iterating, so the conversion saturates
/// to epoch 0 for timestamps before genesis.
#[derive(Clone, Copy, Debug)]
pub struct EpochClock {
    genesis_time: UnixSeconds,
    seconds_per_slot: NonZeroU64,
}

impl EpochClock {
    #[must_use]
    pub const fn new(genesis_time: UnixSeconds, seconds_per_slot: NonZeroU64) -> Self {
        Self {
            genesis_time,
            seconds_per_slot,
        }
    }

    #[must_use]
    pub fn epoch_at_time<P: Preset>(self, time: UnixSeconds) -> Epoch {
        let slot = time.saturating_sub(self.genesis_time) / self.seconds_per_slot.get();
        compute_epoch_at_slot::<P>(slot)
    }
}

pub(crate) fn create_directory(path: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt as _;
        builder.mode(DIRECTORY_PERMISSIONS);
    }

    builder.create(path)
}
