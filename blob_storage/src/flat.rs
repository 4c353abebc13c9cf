use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::UNIX_EPOCH,
};

use anyhow::Result;
use types::{
    deneb::primitives::BlobIndex,
    phase0::primitives::{Epoch, H256},
    preset::Preset,
};

use crate::{
    cache::{BlobSummary, IndexOutOfBounds, SummaryCache},
    ident::{self, BlobIdent},
    iteration::{populate_index, populate_root, IdentIterator, LayoutLayer, WalkError},
    layout::{remove_root_dir, Layout, LayoutName},
    misc::EpochClock,
};

/// `<base>/<0xroot>/<index>.ssz`.
///
/// Epochs are not recorded in paths, so iteration recovers them from the
/// modification time of each root directory and the epoch hint cannot prove
/// anything about a subtree.
pub struct FlatLayout<P: Preset> {
    base: PathBuf,
    cache: Arc<SummaryCache<P>>,
    clock: EpochClock,
}

impl<P: Preset> FlatLayout<P> {
    pub fn new(base: &Path, cache: Arc<SummaryCache<P>>, clock: EpochClock) -> Self {
        Self {
            base: base.to_owned(),
            cache,
            clock,
        }
    }
}

impl<P: Preset> Layout<P> for FlatLayout<P> {
    fn name(&self) -> LayoutName {
        LayoutName::Flat
    }

    fn dir(&self, ident: BlobIdent) -> PathBuf {
        self.base.join(ident::root_to_string(ident.root))
    }

    fn iter_idents(&self, _before: Epoch) -> Result<IdentIterator, WalkError> {
        let clock = self.clock;

        let layers = vec![
            LayoutLayer::new(ident::is_root_dir, move |ident, path: &Path| {
                let mut ident = populate_root(ident, path)?;
                ident.epoch = epoch_from_mtime::<P>(clock, path)?;
                Ok(ident)
            }),
            LayoutLayer::new(ident::is_ssz_file, populate_index),
        ];

        IdentIterator::new(&self.base, layers)
    }

    fn ident(&self, root: H256, index: BlobIndex) -> Result<BlobIdent> {
        let dir = self.base.join(ident::root_to_string(root));
        let epoch = epoch_from_mtime::<P>(self.clock, &dir)?;

        Ok(BlobIdent::new(root, epoch, index))
    }

    fn summary(&self, root: H256) -> BlobSummary {
        self.cache.summary(root)
    }

    fn notify(&self, ident: BlobIdent) -> Result<(), IndexOutOfBounds> {
        self.cache.ensure(ident)
    }

    fn remove(&self, ident: BlobIdent) -> Result<usize> {
        remove_root_dir(&self.cache, ident.root, &self.dir(ident))
    }

    fn block_parent_dirs(&self, _ident: BlobIdent) -> Vec<PathBuf> {
        // Root directories sit directly in the base, which is never reaped.
        vec![]
    }
}

fn epoch_from_mtime<P: Preset>(clock: EpochClock, path: &Path) -> Result<Epoch, ident::Error> {
    let to_error = |source| ident::Error::ModificationTime {
        path: path.to_owned(),
        source,
    };

    let modified = fs_err::metadata(path)
        .map_err(to_error)?
        .modified()
        .map_err(to_error)?;

    let seconds = modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    Ok(clock.epoch_at_time::<P>(seconds))
}
