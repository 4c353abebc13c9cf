use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use types::{
    deneb::primitives::BlobIndex,
    phase0::primitives::{Epoch, H256},
    preset::Preset,
};

use crate::{
    cache::{BlobSummary, IndexOutOfBounds, SummaryCache},
    error,
    ident::{self, BlobIdent},
    iteration::{populate_index, populate_root, IdentIterator, LayoutLayer, WalkError},
    layout::{remove_root_dir, Layout, LayoutName},
};

pub(crate) const PERIODIC_EPOCH_BASE_DIR: &str = "by-epoch";

/// `<base>/by-epoch/<epoch>/<0xroot>/<index>.ssz`.
///
/// Each epoch gets its own chunk directory, so iteration recovers exact
/// epochs from directory names and the prune hint can skip precisely the
/// chunks at or above the threshold.
pub struct PeriodicEpochLayout<P: Preset> {
    base: PathBuf,
    cache: Arc<SummaryCache<P>>,
}

impl<P: Preset> PeriodicEpochLayout<P> {
    pub fn new(base: &Path, cache: Arc<SummaryCache<P>>) -> Self {
        Self {
            base: base.to_owned(),
            cache,
        }
    }

    fn epoch_base(&self) -> PathBuf {
        self.base.join(PERIODIC_EPOCH_BASE_DIR)
    }
}

impl<P: Preset> Layout<P> for PeriodicEpochLayout<P> {
    fn name(&self) -> LayoutName {
        LayoutName::ByEpoch
    }

    fn dir(&self, ident: BlobIdent) -> PathBuf {
        self.epoch_base()
            .join(ident.epoch.to_string())
            .join(ident::root_to_string(ident.root))
    }

    fn iter_idents(&self, before: Epoch) -> Result<IdentIterator, WalkError> {
        let layers = vec![
            LayoutLayer::new(
                move |path: &Path| {
                    epoch_from_dir_name(path)
                        .is_some_and(|epoch| before == 0 || epoch < before)
                },
                |mut ident, path: &Path| {
                    ident.epoch = epoch_from_dir_name(path).ok_or_else(|| {
                        ident::Error::InvalidDirectoryLayout {
                            path: path.to_owned(),
                        }
                    })?;

                    Ok(ident)
                },
            ),
            LayoutLayer::new(ident::is_root_dir, populate_root),
            LayoutLayer::new(ident::is_ssz_file, populate_index),
        ];

        IdentIterator::new(&self.epoch_base(), layers)
    }

    fn ident(&self, root: H256, index: BlobIndex) -> Result<BlobIdent> {
        // The cache records the epoch a root was stored under, which saves
        // scanning every chunk directory for the root.
        let summary = self.cache.get(root).ok_or_else(|| {
            error::not_found().context(format!("no blob summary for block {root:?}"))
        })?;

        Ok(BlobIdent::new(root, summary.epoch(), index))
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

    fn block_parent_dirs(&self, ident: BlobIdent) -> Vec<PathBuf> {
        vec![
            self.epoch_base().join(ident.epoch.to_string()),
            self.epoch_base(),
        ]
    }
}

fn epoch_from_dir_name(path: &Path) -> Option<Epoch> {
    path.file_name().and_then(OsStr::to_str)?.parse().ok()
}
