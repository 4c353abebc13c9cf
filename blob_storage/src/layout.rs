use core::str::FromStr;
use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    ffi::OsStr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use anyhow::{Context as _, Result};
use derive_more::Display;
use itertools::Itertools as _;
use log::{debug, error, info, warn};
use types::{
    deneb::primitives::BlobIndex,
    phase0::primitives::{Epoch, H256},
    preset::Preset,
};

use crate::{
    by_epoch::PeriodicEpochLayout,
    cache::{BlobSummary, IndexOutOfBounds, SummaryCache},
    error::Error,
    flat::FlatLayout,
    ident::{BlobIdent, PART_EXT},
    iteration::{IdentIterator, WalkError},
    misc::{self, EpochClock},
    pruner::{self, PruneSummary},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum LayoutName {
    #[display(fmt = "flat")]
    Flat,
    #[display(fmt = "by-epoch")]
    ByEpoch,
}

impl LayoutName {
    pub const ALL: [Self; 2] = [Self::Flat, Self::ByEpoch];
}

impl FromStr for LayoutName {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "flat" => Ok(Self::Flat),
            "by-epoch" => Ok(Self::ByEpoch),
            _ => Err(Error::InvalidLayoutName {
                name: name.to_owned(),
            }),
        }
    }
}

/// The capability set a directory scheme must provide.
///
/// Layouts are values selected at construction time and consumed through
/// trait objects, so migration code can hold two of them at once.
pub trait Layout<P: Preset>: Send + Sync {
    fn name(&self) -> LayoutName;

    /// The directory containing the artifact.
    fn dir(&self, ident: BlobIdent) -> PathBuf;

    fn ssz_path(&self, ident: BlobIdent) -> PathBuf {
        self.dir(ident).join(ident.ssz_file_name())
    }

    fn part_path(&self, ident: BlobIdent, entropy: &str) -> PathBuf {
        self.dir(ident).join(ident.part_file_name(entropy))
    }

    /// Lazily enumerates every artifact in the tree. A non-zero `before` is a
    /// hint: subtrees whose epochs are provably `>= before` may be skipped.
    fn iter_idents(&self, before: Epoch) -> Result<IdentIterator, WalkError>;

    /// Recovers a full ident from a root and an index.
    fn ident(&self, root: H256, index: BlobIndex) -> Result<BlobIdent>;

    /// Recovers the root's ident (index 0) without touching a leaf file.
    fn dir_ident(&self, root: H256) -> Result<BlobIdent> {
        self.ident(root, 0)
    }

    fn summary(&self, root: H256) -> BlobSummary;

    fn notify(&self, ident: BlobIdent) -> Result<(), IndexOutOfBounds>;

    fn prune_before(&self, before: Epoch) -> Result<BTreeMap<Epoch, PruneSummary>> {
        pruner::prune_before(before, self)
    }

    /// Removes every artifact of `ident.root`, returning the number removed.
    fn remove(&self, ident: BlobIdent) -> Result<usize>;

    /// Directories above `dir(ident)` that become candidates for
    /// emptiness-reaping once migration has drained them.
    fn block_parent_dirs(&self, ident: BlobIdent) -> Vec<PathBuf>;
}

pub(crate) fn new_layout<P: Preset>(
    name: LayoutName,
    base: &Path,
    cache: Arc<SummaryCache<P>>,
    clock: EpochClock,
) -> Arc<dyn Layout<P>> {
    match name {
        LayoutName::Flat => Arc::new(FlatLayout::new(base, cache, clock)),
        LayoutName::ByEpoch => Arc::new(PeriodicEpochLayout::new(base, cache)),
    }
}

/// Removes a root directory and its cache entry, cache first so readers never
/// observe a bit for a file that is about to disappear.
pub(crate) fn remove_root_dir<P: Preset>(
    cache: &SummaryCache<P>,
    root: H256,
    dir: &Path,
) -> Result<usize> {
    let removed = cache.summary(root).count();

    cache.clear(root);

    match fs_err::remove_dir_all(dir) {
        Ok(()) => Ok(removed),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(error) => Err(error.into()),
    }
}

/// Rebuilds the summary cache from the on-disk tree, sweeping stale `.part`
/// files left behind by interrupted saves along the way.
pub(crate) fn warm_cache<P: Preset>(
    layout: &dyn Layout<P>,
    cache: &SummaryCache<P>,
) -> Result<()> {
    let iterator = layout
        .iter_idents(0)
        .map_err(|error| anyhow::Error::new(error).context(Error::CacheWarmFailed))?;

    let mut swept_dir = None;

    for item in iterator {
        match item {
            Ok(ident) => {
                cache
                    .ensure(ident)
                    .with_context(|| {
                        format!("failed to write cache entry for {:?}", layout.ssz_path(ident))
                    })
                    .context(Error::CacheWarmFailed)?;

                let dir = layout.dir(ident);

                if swept_dir.as_deref() != Some(dir.as_path()) {
                    sweep_part_files(&dir);
                    swept_dir = Some(dir);
                }
            }
            Err(error) if error.is_fatal() => {
                return Err(anyhow::Error::new(error).context(Error::CacheWarmFailed));
            }
            Err(error) => error!("failed to cache blob data for path: {error:#}"),
        }
    }

    Ok(())
}

fn sweep_part_files(dir: &Path) {
    let Ok(entries) = fs_err::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();

        if path.extension() == Some(OsStr::new(PART_EXT)) {
            match fs_err::remove_file(&path) {
                Ok(()) => debug!("removed stale partial blob file {path:?}"),
                Err(error) => warn!("failed to remove stale partial blob file {path:?}: {error}"),
            }
        }
    }
}

/// Moves every artifact from `from` to `to`, one root directory at a time.
///
/// Every step is a rename, so a crash mid-migration leaves a mixture of the
/// two layouts and the next start resumes from whatever is left in the legacy
/// tree. Existing targets are conflicts to be investigated, never overwritten.
pub(crate) fn migrate_layout<P: Preset>(
    from: &dyn Layout<P>,
    to: &dyn Layout<P>,
    cache: &SummaryCache<P>,
) -> Result<()> {
    let start = Instant::now();

    let mut iterator = from
        .iter_idents(0)
        .map_err(|error| anyhow::Error::new(error).context(Error::MigrationFailure))?
        .peekable();

    if iterator.peek().is_none() {
        return Err(Error::LayoutNotDetected.into());
    }

    info!(
        "migrating blob filesystem layout from {} to {} \
         (this one-time operation can take extra time for systems \
         with extended blob storage and a cold disk cache)",
        from.name(),
        to.name(),
    );

    let mut last_moved: Option<PathBuf> = None;
    let mut created_parents = HashSet::new();
    let mut moved = 0_usize;
    let mut cleaner = DirCleaner::default();

    for item in iterator {
        let ident = match item {
            Ok(ident) => ident,
            Err(error) if error.is_fatal() => {
                return Err(anyhow::Error::new(error).context(Error::MigrationFailure));
            }
            Err(error) => {
                error!("failed to migrate blob path: {error:#}");
                continue;
            }
        };

        let source = from.dir(ident);
        let target = to.dir(ident);

        if last_moved.as_deref() != Some(source.as_path()) {
            if let Some(parent) = target.parent() {
                if !parent.as_os_str().is_empty() && !created_parents.contains(parent) {
                    misc::create_directory(parent)
                        .with_context(|| {
                            format!(
                                "failed to make enclosing path before moving \
                                 {source:?} to {target:?}",
                            )
                        })
                        .context(Error::MigrationFailure)?;

                    created_parents.insert(parent.to_owned());
                }
            }

            if moved == 0 {
                ensure_same_filesystem(&source, &target)?;
            }

            if target.symlink_metadata().is_ok() {
                return Err(anyhow::anyhow!(
                    "migration target {target:?} already exists for source {source:?}",
                )
                .context(Error::MigrationFailure));
            }

            fs_err::rename(&source, &target)
                .with_context(|| format!("could not rename {source:?} to {target:?}"))
                .context(Error::MigrationFailure)?;

            moved += 1;
            last_moved = Some(source);

            for dir in from.block_parent_dirs(ident) {
                cleaner.add(dir);
            }
        }

        cache
            .ensure(ident)
            .with_context(|| format!("could not cache path {:?}", to.ssz_path(ident)))
            .context(Error::MigrationFailure)?;
    }

    cleaner.clean();

    if moved > 0 {
        info!(
            "blob filesystem migration complete: moved {moved} directories in {:?}",
            start.elapsed(),
        );
    }

    Ok(())
}

#[cfg(unix)]
fn ensure_same_filesystem(source: &Path, target: &Path) -> Result<()> {
    use std::os::unix::fs::MetadataExt as _;

    let source_device = fs_err::metadata(source)?.dev();

    // The target itself does not exist yet; its parent was just created.
    let target_device = target
        .parent()
        .map(fs_err::metadata)
        .transpose()?
        .map(|metadata| metadata.dev());

    if target_device.is_some_and(|device| device != source_device) {
        return Err(anyhow::anyhow!(
            "refusing to migrate blobs across filesystems ({source:?} to {target:?})",
        )
        .context(Error::MigrationFailure));
    }

    Ok(())
}

#[cfg(not(unix))]
fn ensure_same_filesystem(_source: &Path, _target: &Path) -> Result<()> {
    Ok(())
}

/// Collects directories drained by migration and deletes the empty ones,
/// deepest first. `remove_dir` refuses to delete non-empty directories, so
/// anything unexpected left behind fails here instead of being lost.
#[derive(Default)]
struct DirCleaner {
    layers: BTreeMap<usize, BTreeSet<PathBuf>>,
}

impl DirCleaner {
    fn add(&mut self, dir: PathBuf) {
        let depth = dir.components().count();

        self.layers.entry(depth).or_default().insert(dir);
    }

    fn clean(self) {
        for dir in self
            .layers
            .into_iter()
            .rev()
            .flat_map(|(_, dirs)| dirs)
            .collect_vec()
        {
            if let Err(error) = fs_err::remove_dir(&dir) {
                error!("failed to remove blob directory {dir:?}, remove it manually if desired: {error}");

                match fs_err::read_dir(&dir) {
                    Ok(entries) => {
                        for entry in entries.flatten() {
                            debug!(
                                "unexpected file {:?} blocking migrated blob directory cleanup",
                                entry.path(),
                            );
                        }
                    }
                    Err(error) => error!(
                        "could not list blob directory {dir:?} to find reason for removal failure: {error}",
                    ),
                }
            }
        }
    }
}
