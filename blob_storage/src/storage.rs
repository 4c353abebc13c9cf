use core::num::NonZeroU64;
use std::{
    collections::{BTreeMap, HashMap},
    io::Write as _,
    path::PathBuf,
    sync::Arc,
};

use anyhow::{bail, Context as _, Result};
use log::{debug, info, warn};
use parking_lot::Mutex;
use ssz::{Decode as _, Encode as _};
use typenum::Unsigned as _;
use types::{
    deneb::{
        consts::MIN_EPOCHS_FOR_BLOB_SIDECARS_REQUESTS,
        containers::BlobSidecar,
        primitives::BlobIndex,
    },
    phase0::primitives::{Epoch, UnixSeconds, H256},
    preset::Preset,
};

use crate::{
    cache::{BlobSummary, IndexOutOfBounds, SummaryCache},
    error::{self, Error},
    ident::BlobIdent,
    layout::{migrate_layout, new_layout, warm_cache, Layout, LayoutName},
    misc::{self, EpochClock},
    pruner::PruneSummary,
};

pub struct BlobStorageConfig {
    pub blobs_path: PathBuf,
    pub retention_epochs: Epoch,
    pub layout_name: String,
    pub genesis_time: UnixSeconds,
    pub seconds_per_slot: NonZeroU64,
}

impl Default for BlobStorageConfig {
    fn default() -> Self {
        Self {
            blobs_path: PathBuf::new(),
            retention_epochs: MIN_EPOCHS_FOR_BLOB_SIDECARS_REQUESTS,
            layout_name: LayoutName::Flat.to_string(),
            genesis_time: 0,
            seconds_per_slot: misc::DEFAULT_SECONDS_PER_SLOT,
        }
    }
}

/// Filesystem-backed storage for verified blob sidecars.
///
/// Safe for concurrent use from arbitrary threads. All state is reachable
/// from one value of this type; tests instantiate one per case.
pub struct BlobStorage<P: Preset> {
    base: PathBuf,
    layout: Arc<dyn Layout<P>>,
    cache: Arc<SummaryCache<P>>,
    retention_epochs: Epoch,
    save_locks: Mutex<HashMap<BlobIdent, Arc<Mutex<()>>>>,
}

impl<P: Preset> core::fmt::Debug for BlobStorage<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlobStorage")
            .field("base", &self.base)
            .field("retention_epochs", &self.retention_epochs)
            .finish_non_exhaustive()
    }
}

impl<P: Preset> BlobStorage<P> {
    pub fn new(config: &BlobStorageConfig) -> Result<Self> {
        let BlobStorageConfig {
            blobs_path,
            retention_epochs,
            layout_name,
            genesis_time,
            seconds_per_slot,
        } = config;

        if blobs_path.as_os_str().is_empty() {
            bail!(Error::NoBasePath);
        }

        if *retention_epochs < MIN_EPOCHS_FOR_BLOB_SIDECARS_REQUESTS {
            bail!(Error::InvalidBlobRetentionEpochs {
                requested: *retention_epochs,
                minimum: MIN_EPOCHS_FOR_BLOB_SIDECARS_REQUESTS,
            });
        }

        let name = layout_name.parse::<LayoutName>()?;

        misc::create_directory(blobs_path)
            .with_context(|| format!("failed to create blob storage base {blobs_path:?}"))?;

        let clock = EpochClock::new(*genesis_time, *seconds_per_slot);
        let cache = Arc::new(SummaryCache::new());
        let layout = new_layout(name, blobs_path, cache.clone(), clock);

        for legacy_name in LayoutName::ALL {
            if legacy_name == name {
                continue;
            }

            let legacy = new_layout(legacy_name, blobs_path, cache.clone(), clock);

            match migrate_layout(legacy.as_ref(), layout.as_ref(), &cache) {
                Ok(()) => {}
                Err(error)
                    if matches!(
                        error.downcast_ref::<Error>(),
                        Some(Error::LayoutNotDetected),
                    ) =>
                {
                    debug!("no {legacy_name} layout blobs found to migrate");
                }
                Err(error) => return Err(error),
            }
        }

        warm_cache(layout.as_ref(), &cache)?;

        Ok(Self {
            base: blobs_path.clone(),
            layout,
            cache,
            retention_epochs: *retention_epochs,
            save_locks: Mutex::default(),
        })
    }

    /// Persists a verified sidecar, atomically and idempotently.
    ///
    /// Concurrent saves of the same sidecar collapse into a single write;
    /// none of them observe an error from the duplication.
    pub fn save(&self, blob_sidecar: &BlobSidecar<P>) -> Result<()> {
        let ident = BlobIdent::for_sidecar(blob_sidecar);
        let bound = P::MaxBlobsPerBlock::U64;

        if ident.index >= bound {
            bail!(IndexOutOfBounds {
                index: ident.index,
                bound,
            });
        }

        if self.layout.summary(ident.root).has_index(ident.index) {
            return Ok(());
        }

        let lock = self
            .save_locks
            .lock()
            .entry(ident)
            .or_default()
            .clone();

        let result = {
            let _guard = lock.lock();
            self.save_under_lock(blob_sidecar, ident)
        };

        drop(lock);

        // Each writer drops its clone before this check, so the last one to
        // leave sees the table's reference alone and retires the entry. New
        // acquirers hold the table lock while cloning and cannot be missed.
        let mut save_locks = self.save_locks.lock();

        if save_locks
            .get(&ident)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            save_locks.remove(&ident);
        }

        result
    }

    fn save_under_lock(&self, blob_sidecar: &BlobSidecar<P>, ident: BlobIdent) -> Result<()> {
        // A concurrent writer may have published while this one waited.
        if self.layout.summary(ident.root).has_index(ident.index) {
            return Ok(());
        }

        let dir = self.layout.dir(ident);

        misc::create_directory(&dir)
            .with_context(|| format!("failed to create blob directory {dir:?}"))?;

        let entropy = hex::encode(rand::random::<u64>().to_be_bytes());
        let part_path = self.layout.part_path(ident, &entropy);
        let ssz_path = self.layout.ssz_path(ident);

        let publish = || -> Result<()> {
            let mut file = fs_err::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&part_path)?;

            file.write_all(&blob_sidecar.as_ssz_bytes())?;
            file.sync_all()?;
            drop(file);

            // The rename is the atomic publication point.
            fs_err::rename(&part_path, &ssz_path)?;

            Ok(())
        };

        if let Err(error) = publish() {
            if let Err(cleanup_error) = fs_err::remove_file(&part_path) {
                if cleanup_error.kind() != std::io::ErrorKind::NotFound {
                    warn!("failed to clean up partial blob file {part_path:?}: {cleanup_error}");
                }
            }

            return Err(error)
                .with_context(|| format!("failed to save blob sidecar to {ssz_path:?}"));
        }

        if let Err(error) = fs_err::File::open(&dir).and_then(|dir_file| dir_file.sync_all()) {
            warn!("failed to sync blob directory {dir:?}: {error}");
        }

        self.layout.notify(ident)?;

        Ok(())
    }

    /// Reads a sidecar back. Reports a not-found error (recognizable through
    /// [`is_not_found`](crate::error::is_not_found)) when the cache has no
    /// bit for the index or the file is gone.
    pub fn get(&self, root: H256, index: BlobIndex) -> Result<BlobSidecar<P>> {
        if !self.cache.summary(root).has_index(index) {
            return Err(error::not_found()
                .context(format!("no blob sidecar for block {root:?} index {index}")));
        }

        let ident = self.layout.ident(root, index)?;
        let ssz_path = self.layout.ssz_path(ident);
        let bytes = fs_err::read(&ssz_path)?;

        BlobSidecar::from_ssz_bytes(&bytes)
            .map_err(|error| anyhow::anyhow!("failed to decode blob sidecar at {ssz_path:?}: {error:?}"))
    }

    /// Removes all artifacts for a block root. Roots that are already absent
    /// are not an error.
    pub fn remove(&self, root: H256) -> Result<()> {
        let ident = match self.layout.dir_ident(root) {
            Ok(ident) => ident,
            Err(error) if error::is_not_found(&error) => return Ok(()),
            Err(error) => return Err(error),
        };

        self.layout.remove(ident)?;

        Ok(())
    }

    /// Removes every artifact below the base path and resets the cache.
    /// Callers must quiesce writers first.
    pub fn clear(&self) -> Result<()> {
        self.cache.clear_all();

        match fs_err::remove_dir_all(&self.base) {
            Ok(()) => {}
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => return Err(error.into()),
        }

        misc::create_directory(&self.base)
            .with_context(|| format!("failed to recreate blob storage base {:?}", self.base))?;

        Ok(())
    }

    #[must_use]
    pub fn summary(&self, root: H256) -> BlobSummary {
        self.cache.summary(root)
    }

    #[must_use]
    pub fn within_retention_period(&self, requested: Epoch, current: Epoch) -> bool {
        current <= requested.saturating_add(self.retention_epochs)
    }

    pub fn prune_before(&self, before: Epoch) -> Result<BTreeMap<Epoch, PruneSummary>> {
        self.layout.prune_before(before)
    }

    /// Prunes everything the retention window no longer obliges this node to
    /// keep, given the current epoch.
    pub fn prune_expired(&self, current_epoch: Epoch) -> Result<BTreeMap<Epoch, PruneSummary>> {
        let summaries = self.prune_before(current_epoch.saturating_sub(self.retention_epochs))?;

        for (epoch, summary) in &summaries {
            if summary.blobs_pruned > 0 || !summary.failed_removals.is_empty() {
                info!(
                    "pruned {} blob sidecars from epoch {epoch} ({} failed removals)",
                    summary.blobs_pruned,
                    summary.failed_removals.len(),
                );
            }
        }

        Ok(summaries)
    }

    #[must_use]
    pub fn layout_name(&self) -> LayoutName {
        self.layout.name()
    }

    #[must_use]
    pub const fn retention_epochs(&self) -> Epoch {
        self.retention_epochs
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        thread,
        time::{SystemTime, UNIX_EPOCH},
    };

    use ssz::Encode as _;
    use tempfile::TempDir;
    use test_case::test_case;
    use types::{deneb::primitives::BlobIndex, phase0::primitives::Slot, preset::Mainnet};

    use crate::{error::is_not_found, ident};

    use super::*;

    fn config(directory: &TempDir, layout_name: LayoutName) -> BlobStorageConfig {
        BlobStorageConfig {
            blobs_path: directory.path().join("blobs"),
            layout_name: layout_name.to_string(),
            ..BlobStorageConfig::default()
        }
    }

    fn build_storage(directory: &TempDir, layout_name: LayoutName) -> BlobStorage<Mainnet> {
        BlobStorage::new(&config(directory, layout_name))
            .expect("creating blob storage in a temporary directory succeeds")
    }

    fn test_sidecar(slot: Slot, parent_byte: u8, index: BlobIndex) -> BlobSidecar<Mainnet> {
        let mut blob_sidecar = BlobSidecar::default();

        blob_sidecar.index = index;
        blob_sidecar.signed_block_header.message.slot = slot;
        blob_sidecar.signed_block_header.message.parent_root = H256::repeat_byte(parent_byte);

        blob_sidecar
    }

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("the clock is past the unix epoch")
            .as_secs()
    }

    #[test_case(LayoutName::Flat)]
    #[test_case(LayoutName::ByEpoch)]
    fn save_then_get_round_trips(layout_name: LayoutName) {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let storage = build_storage(&directory, layout_name);
        let blob_sidecar = test_sidecar(0, 1, 2);
        let root = blob_sidecar.block_root();

        storage.save(&blob_sidecar).expect("saving succeeds");

        let read_back = storage.get(root, 2).expect("the saved sidecar is readable");

        assert_eq!(read_back, blob_sidecar);

        let summary = storage.summary(root);

        assert_eq!(summary.count(), 1);

        for index in 0..6 {
            assert_eq!(summary.has_index(index), index == 2);
        }
    }

    #[test]
    fn duplicate_save_is_a_no_op() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let storage = build_storage(&directory, LayoutName::Flat);
        let blob_sidecar = test_sidecar(0, 1, 0);
        let root = blob_sidecar.block_root();

        storage.save(&blob_sidecar).expect("the first save succeeds");
        storage.save(&blob_sidecar).expect("the second save succeeds");

        let ident = storage
            .layout
            .ident(root, 0)
            .expect("the ident of a saved sidecar is recoverable");

        let bytes =
            fs::read(storage.layout.ssz_path(ident)).expect("the saved file is readable");

        assert_eq!(bytes, blob_sidecar.as_ssz_bytes());
    }

    #[test]
    fn concurrent_saves_collapse_to_one_write() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let storage = build_storage(&directory, LayoutName::Flat);
        let blob_sidecar = test_sidecar(0, 1, 0);
        let root = blob_sidecar.block_root();

        thread::scope(|scope| {
            for _ in 0..100 {
                scope.spawn(|| storage.save(&blob_sidecar).expect("every save succeeds"));
            }
        });

        let read_back = storage.get(root, 0).expect("the saved sidecar is readable");

        assert_eq!(read_back, blob_sidecar);

        let ident = storage
            .layout
            .ident(root, 0)
            .expect("the ident of a saved sidecar is recoverable");

        let entries = fs::read_dir(storage.layout.dir(ident))
            .expect("the root directory is listable")
            .count();

        assert_eq!(entries, 1);
        assert!(storage.save_locks.lock().is_empty());
    }

    #[test_case(LayoutName::Flat)]
    #[test_case(LayoutName::ByEpoch)]
    fn remove_drops_all_artifacts_of_a_root(layout_name: LayoutName) {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let storage = build_storage(&directory, layout_name);
        let blob_sidecar = test_sidecar(0, 1, 0);
        let other = test_sidecar(0, 1, 3);
        let root = blob_sidecar.block_root();

        storage.save(&blob_sidecar).expect("saving succeeds");
        storage.save(&other).expect("saving succeeds");
        storage.get(root, 0).expect("the saved sidecar is readable");

        storage.remove(root).expect("removing a stored root succeeds");

        assert!(is_not_found(
            &storage.get(root, 0).expect_err("removed sidecars are gone"),
        ));
        assert!(storage.summary(root).is_empty());

        // Roots that were never stored are not an error.
        storage
            .remove(H256::repeat_byte(0xfe))
            .expect("removing an absent root succeeds");
    }

    #[test]
    fn clear_resets_cache_and_disk() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let storage = build_storage(&directory, LayoutName::Flat);
        let blob_sidecar = test_sidecar(0, 1, 2);
        let root = blob_sidecar.block_root();

        storage.save(&blob_sidecar).expect("saving succeeds");
        storage.clear().expect("clearing succeeds");

        assert!(is_not_found(
            &storage.get(root, 2).expect_err("cleared sidecars are gone"),
        ));

        let entries = fs::read_dir(&storage.base)
            .expect("the base directory still exists")
            .count();

        assert_eq!(entries, 0);
    }

    #[test]
    fn get_reports_not_found_for_unknown_roots() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let storage = build_storage(&directory, LayoutName::Flat);

        let error = storage
            .get(H256::repeat_byte(9), 0)
            .expect_err("nothing was stored");

        assert!(is_not_found(&error));
    }

    #[test]
    fn warmup_rebuilds_summaries_from_disk() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let first = test_sidecar(0, 1, 0);
        let second = test_sidecar(0, 1, 2);
        let other_root = test_sidecar(32, 2, 1);

        {
            let storage = build_storage(&directory, LayoutName::Flat);

            for blob_sidecar in [&first, &second, &other_root] {
                storage.save(blob_sidecar).expect("saving succeeds");
            }
        }

        let storage = build_storage(&directory, LayoutName::Flat);
        let summary = storage.summary(first.block_root());

        assert!(summary.has_index(0));
        assert!(summary.has_index(2));
        assert_eq!(summary.count(), 2);
        assert_eq!(storage.summary(other_root.block_root()).count(), 1);

        let read_back = storage
            .get(second.block_root(), 2)
            .expect("warmed storage serves previously saved sidecars");

        assert_eq!(read_back, second);
    }

    #[test]
    fn warmup_accepts_the_highest_valid_index() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let base = directory.path().join("blobs");
        let root_dir = base
            .join(by_epoch_dir())
            .join("0")
            .join(ident::root_to_string(H256::zero()));

        fs::create_dir_all(&root_dir).expect("creating fixture directories succeeds");
        fs::write(root_dir.join("5.ssz"), b"derp").expect("writing a fixture file succeeds");

        let storage = BlobStorage::<Mainnet>::new(&config(&directory, LayoutName::ByEpoch))
            .expect("a tree with in-bounds indices warms successfully");

        assert!(storage.summary(H256::zero()).has_index(5));
    }

    #[test]
    fn warmup_rejects_out_of_bounds_indices() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let base = directory.path().join("blobs");
        let root_dir = base
            .join(by_epoch_dir())
            .join("0")
            .join(ident::root_to_string(H256::zero()));

        fs::create_dir_all(&root_dir).expect("creating fixture directories succeeds");
        fs::write(root_dir.join("6.ssz"), b"derp").expect("writing a fixture file succeeds");

        let error = BlobStorage::<Mainnet>::new(&config(&directory, LayoutName::ByEpoch))
            .expect_err("an out-of-bounds index on disk fails warmup");

        assert!(matches!(
            error.downcast_ref::<Error>(),
            Some(Error::CacheWarmFailed),
        ));
        assert!(error
            .chain()
            .any(|cause| matches!(
                cause.downcast_ref::<IndexOutOfBounds>(),
                Some(IndexOutOfBounds { index: 6, bound: 6 }),
            )));
    }

    #[test]
    fn warmup_sweeps_stale_part_files() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let blob_sidecar = test_sidecar(0, 1, 0);
        let root = blob_sidecar.block_root();

        let (ssz_path, part_path) = {
            let storage = build_storage(&directory, LayoutName::Flat);

            storage.save(&blob_sidecar).expect("saving succeeds");

            let ident = storage
                .layout
                .ident(root, 0)
                .expect("the ident of a saved sidecar is recoverable");

            let part_path = storage.layout.part_path(ident, "deadbeefdeadbeef");

            fs::write(&part_path, b"interrupted").expect("writing a fixture file succeeds");

            (storage.layout.ssz_path(ident), part_path)
        };

        let storage = build_storage(&directory, LayoutName::Flat);

        assert!(ssz_path.exists());
        assert!(!part_path.exists());
        assert!(storage.summary(root).has_index(0));
    }

    #[test]
    fn save_rejects_out_of_bounds_indices() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let storage = build_storage(&directory, LayoutName::Flat);
        let blob_sidecar = test_sidecar(0, 1, 6);

        let error = storage
            .save(&blob_sidecar)
            .expect_err("index 6 is out of bounds for mainnet");

        assert!(matches!(
            error.downcast_ref::<IndexOutOfBounds>(),
            Some(IndexOutOfBounds { index: 6, bound: 6 }),
        ));
    }

    #[test]
    fn construction_validates_the_configuration() {
        assert!(matches!(
            BlobStorage::<Mainnet>::new(&BlobStorageConfig::default())
                .expect_err("an empty base path is rejected")
                .downcast_ref::<Error>(),
            Some(Error::NoBasePath),
        ));

        let directory = TempDir::new().expect("creating a temporary directory succeeds");

        let bad_layout = BlobStorageConfig {
            layout_name: "bad".to_owned(),
            ..config(&directory, LayoutName::Flat)
        };

        assert!(matches!(
            BlobStorage::<Mainnet>::new(&bad_layout)
                .expect_err("an unknown layout name is rejected")
                .downcast_ref::<Error>(),
            Some(Error::InvalidLayoutName { .. }),
        ));

        let low_retention = BlobStorageConfig {
            retention_epochs: 16,
            ..config(&directory, LayoutName::Flat)
        };

        assert!(matches!(
            BlobStorage::<Mainnet>::new(&low_retention)
                .expect_err("retention below the protocol minimum is rejected")
                .downcast_ref::<Error>(),
            Some(Error::InvalidBlobRetentionEpochs {
                requested: 16,
                minimum: MIN_EPOCHS_FOR_BLOB_SIDECARS_REQUESTS,
            }),
        ));

        build_storage(&directory, LayoutName::Flat);
    }

    #[test_case(0, 0 => true; "fresh chain")]
    #[test_case(0, 16 => true; "boundary")]
    #[test_case(0, 17 => false; "just past the boundary")]
    #[test_case(15, 16 => true; "one less")]
    fn within_retention_period_matches_the_window(requested: Epoch, current: Epoch) -> bool {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let mut storage = build_storage(&directory, LayoutName::Flat);

        storage.retention_epochs = 16;
        storage.within_retention_period(requested, current)
    }

    #[test]
    fn unbounded_retention_never_expires() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let mut storage = build_storage(&directory, LayoutName::Flat);

        storage.retention_epochs = u64::MAX;

        assert!(storage.within_retention_period(1, 1));
        assert!(storage.within_retention_period(0, u64::MAX));
        assert!(storage.within_retention_period(u64::MAX, u64::MAX));
    }

    #[test_case(LayoutName::Flat, LayoutName::ByEpoch)]
    #[test_case(LayoutName::ByEpoch, LayoutName::Flat)]
    fn migration_preserves_every_sidecar(from: LayoutName, to: LayoutName) {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");

        let sidecars = [
            test_sidecar(0, 1, 0),
            test_sidecar(0, 1, 2),
            test_sidecar(160, 2, 1),
        ];

        {
            let storage = build_storage(&directory, from);

            for blob_sidecar in &sidecars {
                storage.save(blob_sidecar).expect("saving succeeds");
            }
        }

        let storage = build_storage(&directory, to);

        for blob_sidecar in &sidecars {
            let read_back = storage
                .get(blob_sidecar.block_root(), blob_sidecar.index)
                .expect("every sidecar survives the migration");

            assert_eq!(&read_back, blob_sidecar);
        }

        let by_epoch_base = storage.base.join(by_epoch_dir());

        match to {
            LayoutName::Flat => {
                // The drained by-epoch tree is reaped bottom-up.
                assert!(!by_epoch_base.exists());
            }
            LayoutName::ByEpoch => {
                let stray_root_dirs = fs::read_dir(&storage.base)
                    .expect("the base directory is listable")
                    .flatten()
                    .filter(|entry| entry.file_name() != by_epoch_dir())
                    .count();

                assert_eq!(stray_root_dirs, 0);
            }
        }
    }

    #[test]
    fn pruning_removes_whole_roots_below_the_threshold() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let storage = build_storage(&directory, LayoutName::ByEpoch);

        // Epoch 0.
        let old_first = test_sidecar(0, 1, 0);
        let old_second = test_sidecar(0, 1, 1);
        // Epoch 5.
        let recent = test_sidecar(160, 2, 0);

        for blob_sidecar in [&old_first, &old_second, &recent] {
            storage.save(blob_sidecar).expect("saving succeeds");
        }

        let summaries = storage.prune_before(1).expect("pruning succeeds");

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[&0].blobs_pruned, 2);
        assert!(summaries[&0].failed_removals.is_empty());

        assert!(is_not_found(
            &storage
                .get(old_first.block_root(), 0)
                .expect_err("pruned sidecars are gone"),
        ));
        assert!(storage.summary(old_first.block_root()).is_empty());

        let read_back = storage
            .get(recent.block_root(), 0)
            .expect("sidecars at or above the threshold survive");

        assert_eq!(read_back, recent);
    }

    #[test]
    fn pruning_below_epoch_zero_is_a_no_op() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let storage = build_storage(&directory, LayoutName::ByEpoch);
        let blob_sidecar = test_sidecar(0, 1, 0);

        storage.save(&blob_sidecar).expect("saving succeeds");

        let summaries = storage.prune_before(0).expect("pruning succeeds");

        assert!(summaries.is_empty());
        storage
            .get(blob_sidecar.block_root(), 0)
            .expect("nothing was pruned");
    }

    #[test]
    fn prune_expired_applies_the_retention_window() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");
        let storage = build_storage(&directory, LayoutName::ByEpoch);

        let old = test_sidecar(0, 1, 0);
        let recent = test_sidecar(160, 2, 0);

        for blob_sidecar in [&old, &recent] {
            storage.save(blob_sidecar).expect("saving succeeds");
        }

        // With the default retention of 4096 epochs, epoch 0 expires at
        // current epoch 4101 while epoch 5 is exactly at the boundary.
        let summaries = storage.prune_expired(4101).expect("pruning succeeds");

        assert_eq!(summaries[&0].blobs_pruned, 1);
        assert!(is_not_found(
            &storage
                .get(old.block_root(), 0)
                .expect_err("expired sidecars are gone"),
        ));
        storage
            .get(recent.block_root(), 0)
            .expect("sidecars within retention survive");
    }

    #[test]
    fn flat_layout_prunes_by_directory_mtime() {
        let directory = TempDir::new().expect("creating a temporary directory succeeds");

        // Anchor genesis at the test's start so directories written now fall
        // into epoch 0.
        let genesis_config = BlobStorageConfig {
            genesis_time: unix_now(),
            ..config(&directory, LayoutName::Flat)
        };

        let storage =
            BlobStorage::<Mainnet>::new(&genesis_config).expect("creating blob storage succeeds");
        let blob_sidecar = test_sidecar(0, 1, 0);

        storage.save(&blob_sidecar).expect("saving succeeds");

        let summaries = storage.prune_before(1).expect("pruning succeeds");

        assert_eq!(
            summaries.values().map(|summary| summary.blobs_pruned).sum::<usize>(),
            1,
        );
        assert!(is_not_found(
            &storage
                .get(blob_sidecar.block_root(), 0)
                .expect_err("pruned sidecars are gone"),
        ));
    }

    fn by_epoch_dir() -> &'static str {
        "by-epoch"
    }
}
