//! Content-addressed filesystem storage for blob sidecars.
//!
//! This crate handles the following concerns:
//! - [Durable saves with atomic publication](`BlobStorage::save`).
//! - [Low-latency presence lookups](`SummaryCache`).
//! - [Pluggable on-disk layouts and one-shot migration between them](`Layout`).
//! - [Epoch-bounded retention pruning](`BlobStorage::prune_before`).

pub use crate::{
    cache::{BlobIndexMask, BlobSummary, IndexOutOfBounds, SummaryCache},
    error::{is_not_found, Error},
    ident::{BlobIdent, Error as IdentError},
    iteration::{IdentIterator, LayoutLayer, WalkError},
    layout::{Layout, LayoutName},
    misc::EpochClock,
    pruner::PruneSummary,
    storage::{BlobStorage, BlobStorageConfig},
};

mod by_epoch;
mod cache;
mod error;
mod flat;
mod ident;
mod iteration;
mod layout;
mod misc;
mod pruner;
mod storage;
