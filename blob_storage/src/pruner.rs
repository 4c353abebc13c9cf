use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Result;
use log::error;
use types::{phase0::primitives::Epoch, preset::Preset};

use crate::{error::Error, ident::BlobIdent, layout::Layout};

#[derive(Debug, Default)]
pub struct PruneSummary {
    pub blobs_pruned: usize,
    pub failed_removals: Vec<PathBuf>,
}

/// Removes every root whose epoch falls strictly before the threshold.
///
/// The iterator yields all indices of a root adjacently, so a change of root
/// flushes the accumulated group as a single unit of removal work. Individual
/// removal failures are collected per epoch without aborting the sweep.
pub fn prune_before<P: Preset, L: Layout<P> + ?Sized>(
    before: Epoch,
    layout: &L,
) -> Result<BTreeMap<Epoch, PruneSummary>> {
    let mut summaries = BTreeMap::new();

    let iterator = layout
        .iter_idents(before)
        .map_err(|error| anyhow::Error::new(error).context(Error::PruneFailed))?;

    let mut last_ident = BlobIdent::default();

    for item in iterator {
        let ident = match item {
            Ok(ident) => ident,
            Err(error) if error.is_fatal() => {
                return Err(anyhow::Error::new(error).context(Error::PruneFailed));
            }
            Err(error) => {
                error!("failed to prune blob path: {error:#}");
                continue;
            }
        };

        if ident.epoch >= before {
            continue;
        }

        if last_ident.root != ident.root {
            prune_one(last_ident, layout, &mut summaries);
            last_ident = ident;
        }
    }

    // The final group has no root change to flush it.
    prune_one(last_ident, layout, &mut summaries);

    Ok(summaries)
}

fn prune_one<P: Preset, L: Layout<P> + ?Sized>(
    ident: BlobIdent,
    layout: &L,
    summaries: &mut BTreeMap<Epoch, PruneSummary>,
) {
    // The zero root is the initial group accumulator, not a real root.
    if ident.root.is_zero() {
        return;
    }

    let summary = summaries.entry(ident.epoch).or_default();

    match layout.remove(ident) {
        Ok(removed) => summary.blobs_pruned += removed,
        Err(error) => {
            summary.failed_removals.push(layout.dir(ident));

            error!(
                "failed to delete blob directory for block {:?}: {error:#}",
                ident.root,
            );
        }
    }
}
