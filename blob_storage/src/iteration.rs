use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::ident::{self, BlobIdent};

#[derive(Debug, Error)]
pub enum WalkError {
    /// A single path could not be identified. Callers are expected to log
    /// these and continue; all sub-paths of the offending entry are skipped.
    #[error("failed to determine blob metadata at {path:?} (partial ident: {ident:?})")]
    Identification {
        path: PathBuf,
        ident: BlobIdent,
        #[source]
        source: ident::Error,
    },
    /// A directory listing failed. These end the walk.
    #[error("failed to list blob directory {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WalkError {
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

type Filter = Box<dyn Fn(&Path) -> bool>;
type Populator = Box<dyn Fn(BlobIdent, &Path) -> Result<BlobIdent, ident::Error>>;

/// One layer of a nested directory scheme.
///
/// `filter` rejects entries whose names are not valid at this depth and
/// `populate` accumulates fields of the [`BlobIdent`] out of the entry name,
/// which keeps the traversal below independent of any particular disk layout.
pub struct LayoutLayer {
    filter: Filter,
    populate: Populator,
}

impl LayoutLayer {
    pub fn new(
        filter: impl Fn(&Path) -> bool + 'static,
        populate: impl Fn(BlobIdent, &Path) -> Result<BlobIdent, ident::Error> + 'static,
    ) -> Self {
        Self {
            filter: Box::new(filter),
            populate: Box::new(populate),
        }
    }
}

pub(crate) fn populate_root(mut ident: BlobIdent, path: &Path) -> Result<BlobIdent, ident::Error> {
    ident.root = ident::root_from_path(path)?;
    Ok(ident)
}

pub(crate) fn populate_index(mut ident: BlobIdent, path: &Path) -> Result<BlobIdent, ident::Error> {
    ident.index = ident::index_from_path(path)?;
    Ok(ident)
}

struct Frame {
    path: PathBuf,
    ident: BlobIdent,
    entries: Vec<OsString>,
    offset: usize,
    layer: usize,
}

/// Lazily yields a [`BlobIdent`] for every artifact in the tree.
///
/// The ident starts out empty at the relative root and accumulates field
/// values layer by layer; the fully populated ident is yielded at the leaf
/// layer. Idents sharing a block root are always yielded adjacently.
pub struct IdentIterator {
    layers: Vec<LayoutLayer>,
    stack: Vec<Frame>,
    done: bool,
}

impl IdentIterator {
    pub(crate) fn new(root: &Path, layers: Vec<LayoutLayer>) -> Result<Self, WalkError> {
        assert!(!layers.is_empty());

        let mut stack = vec![];

        // A tree that was never written to is a valid empty tree.
        if root.is_dir() {
            stack.push(Frame {
                path: root.to_owned(),
                ident: BlobIdent::default(),
                entries: list_dir(root)?,
                offset: 0,
                layer: 0,
            });
        }

        Ok(Self {
            layers,
            stack,
            done: false,
        })
    }
}

impl Iterator for IdentIterator {
    type Item = Result<BlobIdent, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let (path, ident_so_far, layer_index) = {
                let frame = self.stack.last_mut()?;

                if frame.offset >= frame.entries.len() {
                    self.stack.pop();
                    continue;
                }

                let path = frame.path.join(&frame.entries[frame.offset]);
                frame.offset += 1;

                (path, frame.ident, frame.layer)
            };

            let layer = &self.layers[layer_index];

            if !(layer.filter)(&path) {
                continue;
            }

            let ident = match (layer.populate)(ident_so_far, &path) {
                Ok(ident) => ident,
                Err(source) => {
                    return Some(Err(WalkError::Identification {
                        path,
                        ident: ident_so_far,
                        source,
                    }));
                }
            };

            if layer_index + 1 == self.layers.len() {
                return Some(Ok(ident));
            }

            let entries = match list_dir(&path) {
                Ok(entries) => entries,
                Err(error) => {
                    self.done = true;
                    return Some(Err(error));
                }
            };

            if entries.is_empty() {
                continue;
            }

            self.stack.push(Frame {
                path,
                ident,
                entries,
                offset: 0,
                layer: layer_index + 1,
            });
        }
    }
}

fn list_dir(path: &Path) -> Result<Vec<OsString>, WalkError> {
    let to_walk_error = |source| WalkError::Io {
        path: path.to_owned(),
        source,
    };

    let mut names = fs_err::read_dir(path)
        .map_err(to_walk_error)?
        .map(|entry| entry.map(|entry| entry.file_name()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_walk_error)?;

    names.sort_unstable();

    Ok(names)
}
