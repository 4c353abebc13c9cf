use std::{
    ffi::OsStr,
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use types::{
    deneb::{containers::BlobSidecar, primitives::BlobIndex},
    phase0::primitives::{Epoch, H256},
    preset::Preset,
};

use crate::misc;

// A full root in a directory name is 66 characters, e.g.
// 0x0002fb4db510b8618b04dc82d023793739c26346a8b02eb73482e24b0fec0555
pub(crate) const ROOT_STRING_LEN: usize = 66;

pub(crate) const SSZ_EXT: &str = "ssz";
pub(crate) const PART_EXT: &str = "part";

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not parse string as a 32 byte root: {input}")]
    InvalidRootString { input: String },
    #[error("not a blob ssz file (want <index>.ssz): {file_name}")]
    NotBlobSsz { file_name: String },
    #[error("could not parse blob directory path: {path:?}")]
    InvalidDirectoryLayout { path: PathBuf },
    #[error("could not read modification time of {path:?}")]
    ModificationTime {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Names one blob sidecar artifact on disk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct BlobIdent {
    pub root: H256,
    pub epoch: Epoch,
    pub index: BlobIndex,
}

impl BlobIdent {
    #[must_use]
    pub const fn new(root: H256, epoch: Epoch, index: BlobIndex) -> Self {
        Self { root, epoch, index }
    }

    #[must_use]
    pub fn for_sidecar<P: Preset>(blob_sidecar: &BlobSidecar<P>) -> Self {
        Self::new(
            blob_sidecar.block_root(),
            misc::compute_epoch_at_slot::<P>(blob_sidecar.slot()),
            blob_sidecar.index,
        )
    }

    #[must_use]
    pub fn ssz_file_name(self) -> String {
        format!("{}.{SSZ_EXT}", self.index)
    }

    #[must_use]
    pub fn part_file_name(self, entropy: &str) -> String {
        format!("{entropy}-{}.{PART_EXT}", self.index)
    }
}

#[must_use]
pub fn root_to_string(root: H256) -> String {
    format!("0x{}", hex::encode(root))
}

pub fn string_to_root(string: &str) -> Result<H256, Error> {
    if string.len() != ROOT_STRING_LEN {
        return Err(Error::InvalidRootString {
            input: string.to_owned(),
        });
    }

    let digits = string.strip_prefix("0x").ok_or_else(|| Error::InvalidRootString {
        input: string.to_owned(),
    })?;

    let bytes = hex::decode(digits).map_err(|_| Error::InvalidRootString {
        input: string.to_owned(),
    })?;

    Ok(H256::from_slice(&bytes))
}

pub(crate) fn root_from_path(path: &Path) -> Result<H256, Error> {
    let subdir = path
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| Error::InvalidDirectoryLayout {
            path: path.to_owned(),
        })?;

    string_to_root(subdir)
}

pub(crate) fn index_from_path(path: &Path) -> Result<BlobIndex, Error> {
    let file_name = path
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(|| Error::NotBlobSsz {
            file_name: path.to_string_lossy().into_owned(),
        })?;

    file_name
        .strip_suffix(&format!(".{SSZ_EXT}"))
        .and_then(|index| index.parse().ok())
        .ok_or_else(|| Error::NotBlobSsz {
            file_name: file_name.to_owned(),
        })
}

#[must_use]
pub(crate) fn is_root_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.len() == ROOT_STRING_LEN && name.starts_with("0x"))
}

#[must_use]
pub(crate) fn is_ssz_file(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(SSZ_EXT))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT_STRING: &str = "0x0002fb4db510b8618b04dc82d023793739c26346a8b02eb73482e24b0fec0555";

    #[test]
    fn root_strings_round_trip() {
        let root = string_to_root(ROOT_STRING).expect("the example root string is valid");

        assert_eq!(root_to_string(root), ROOT_STRING);
    }

    #[test]
    fn short_root_strings_are_rejected() {
        assert!(matches!(
            string_to_root("0x0002"),
            Err(Error::InvalidRootString { .. }),
        ));
    }

    #[test]
    fn non_hex_root_strings_are_rejected() {
        let input = format!("0x{}", "z".repeat(64));

        assert!(matches!(
            string_to_root(&input),
            Err(Error::InvalidRootString { .. }),
        ));
    }

    #[test]
    fn unprefixed_root_strings_are_rejected() {
        let input = "00".repeat(33);

        assert!(matches!(
            string_to_root(&input),
            Err(Error::InvalidRootString { .. }),
        ));
    }

    #[test]
    fn indices_parse_from_leaf_file_names() {
        assert_eq!(
            index_from_path(Path::new("/blobs/0x00/3.ssz")).expect("3.ssz is a blob file name"),
            3,
        );
    }

    #[test]
    fn non_ssz_leaves_are_rejected() {
        for file_name in ["3.part", "3", "a.ssz", "3.2.ssz", "deadbeef-3.part"] {
            assert!(
                matches!(
                    index_from_path(Path::new(file_name)),
                    Err(Error::NotBlobSsz { .. }),
                ),
                "{file_name} should not parse as a blob leaf",
            );
        }
    }

    #[test]
    fn file_names_embed_the_index() {
        let ident = BlobIdent::new(H256::zero(), 0, 4);

        assert_eq!(ident.ssz_file_name(), "4.ssz");
        assert_eq!(ident.part_file_name("deadbeef01020304"), "deadbeef01020304-4.part");
    }

    #[test]
    fn root_dir_names_are_recognized() {
        assert!(is_root_dir(Path::new(ROOT_STRING)));
        assert!(!is_root_dir(Path::new("by-epoch")));
        assert!(!is_root_dir(Path::new("0x00")));
    }
}
