use std::io;

use thiserror::Error;
use types::phase0::primitives::Epoch;

#[derive(Debug, Error)]
pub enum Error {
    #[error("blob storage base path is not configured")]
    NoBasePath,
    #[error("unknown blob storage layout name: {name}")]
    InvalidLayoutName { name: String },
    #[error("blob retention epochs {requested} is below the protocol minimum of {minimum}")]
    InvalidBlobRetentionEpochs { requested: Epoch, minimum: Epoch },
    #[error("failed to warm blob summary cache")]
    CacheWarmFailed,
    #[error("unable to migrate blob directory between old and new layouts")]
    MigrationFailure,
    #[error("layout not observed in the blob filesystem tree")]
    LayoutNotDetected,
    #[error("failed to prune expired blob sidecars")]
    PruneFailed,
}

pub(crate) fn not_found() -> anyhow::Error {
    anyhow::Error::new(io::Error::from(io::ErrorKind::NotFound))
}

/// Recognizes a missing blob uniformly, whether the miss was reported by the
/// summary cache or by the operating system.
#[must_use]
pub fn is_not_found(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|io_error| io_error.kind() == io::ErrorKind::NotFound)
    })
}
