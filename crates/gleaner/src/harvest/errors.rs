use thiserror::Error;

use crate::platform::{PlatformError, short_error_message};
use crate::repository::StoreError;

/// Errors that abort the collection of one repository.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error(transparent)]
    Api(#[from] PlatformError),
}

/// Errors of a harvesting run that are not confined to one repository.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Collection failed: {0}")]
    Collect(#[from] CollectError),

    #[error("Remote call failed: {0}")]
    Api(#[from] PlatformError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl HarvestError {
    /// One-line message for progress output.
    pub fn short_message(&self) -> String {
        match self {
            HarvestError::Collect(CollectError::Api(e)) | HarvestError::Api(e) => {
                short_error_message(e)
            }
            HarvestError::Store(e) => short_error_message(e),
        }
    }
}
