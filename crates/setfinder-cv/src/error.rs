//! Typed errors for conditions callers may want to match on

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetFinderError {
    #[error("reference library unavailable at {path:?}: {reason}")]
    ReferenceLibraryUnavailable { path: PathBuf, reason: String },

    #[error("reference image {file:?} is not named color-count-shade-shape.jpg")]
    BadReferenceName {
        file: PathBuf,
        #[source]
        source: setfinder_core::LabelError,
    },

    #[error("image has {channels} channels, expected a 3-channel BGR image")]
    UnsupportedChannels { channels: i32 },
}
