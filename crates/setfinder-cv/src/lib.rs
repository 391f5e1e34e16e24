//! SET card computer vision
//!
//! Finds cards in a photo, cuts out their symbols and labels them against a
//! reference library, on top of OpenCV.

pub mod annotate;
pub mod assembler;
pub mod card;
pub mod classify;
pub mod detection;
pub mod error;
pub mod geometry;
pub mod library;
pub mod segment;
pub mod symbols;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types
pub use annotate::Annotator;
pub use assembler::{
    Assembled, DeferringLabeler, LabelAssembler, ManualLabel, RejectingLabeler, ScriptedLabeler,
};
pub use card::{Card, CardExtractor, CardImage, LabeledCard};
pub use classify::{CardClassification, CardClassifier};
pub use detection::{DetectionConfig, DetectionResult, GameReport, SetDetector};
pub use error::SetFinderError;
pub use library::{ColorCentroids, ReferenceLibrary, ReferenceLoader};
pub use segment::RegionSegmenter;
pub use symbols::SymbolSegmenter;

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Core traits for the CV system
pub mod traits {
    use super::*;

    /// Source of labels when automatic classification is not sure
    ///
    /// Called synchronously, once per unresolved card, in detection order.
    /// Implementations may block for as long as they like.
    pub trait ManualLabeler {
        fn request_label(&mut self, card: &Card) -> Result<ManualLabel>;
    }

    impl<F> ManualLabeler for F
    where
        F: FnMut(&Card) -> Result<ManualLabel>,
    {
        fn request_label(&mut self, card: &Card) -> Result<ManualLabel> {
            self(card)
        }
    }
}
