//! Per-attribute card classification
//!
//! Each classifier answers one attribute or gives up with `None`; the
//! combined result is a [`PartialLabel`] that the assembler completes.

pub mod color;
pub mod count;
pub mod shape;

pub use color::ColorClassifier;
pub use count::classify_count;
pub use shape::{FeatureExtractor, ShapeClassifier, ShapeMatch};

use crate::card::CardImage;
use crate::detection::config::{ClassifierConfig, SymbolConfig};
use crate::library::ReferenceLibrary;
use crate::symbols::SymbolSegmenter;
use crate::Result;
use setfinder_core::PartialLabel;
use std::sync::Arc;

/// Everything the classifiers found out about one card
#[derive(Debug, Clone)]
pub struct CardClassification {
    pub label: PartialLabel,
    /// Number of symbols the segmenter cut out
    pub symbols: usize,
}

/// Runs symbol extraction and all attribute classifiers on a card
pub struct CardClassifier {
    library: Arc<ReferenceLibrary>,
    segmenter: SymbolSegmenter,
    extractor: FeatureExtractor,
    config: ClassifierConfig,
}

impl CardClassifier {
    pub fn new(
        library: Arc<ReferenceLibrary>,
        symbol_config: SymbolConfig,
        config: ClassifierConfig,
    ) -> Self {
        Self {
            library,
            segmenter: SymbolSegmenter::new(symbol_config),
            extractor: FeatureExtractor::new(config.clone()),
            config,
        }
    }

    pub fn classify(&self, card: &CardImage) -> Result<CardClassification> {
        let symbols = self.segmenter.extract(card.as_mat())?;
        let mut label = PartialLabel {
            count: classify_count(symbols.len()),
            ..PartialLabel::default()
        };

        label.color = ColorClassifier::new(self.library.centroids(), &self.config)
            .classify(card.as_mat())?;

        if self.library.is_empty() {
            tracing::debug!("No reference symbols, shade and shape left open");
        } else {
            let shapes = ShapeClassifier::new(&self.library, &self.extractor, &self.config);
            match shapes.best_match(&symbols)? {
                None => tracing::debug!("No reference symbol matched"),
                Some(found) => {
                    if let Some((shade, shape)) = shapes.accept(&found) {
                        label.shade = Some(shade);
                        label.shape = Some(shape);
                    }
                }
            }
        }

        let missing = label.missing();
        if !missing.is_empty() {
            tracing::debug!("Card left with unresolved {:?}", missing);
        }

        Ok(CardClassification {
            label,
            symbols: symbols.len(),
        })
    }
}
