//! Full pipeline from a game photo to labelled cards and sets

use super::config::DetectionConfig;
use crate::assembler::{Assembled, LabelAssembler};
use crate::card::{Card, CardExtractor, LabeledCard};
use crate::classify::{CardClassification, CardClassifier};
use crate::library::ReferenceLibrary;
use crate::segment::RegionSegmenter;
use crate::traits::ManualLabeler;
use crate::utils::ImageUtils;
use crate::Result;
use anyhow::Context;
use opencv::core::Mat;
use serde::{Deserialize, Serialize};
use setfinder_core::{find_sets, AttributeLabel, Point, SetTriple};
use std::path::Path;
use std::sync::Arc;

/// Labelled cards of one photo
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// Cards in detection order; rejected regions are left out
    pub cards: Vec<LabeledCard>,
    /// Detection indices of regions the labeler rejected as not a card
    pub rejected: Vec<usize>,
    /// Detection indices of inconclusive cards the labeler did not label
    pub unresolved: Vec<usize>,
    pub stats: DetectionStats,
}

/// Detection statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionStats {
    pub candidates: usize,
    pub automatic: usize,
    pub manual: usize,
    pub rejected: usize,
    pub unresolved: usize,
    pub processing_time_ms: u64,
}

impl DetectionResult {
    /// Every valid set, in lexicographic order of card positions
    pub fn sets(&self) -> Vec<SetTriple<'_, LabeledCard>> {
        find_sets(&self.cards)
    }

    /// Serializable summary keyed by detection index
    pub fn report(&self) -> GameReport {
        let cards = self
            .cards
            .iter()
            .map(|card| CardReport {
                index: card.index(),
                label: card.label,
                name: card.label.to_string(),
                corners: *card.corners().points(),
            })
            .collect();

        let sets = self
            .sets()
            .iter()
            .map(|set| set.cards.map(|card| card.index()))
            .collect();

        GameReport {
            cards,
            sets,
            rejected: self.rejected.clone(),
            unresolved: self.unresolved.clone(),
            stats: self.stats.clone(),
        }
    }
}

/// One card in a [`GameReport`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardReport {
    pub index: usize,
    pub label: AttributeLabel,
    /// `color-count-shade-shape`
    pub name: String,
    /// Rectified corners in photo coordinates
    pub corners: [Point; 4],
}

/// JSON export of a detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReport {
    pub cards: Vec<CardReport>,
    /// Sets as triples of detection indices
    pub sets: Vec<[usize; 3]>,
    /// Regions that are not cards
    pub rejected: Vec<usize>,
    /// Cards whose label could not be determined
    pub unresolved: Vec<usize>,
    pub stats: DetectionStats,
}

impl GameReport {
    pub fn export_json(&self, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize detection results")?;

        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write JSON to: {:?}", output_path))?;

        Ok(())
    }
}

/// Finds, classifies and labels the cards of a SET game photo
pub struct SetDetector {
    config: DetectionConfig,
    segmenter: RegionSegmenter,
    extractor: CardExtractor,
    classifier: CardClassifier,
}

impl SetDetector {
    /// Detector sharing an already loaded library
    pub fn new(config: DetectionConfig, library: Arc<ReferenceLibrary>) -> Self {
        tracing::debug!("Detector using {} reference symbols", library.len());
        Self {
            segmenter: RegionSegmenter::new(config.segmentation.clone()),
            extractor: CardExtractor::new(config.card_size),
            classifier: CardClassifier::new(
                library,
                config.symbols.clone(),
                config.classifier.clone(),
            ),
            config,
        }
    }

    /// Load the reference library named by the config, then build the detector
    pub fn from_config(config: DetectionConfig) -> Result<Self> {
        let library = ReferenceLibrary::load(&config)?;
        Ok(Self::new(config, Arc::new(library)))
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn classifier(&self) -> &CardClassifier {
        &self.classifier
    }

    /// Detect from an image file
    pub fn detect_from_file<P: AsRef<Path>>(
        &self,
        image_path: P,
        labeler: &mut dyn ManualLabeler,
    ) -> Result<DetectionResult> {
        let image = ImageUtils::load_color(&image_path)
            .with_context(|| format!("Failed to load image: {:?}", image_path.as_ref()))?;
        self.detect(&image, labeler)
    }

    /// Detect from a decoded RGB image
    pub fn detect_from_rgb_image(
        &self,
        rgb_image: &image::RgbImage,
        labeler: &mut dyn ManualLabeler,
    ) -> Result<DetectionResult> {
        let image = ImageUtils::rgb_to_mat(rgb_image)?;
        self.detect(&image, labeler)
    }

    /// Rectified cards in detection order
    pub fn find_cards(&self, image: &Mat) -> Result<Vec<Card>> {
        let quads = self.segmenter.find_quads(image)?;
        if quads.is_empty() {
            tracing::info!("No card regions detected");
        }
        self.extractor.extract(image, &quads)
    }

    /// Core detection from a BGR Mat
    ///
    /// Automatic classification may run in parallel; the labeler is asked
    /// afterwards, one card at a time in detection order.
    pub fn detect(&self, image: &Mat, labeler: &mut dyn ManualLabeler) -> Result<DetectionResult> {
        let start_time = std::time::Instant::now();

        let cards = self.find_cards(image)?;
        let classifications = self.classify_cards(&cards)?;

        let mut stats = DetectionStats {
            candidates: cards.len(),
            ..DetectionStats::default()
        };
        let mut labeled = Vec::with_capacity(cards.len());
        let mut rejected = Vec::new();
        let mut unresolved = Vec::new();

        for (card, classification) in cards.into_iter().zip(classifications) {
            match LabelAssembler::assemble(card, classification.label, labeler)? {
                Assembled::Automatic(card) => {
                    stats.automatic += 1;
                    labeled.push(card);
                }
                Assembled::Manual(card) => {
                    stats.manual += 1;
                    labeled.push(card);
                }
                Assembled::NotACard(index) => rejected.push(index),
                Assembled::Unresolved(index) => unresolved.push(index),
            }
        }

        stats.rejected = rejected.len();
        stats.unresolved = unresolved.len();
        stats.processing_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            "{} cards labelled ({} automatic, {} manual), {} rejected, {} unresolved",
            labeled.len(),
            stats.automatic,
            stats.manual,
            stats.rejected,
            stats.unresolved
        );

        Ok(DetectionResult {
            cards: labeled,
            rejected,
            unresolved,
            stats,
        })
    }

    /// Automatic classification of every card, results in card order
    pub fn classify_cards(&self, cards: &[Card]) -> Result<Vec<CardClassification>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            cards
                .par_iter()
                .map(|card| self.classifier.classify(&card.image))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            cards
                .iter()
                .map(|card| self.classifier.classify(&card.image))
                .collect()
        }
    }
}
