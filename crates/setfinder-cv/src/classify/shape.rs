//! Shape and shade by binary feature matching against reference symbols

use crate::detection::config::ClassifierConfig;
use crate::library::ReferenceLibrary;
use crate::utils::ImageUtils;
use crate::Result;
use anyhow::Context;
use opencv::{
    core::{self, DMatch, KeyPoint, Mat, Vector},
    features2d::{BFMatcher, ORB, ORB_ScoreType},
    prelude::*,
};
use setfinder_core::{Shade, Shape};

/// Bits in one ORB descriptor
const DESCRIPTOR_BITS: f64 = 256.0;

/// Computes rotation-invariant ORB descriptors for symbol images
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: ClassifierConfig,
}

impl FeatureExtractor {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// One descriptor row per keypoint; zero rows when nothing was found
    pub fn describe(&self, symbol: &Mat) -> Result<Mat> {
        let gray = ImageUtils::to_grayscale(symbol)?;

        // keypoints closer than the patch size to the border are discarded
        let border = self.config.feature_border.max(0);
        let mut padded = Mat::default();
        core::copy_make_border(
            &gray,
            &mut padded,
            border,
            border,
            border,
            border,
            core::BORDER_REPLICATE,
            core::Scalar::default(),
        )
        .context("Border padding failed")?;

        let mut orb = ORB::create(
            self.config.orb_features,
            1.2,
            8,
            self.config.orb_patch_size,
            0,
            2,
            ORB_ScoreType::HARRIS_SCORE,
            self.config.orb_patch_size,
            self.config.orb_fast_threshold,
        )
        .context("Failed to create ORB detector")?;

        let mut keypoints = Vector::<KeyPoint>::new();
        let mut descriptors = Mat::default();
        orb.detect_and_compute(
            &padded,
            &core::no_array(),
            &mut keypoints,
            &mut descriptors,
            false,
        )
        .context("ORB feature extraction failed")?;

        Ok(descriptors)
    }
}

/// Cross-checked Hamming match distances, ascending
pub fn match_distances(query: &Mat, train: &Mat) -> Result<Vec<f32>> {
    if query.rows() == 0 || train.rows() == 0 {
        return Ok(Vec::new());
    }

    let matcher = BFMatcher::new(core::NORM_HAMMING, true)?;
    let mut matches = Vector::<DMatch>::new();
    matcher
        .train_match(query, train, &mut matches, &core::no_array())
        .context("Descriptor matching failed")?;

    let mut distances: Vec<f32> = matches.iter().map(|m| m.distance).collect();
    distances.sort_by(|a, b| a.total_cmp(b));
    Ok(distances)
}

/// Best reference for one card
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeMatch {
    /// Index into the library entries
    pub reference: usize,
    /// Index of the card symbol that produced the match
    pub symbol: usize,
    /// Sum of the `top_k` smallest distances
    pub score: f64,
    /// Number of distances that went into the score
    pub matches: usize,
}

impl ShapeMatch {
    /// Mean distance as a fraction of the descriptor length
    pub fn normalized(&self) -> f64 {
        if self.matches == 0 {
            return 1.0;
        }
        self.score / self.matches as f64 / DESCRIPTOR_BITS
    }

    /// Lower score wins; on equal scores the match backed by more features wins
    fn beats(&self, other: &ShapeMatch) -> bool {
        self.score < other.score || (self.score == other.score && self.matches > other.matches)
    }
}

/// Picks shade and shape from the closest reference symbol
pub struct ShapeClassifier<'a> {
    library: &'a ReferenceLibrary,
    extractor: &'a FeatureExtractor,
    config: &'a ClassifierConfig,
}

impl<'a> ShapeClassifier<'a> {
    pub fn new(
        library: &'a ReferenceLibrary,
        extractor: &'a FeatureExtractor,
        config: &'a ClassifierConfig,
    ) -> Self {
        Self {
            library,
            extractor,
            config,
        }
    }

    /// Globally best (symbol, reference) pair, or `None` when nothing matched at all
    pub fn best_match(&self, symbols: &[Mat]) -> Result<Option<ShapeMatch>> {
        let mut best: Option<ShapeMatch> = None;

        for (symbol_index, symbol) in symbols.iter().enumerate() {
            let descriptors = self.extractor.describe(symbol)?;

            for (reference, entry) in self.library.entries().iter().enumerate() {
                let distances = match_distances(&descriptors, &entry.descriptors)?;
                if distances.is_empty() {
                    continue;
                }

                let top: Vec<f32> = distances.into_iter().take(self.config.top_k).collect();
                let candidate = ShapeMatch {
                    reference,
                    symbol: symbol_index,
                    score: top.iter().map(|d| f64::from(*d)).sum(),
                    matches: top.len(),
                };

                if best.as_ref().is_none_or(|b| candidate.beats(b)) {
                    best = Some(candidate);
                }
            }
        }

        Ok(best)
    }

    /// Shade and shape of `best` unless it is above the confidence cutoff
    pub fn accept(&self, best: &ShapeMatch) -> Option<(Shade, Shape)> {
        if best.normalized() > self.config.max_match_score {
            tracing::debug!(
                "Best shape match {:.3} above cutoff {:.3}",
                best.normalized(),
                self.config.max_match_score
            );
            return None;
        }

        let label = self.library.entries().get(best.reference)?.label;
        Some((label.shade, label.shape))
    }
}
