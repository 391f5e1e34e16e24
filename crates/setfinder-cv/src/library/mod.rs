//! Reference data for classification
//!
//! Built once before detection starts and only read afterwards; share it
//! between detectors and threads through an `Arc`.

pub mod loader;

pub use loader::ReferenceLoader;

use crate::classify::shape::FeatureExtractor;
use crate::detection::DetectionConfig;
use crate::error::SetFinderError;
use crate::Result;
use opencv::core::Mat;
use opencv::prelude::*;
use serde::{Deserialize, Serialize};
use setfinder_core::{AttributeLabel, Color};

/// Average ink colour of each card colour, RGB
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorCentroids {
    pub red: [u8; 3],
    pub green: [u8; 3],
    pub purple: [u8; 3],
}

impl Default for ColorCentroids {
    fn default() -> Self {
        Self {
            red: [226, 34, 0],
            green: [0, 123, 64],
            purple: [76, 0, 89],
        }
    }
}

impl ColorCentroids {
    pub fn get(&self, color: Color) -> [u8; 3] {
        match color {
            Color::Red => self.red,
            Color::Green => self.green,
            Color::Purple => self.purple,
        }
    }

    /// Closest colour by Manhattan distance, with that distance
    pub fn nearest(&self, rgb: [f64; 3]) -> (Color, f64) {
        [Color::Red, Color::Green, Color::Purple]
            .into_iter()
            .map(|color| {
                let centroid = self.get(color);
                let distance: f64 = (0..3)
                    .map(|c| (rgb[c] - f64::from(centroid[c])).abs())
                    .sum();
                (color, distance)
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((Color::Red, f64::INFINITY))
    }
}

/// One labelled symbol exemplar with its precomputed descriptors
#[derive(Debug, Clone)]
pub struct ReferenceEntry {
    pub label: AttributeLabel,
    pub descriptors: Mat,
}

impl ReferenceEntry {
    /// Describe `symbol` once; the image itself is not kept
    pub fn new(label: AttributeLabel, symbol: &Mat, extractor: &FeatureExtractor) -> Result<Self> {
        Ok(Self {
            label,
            descriptors: extractor.describe(symbol)?,
        })
    }

    /// Number of descriptors available for matching
    pub fn feature_count(&self) -> i32 {
        self.descriptors.rows()
    }
}

/// Symbol exemplars plus colour centroids
#[derive(Debug, Clone)]
pub struct ReferenceLibrary {
    entries: Vec<ReferenceEntry>,
    centroids: ColorCentroids,
}

impl ReferenceLibrary {
    /// Assemble a library from already prepared parts
    pub fn from_parts(entries: Vec<ReferenceEntry>, centroids: ColorCentroids) -> Self {
        Self { entries, centroids }
    }

    /// Load every exemplar from `config.reference_dir`
    ///
    /// Fails when the directory is missing or holds no usable images;
    /// detection cannot run without references.
    pub fn load(config: &DetectionConfig) -> Result<Self> {
        let dir = &config.reference_dir;
        if !dir.is_dir() {
            return Err(SetFinderError::ReferenceLibraryUnavailable {
                path: dir.clone(),
                reason: "not a directory".to_string(),
            }
            .into());
        }

        let extractor = FeatureExtractor::new(config.classifier.clone());
        let entries = ReferenceLoader::new(config.symbols.clone())
            .add_reference_dir(dir)
            .load_all(&extractor)?;

        if entries.is_empty() {
            return Err(SetFinderError::ReferenceLibraryUnavailable {
                path: dir.clone(),
                reason: "no reference images".to_string(),
            }
            .into());
        }

        tracing::info!("Loaded {} reference symbols from {:?}", entries.len(), dir);
        Ok(Self::from_parts(entries, config.centroids))
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn centroids(&self) -> &ColorCentroids {
        &self.centroids
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
