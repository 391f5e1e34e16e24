//! Detection configuration

use crate::library::ColorCentroids;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub reference_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Canonical card size after rectification (landscape)
    pub card_size: (i32, i32),
    pub segmentation: SegmentationConfig,
    pub symbols: SymbolConfig,
    pub classifier: ClassifierConfig,
    pub centroids: ColorCentroids,
    pub visualization: VisualizationConfig,
}

/// Card region segmentation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Gray level separating card from table
    pub threshold: f64,
    /// Gaussian kernel size, 1 disables blurring
    pub blur_kernel: i32,
    pub max_candidates: usize,
    /// Allowed factor between a candidate's area and the median area
    pub area_tolerance: f64,
    /// Polygon approximation tolerance as a fraction of the perimeter
    pub approx_epsilon: f64,
    /// Foreground fraction below which (or above one minus which) the mask counts as uniform
    pub min_foreground: f64,
}

/// Symbol extraction inside a card
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolConfig {
    pub threshold: f64,
    pub blur_kernel: i32,
    pub max_symbols: usize,
    /// Outward scale applied to each symbol box before warping
    pub scale: (f64, f64),
    /// Output size of a symbol image (portrait)
    pub size: (i32, i32),
    /// Contours smaller than this fraction of the largest are specks, not symbols
    pub min_relative_area: f64,
}

/// Attribute classifier tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Number of best matches summed into a reference score
    pub top_k: usize,
    /// Mean match distance (0..1 of the descriptor bits) above which a shape match is rejected
    pub max_match_score: f64,
    pub orb_features: i32,
    pub orb_fast_threshold: i32,
    pub orb_patch_size: i32,
    /// Replicated border added around a symbol before feature detection
    pub feature_border: i32,
    /// Pixels with every channel at or above this are paper
    pub white_cutoff: u8,
    /// Minimum Manhattan distance between the two palette entries
    pub min_palette_separation: f64,
    /// Card width the color classifier downsamples to
    pub color_sample_width: i32,
}

/// Visualization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
    pub draw_labels: bool,
    pub draw_sets: bool,
    /// Line thickness as a fraction of image height
    pub line_ratio: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            reference_dir: "assets/references".into(),
            output_dir: "assets/outputs".into(),
            card_size: (450, 300),
            segmentation: SegmentationConfig::default(),
            symbols: SymbolConfig::default(),
            classifier: ClassifierConfig::default(),
            centroids: ColorCentroids::default(),
            visualization: VisualizationConfig::default(),
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            threshold: 180.0,
            blur_kernel: 3,
            max_candidates: 15,
            area_tolerance: 2.5,
            approx_epsilon: 0.1,
            min_foreground: 0.001,
        }
    }
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            threshold: 180.0,
            blur_kernel: 1,
            max_symbols: 3,
            scale: (1.15, 1.15),
            size: (100, 200),
            min_relative_area: 0.2,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            max_match_score: 0.3,
            orb_features: 500,
            orb_fast_threshold: 10,
            orb_patch_size: 15,
            feature_border: 32,
            white_cutoff: 200,
            min_palette_separation: 60.0,
            color_sample_width: 150,
        }
    }
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            draw_labels: true,
            draw_sets: true,
            line_ratio: 0.01,
        }
    }
}

impl DetectionConfig {
    /// Load a JSON configuration; missing fields take their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {:?}", path.as_ref()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {:?}", path.as_ref()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write config: {:?}", path.as_ref()))
    }

    /// Configuration with a different reference directory
    pub fn with_reference_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.reference_dir = dir.into();
        self
    }
}
