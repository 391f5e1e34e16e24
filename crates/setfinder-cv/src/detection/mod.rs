//! High-level detection module

pub mod config;
pub mod detector;

pub use config::{
    ClassifierConfig, DetectionConfig, SegmentationConfig, SymbolConfig, VisualizationConfig,
};
pub use detector::{CardReport, DetectionResult, DetectionStats, GameReport, SetDetector};
