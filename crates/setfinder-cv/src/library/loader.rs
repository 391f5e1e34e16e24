//! Reference image loading

use super::ReferenceEntry;
use crate::classify::shape::FeatureExtractor;
use crate::detection::config::SymbolConfig;
use crate::error::SetFinderError;
use crate::symbols::SymbolSegmenter;
use crate::utils::image::ImageUtils;
use crate::Result;
use anyhow::Context;
use opencv::prelude::*;
use setfinder_core::AttributeLabel;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads `<color>-<count>-<shade>-<shape>.jpg` exemplars from directories
///
/// Portrait images are taken as single symbols. Landscape images are whole
/// labelled cards; their largest symbol becomes the exemplar.
pub struct ReferenceLoader {
    reference_dirs: Vec<PathBuf>,
    supported_extensions: Vec<String>,
    symbols: SymbolSegmenter,
}

impl ReferenceLoader {
    pub fn new(symbol_config: SymbolConfig) -> Self {
        Self {
            reference_dirs: Vec::new(),
            supported_extensions: vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
            symbols: SymbolSegmenter::new(symbol_config),
        }
    }

    /// Add reference directory
    pub fn add_reference_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.reference_dirs.push(dir.as_ref().to_path_buf());
        self
    }

    /// Reference image paths in file-name order
    ///
    /// Images whose names are not labels are skipped with a warning.
    pub fn reference_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();

        for dir in &self.reference_dirs {
            if !dir.exists() {
                tracing::warn!("Reference directory {:?} does not exist", dir);
                continue;
            }

            let entries = fs::read_dir(dir)
                .with_context(|| format!("Failed to read directory: {:?}", dir))?;

            for entry in entries {
                let path = entry?.path();
                let supported = path
                    .extension()
                    .map(|ext| ext.to_string_lossy().to_lowercase())
                    .is_some_and(|ext| self.supported_extensions.contains(&ext));
                if !supported {
                    continue;
                }
                match Self::label_for(&path) {
                    Ok(_) => paths.push(path),
                    Err(err) => tracing::warn!("Skipping {:?}: {:#}", path, err),
                }
            }
        }

        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(paths)
    }

    /// Label encoded in a reference file name
    pub fn label_for(path: &Path) -> Result<AttributeLabel> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        stem.parse().map_err(|source| {
            SetFinderError::BadReferenceName {
                file: path.to_path_buf(),
                source,
            }
            .into()
        })
    }

    /// Load every reference image and precompute its descriptors
    pub fn load_all(&self, extractor: &FeatureExtractor) -> Result<Vec<ReferenceEntry>> {
        let mut entries = Vec::new();

        for path in self.reference_paths()? {
            let label = Self::label_for(&path)?;
            let image = ImageUtils::load_color(&path)?;

            let symbol = if image.cols() > image.rows() {
                match self.symbols.extract(&image)?.into_iter().next() {
                    Some(symbol) => symbol,
                    None => {
                        tracing::warn!("No symbol found on reference card {:?}, skipping", path);
                        continue;
                    }
                }
            } else {
                image
            };

            let entry = ReferenceEntry::new(label, &symbol, extractor)?;
            if entry.feature_count() == 0 {
                tracing::warn!("Reference {:?} has no features, it will never match", path);
            }
            entries.push(entry);
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::config::ClassifierConfig;
    use crate::test_utils::{card_image, label};

    fn scratch_dir(name: &str) -> Result<PathBuf> {
        let dir = std::env::temp_dir().join(format!("setfinder-{name}-{}", std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    #[test]
    fn test_label_for_file_name() -> Result<()> {
        let label = ReferenceLoader::label_for(Path::new("refs/red-single-stripes-squiggle.jpg"))?;
        assert_eq!(label.to_string(), "red-single-stripes-squiggle");

        let err = ReferenceLoader::label_for(Path::new("refs/red-squiggle.jpg")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SetFinderError>(),
            Some(SetFinderError::BadReferenceName { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_unlabelled_images_are_skipped() -> Result<()> {
        let dir = scratch_dir("stray")?;
        let card = card_image(label("purple-single-solid-squiggle"))?;
        ImageUtils::save_image(&card, dir.join("purple-single-solid-squiggle.jpg"))?;
        ImageUtils::save_image(&card, dir.join("pending-card.jpg"))?;
        ImageUtils::save_image(&card, dir.join("card03.jpg"))?;

        let paths = ReferenceLoader::new(SymbolConfig::default())
            .add_reference_dir(&dir)
            .reference_paths()?;
        fs::remove_dir_all(&dir)?;

        assert_eq!(paths.len(), 1);
        assert_eq!(
            ReferenceLoader::label_for(&paths[0])?.to_string(),
            "purple-single-solid-squiggle"
        );
        Ok(())
    }

    #[test]
    fn test_load_cards_and_symbols() -> Result<()> {
        let dir = scratch_dir("loader")?;
        let card = card_image(label("green-double-solid-diamond"))?;
        ImageUtils::save_image(&card, dir.join("green-double-solid-diamond.png"))?;

        let symbol = SymbolSegmenter::new(SymbolConfig::default())
            .extract(&card_image(label("red-single-outline-capsule"))?)?
            .remove(0);
        ImageUtils::save_image(&symbol, dir.join("red-single-outline-capsule.png"))?;
        fs::write(dir.join("notes.txt"), "ignored")?;
        ImageUtils::save_image(&card, dir.join("pending-card.jpg"))?;

        let extractor = FeatureExtractor::new(ClassifierConfig::default());
        let entries = ReferenceLoader::new(SymbolConfig::default())
            .add_reference_dir(&dir)
            .load_all(&extractor)?;
        fs::remove_dir_all(&dir)?;

        let labels: Vec<String> = entries.iter().map(|e| e.label.to_string()).collect();
        assert_eq!(
            labels,
            vec!["green-double-solid-diamond", "red-single-outline-capsule"]
        );
        assert!(entries.iter().all(|entry| entry.feature_count() > 0));
        Ok(())
    }
}
