//! Commands of the setfinder binary

use anyhow::Context;
use setfinder_core::{AttributeLabel, Count, PartialLabel};
use setfinder_cv::traits::ManualLabeler;
use setfinder_cv::utils::ImageUtils;
use setfinder_cv::{
    Annotator, Card, CardExtractor, CardImage, DetectionConfig, DetectionResult, ManualLabel,
    ReferenceLoader, RegionSegmenter, Result, SetDetector, SymbolSegmenter,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Detect, label and solve one game photo
pub fn solve(
    detector: &SetDetector,
    image_path: &Path,
    labeler: &mut dyn ManualLabeler,
) -> Result<DetectionResult> {
    let result = detector.detect_from_file(image_path, labeler)?;
    print_sets(&result);
    Ok(result)
}

pub fn print_sets(result: &DetectionResult) {
    let sets = result.sets();
    if sets.is_empty() {
        println!("\nNo sets found\n");
        return;
    }

    println!("\n{} sets found\n", sets.len());
    for (i, set) in sets.iter().enumerate() {
        println!("Set {}:", i + 1);
        for card in set.cards {
            println!("  {} (card {})", card.label, card.index());
        }
    }
}

/// Draw the sets of `result` onto the photo it came from
pub fn annotate(
    config: &DetectionConfig,
    image_path: &Path,
    result: &DetectionResult,
    output_path: &Path,
    seed: u64,
) -> Result<()> {
    let image = ImageUtils::load_color(image_path)?;
    Annotator::new(config.visualization.clone(), seed).save(&image, result, output_path)
}

/// Rectified cards of a photo; needs no reference library
fn cards_in(config: &DetectionConfig, image_path: &Path) -> Result<Vec<Card>> {
    let image = ImageUtils::load_color(image_path)?;
    let quads = RegionSegmenter::new(config.segmentation.clone()).find_quads(&image)?;
    CardExtractor::new(config.card_size).extract(&image, &quads)
}

/// Write every rectified card of a photo as `cardNN.jpg`; returns the paths
pub fn find_cards(config: &DetectionConfig, image_path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let cards = cards_in(config, image_path)?;
    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {:?}", out_dir))?;

    let mut written = Vec::new();
    for card in cards {
        let path = out_dir.join(format!("card{:02}.jpg", card.index));
        ImageUtils::save_image(card.image.as_mat(), &path)?;
        written.push(path);
    }
    tracing::info!("Wrote {} cards to {:?}", written.len(), out_dir);
    Ok(written)
}

/// Label every card of a photo by hand and save it as `<label>.jpg`
pub fn label_cards(
    config: &DetectionConfig,
    image_path: &Path,
    out_dir: &Path,
    labeler: &mut dyn ManualLabeler,
) -> Result<Vec<PathBuf>> {
    let cards = cards_in(config, image_path)?;
    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {:?}", out_dir))?;

    let mut written = Vec::new();
    for card in cards {
        match labeler.request_label(&card)? {
            ManualLabel::Label(label) => {
                let path = out_dir.join(label.file_name());
                if path.exists() {
                    tracing::warn!("Overwriting {:?}", path);
                }
                ImageUtils::save_image(card.image.as_mat(), &path)?;
                written.push(path);
            }
            ManualLabel::NotACard | ManualLabel::Unresolved => {
                tracing::info!("Skipping card {}", card.index);
            }
        }
    }
    Ok(written)
}

/// Turn labelled card images into single-symbol reference exemplars
///
/// The count token of the output name is always `single`.
pub fn extract_symbols(
    config: &DetectionConfig,
    card_paths: &[PathBuf],
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let segmenter = SymbolSegmenter::new(config.symbols.clone());
    fs::create_dir_all(out_dir).with_context(|| format!("Failed to create {:?}", out_dir))?;

    let mut written = Vec::new();
    for path in card_paths {
        let label = ReferenceLoader::label_for(path)?;
        let card = ImageUtils::load_color(path)?;

        let Some(symbol) = segmenter.extract(&card)?.into_iter().next() else {
            tracing::warn!("No symbol found on {:?}", path);
            continue;
        };

        let out = out_dir.join(label.with_count(Count::Single).file_name());
        ImageUtils::save_image(&symbol, &out)?;
        written.push(out);
    }
    Ok(written)
}

/// Automatic label of a single card image, resized to the card size first
pub fn classify_card(detector: &SetDetector, card_path: &Path) -> Result<PartialLabel> {
    let image = ImageUtils::load_color(card_path)?;
    let card = CardImage::resized(&image, detector.config().card_size)?;
    Ok(detector.classifier().classify(&card)?.label)
}

/// Per-attribute and full-card agreement between predictions and ground truth
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccuracyScore {
    pub total: usize,
    /// Correct color, count, shade and shape predictions
    pub attributes: [usize; 4],
    pub perfect: usize,
    /// Names of the files that were not classified perfectly
    pub incorrect: Vec<String>,
}

impl AccuracyScore {
    /// Score one card; unresolved attributes count as wrong
    pub fn add(&mut self, name: &str, predicted: &PartialLabel, expected: &AttributeLabel) {
        let hits = [
            predicted.color == Some(expected.color),
            predicted.count == Some(expected.count),
            predicted.shade == Some(expected.shade),
            predicted.shape == Some(expected.shape),
        ];
        for (score, hit) in self.attributes.iter_mut().zip(hits) {
            if hit {
                *score += 1;
            }
        }

        self.total += 1;
        if hits.iter().all(|hit| *hit) {
            self.perfect += 1;
        } else {
            self.incorrect.push(name.to_string());
        }
    }

    /// Fraction of all attribute predictions that were right
    pub fn overall(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.attributes.iter().sum::<usize>() as f64 / (4 * self.total) as f64
    }

    pub fn print(&self) {
        if !self.incorrect.is_empty() {
            println!("Incorrectly labelled:");
            for name in &self.incorrect {
                println!("  {}", name);
            }
        }
        for (name, score) in ["color", "count", "shade", "shape"].iter().zip(self.attributes) {
            println!("Score for {}: {} / {}", name, score, self.total);
        }
        println!("Overall accuracy: {:.1}%", self.overall() * 100.0);
        println!("Perfect (full card) classifications: {} / {}", self.perfect, self.total);
    }
}

/// Classify every labelled card image in `dir` and compare with its file name
pub fn accuracy(detector: &SetDetector, dir: &Path) -> Result<AccuracyScore> {
    let paths = ReferenceLoader::new(detector.config().symbols.clone())
        .add_reference_dir(dir)
        .reference_paths()?;

    let mut score = AccuracyScore::default();
    for path in paths {
        let expected = ReferenceLoader::label_for(&path)?;
        let predicted = classify_card(detector, &path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if predicted.resolve() != Some(expected) {
            tracing::info!("{}: got {:?}", name, predicted);
        }
        score.add(&name, &predicted, &expected);
    }
    Ok(score)
}
