//! Draws detected cards and sets onto the game photo

use crate::detection::config::VisualizationConfig;
use crate::detection::DetectionResult;
use crate::geometry::quad_to_pixels;
use crate::utils::ImageUtils;
use crate::Result;
use anyhow::Context;
use opencv::{
    core::{Mat, Point, Scalar, VecN, Vector},
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
    prelude::*,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

const LABEL_COLOR: Scalar = VecN([255.0, 255.0, 0.0, 0.0]);

/// Outlines every set in its own colour
///
/// Colours are random but reproducible for a given seed. A card that is
/// part of several sets gets one outline per set, each slightly larger.
pub struct Annotator {
    config: VisualizationConfig,
    rng: StdRng,
}

impl Annotator {
    pub fn new(config: VisualizationConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// A saturated BGR colour: two channels in 100..=255, one zeroed so it is never near white
    pub fn next_color(&mut self) -> Scalar {
        let mut channels = [0.0f64; 3];
        for channel in channels.iter_mut() {
            *channel = f64::from(self.rng.gen_range(100u8..=255));
        }
        channels[self.rng.gen_range(0..3)] = 0.0;
        VecN([channels[0], channels[1], channels[2], 0.0])
    }

    /// Copy of `image` with sets and labels drawn on it
    pub fn annotate(&mut self, image: &Mat, result: &DetectionResult) -> Result<Mat> {
        let mut output = image.clone();
        let thickness = ((f64::from(image.rows()) * self.config.line_ratio).round() as i32).max(1);

        if self.config.draw_sets {
            let mut outlines = vec![0usize; result.cards.len()];
            for set in result.sets() {
                let color = self.next_color();
                for position in set.indices {
                    let grow = 1.0 + 0.04 * outlines[position] as f64;
                    outlines[position] += 1;

                    let corners = result.cards[position].corners().scale_from_center(grow, grow);
                    let mut polys = Vector::<Vector<Point>>::new();
                    polys.push(quad_to_pixels(&corners));
                    imgproc::polylines(&mut output, &polys, true, color, thickness, LINE_8, 0)
                        .context("Failed to draw set outline")?;
                }
            }
        }

        if self.config.draw_labels {
            for card in &result.cards {
                let centre = card.corners().centroid();
                imgproc::put_text(
                    &mut output,
                    &card.label.to_string(),
                    Point::new(centre.x as i32 - 60, centre.y as i32),
                    FONT_HERSHEY_SIMPLEX,
                    0.4,
                    LABEL_COLOR,
                    1,
                    LINE_8,
                    false,
                )
                .context("Failed to draw card label")?;
            }
        }

        Ok(output)
    }

    /// Annotate and write the image; the format follows the extension
    pub fn save<P: AsRef<Path>>(
        &mut self,
        image: &Mat,
        result: &DetectionResult,
        output_path: P,
    ) -> Result<()> {
        let output = self.annotate(image, result)?;
        ImageUtils::save_image(&output, &output_path)?;
        tracing::info!("Annotated image saved: {:?}", output_path.as_ref());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Card, CardImage, LabeledCard};
    use crate::detection::DetectionStats;
    use crate::test_utils::{filled, label, BLACK};
    use opencv::core::Vec3b;
    use setfinder_core::{Point as CorePoint, Quad};

    fn labeled(index: usize, x: f64, text: &str) -> Result<LabeledCard> {
        let corners = Quad::new([
            CorePoint::new(x, 100.0),
            CorePoint::new(x + 150.0, 100.0),
            CorePoint::new(x + 150.0, 200.0),
            CorePoint::new(x, 200.0),
        ]);
        Ok(LabeledCard::new(
            Card {
                index,
                image: CardImage::new(filled(450, 300, BLACK)?),
                corners,
            },
            label(text),
        ))
    }

    #[test]
    fn test_colors_are_never_near_white() {
        let mut annotator = Annotator::new(VisualizationConfig::default(), 7);
        for _ in 0..50 {
            let color = annotator.next_color();
            let channels = [color[0], color[1], color[2]];
            assert_eq!(channels.iter().filter(|c| **c == 0.0).count(), 1);
            assert!(channels.iter().all(|c| *c == 0.0 || (100.0..=255.0).contains(c)));
        }

        let mut again = Annotator::new(VisualizationConfig::default(), 7);
        let mut first = Annotator::new(VisualizationConfig::default(), 7);
        assert_eq!(again.next_color(), first.next_color());
    }

    #[test]
    fn test_only_set_cards_are_outlined() -> Result<()> {
        let result = DetectionResult {
            cards: vec![
                labeled(0, 20.0, "red-single-solid-diamond")?,
                labeled(1, 220.0, "green-double-solid-diamond")?,
                labeled(2, 420.0, "purple-triple-solid-diamond")?,
                labeled(3, 620.0, "red-single-outline-capsule")?,
            ],
            rejected: Vec::new(),
            unresolved: Vec::new(),
            stats: DetectionStats::default(),
        };

        let config = VisualizationConfig {
            draw_labels: false,
            ..VisualizationConfig::default()
        };
        let image = filled(800, 300, BLACK)?;
        let output = Annotator::new(config, 1).annotate(&image, &result)?;

        let lit = |x: i32, y: i32| -> Result<bool> {
            let px = output.at_2d::<Vec3b>(y, x)?;
            Ok(px[0] > 0 || px[1] > 0 || px[2] > 0)
        };
        // top edge midpoints of the three set cards, not of the fourth
        assert!(lit(95, 100)?);
        assert!(lit(295, 100)?);
        assert!(lit(495, 100)?);
        assert!(!lit(695, 100)?);
        Ok(())
    }
}
