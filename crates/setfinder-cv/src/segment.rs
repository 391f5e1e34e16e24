//! Candidate card regions from a thresholded photo

use crate::detection::config::SegmentationConfig;
use crate::geometry::quad_from_contour;
use crate::utils::ImageUtils;
use crate::Result;
use anyhow::Context;
use opencv::{
    core::{self, Mat, Point, Size, Vector},
    imgproc,
    prelude::*,
};
use setfinder_core::Quad;

pub(crate) type Contour = Vector<Point>;

/// Grayscale, blur and binary threshold
pub(crate) fn binarize(image: &Mat, threshold: f64, blur_kernel: i32) -> Result<Mat> {
    let gray = ImageUtils::to_grayscale(image)?;

    let blurred = if blur_kernel > 1 {
        let mut blurred = Mat::default();
        imgproc::gaussian_blur(
            &gray,
            &mut blurred,
            Size::new(blur_kernel | 1, blur_kernel | 1),
            0.0,
            0.0,
            core::BORDER_DEFAULT,
        )
        .context("Gaussian blur failed")?;
        blurred
    } else {
        gray
    };

    let mut binary = Mat::default();
    imgproc::threshold(&blurred, &mut binary, threshold, 255.0, imgproc::THRESH_BINARY)
        .context("Threshold failed")?;
    Ok(binary)
}

/// Contours of a binary mask with their areas, largest first
pub(crate) fn contours_by_area(binary: &Mat, mode: i32) -> Result<Vec<(Contour, f64)>> {
    let mut contours = Vector::<Contour>::new();
    imgproc::find_contours(
        binary,
        &mut contours,
        mode,
        imgproc::CHAIN_APPROX_SIMPLE,
        Point::new(0, 0),
    )
    .context("findContours failed")?;

    let mut ranked = Vec::with_capacity(contours.len());
    for contour in contours {
        let area = imgproc::contour_area(&contour, false)?;
        ranked.push((contour, area));
    }
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    Ok(ranked)
}

/// Indices of the areas within `[median / tolerance, median * tolerance]`
///
/// `areas` is expected largest first; the median is the middle element of
/// that ordering.
pub fn filter_area_outliers(areas: &[f64], tolerance: f64) -> Vec<usize> {
    if areas.is_empty() {
        return Vec::new();
    }

    let mut sorted = areas.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let median = sorted[sorted.len() / 2];
    let (low, high) = (median / tolerance, median * tolerance);

    areas
        .iter()
        .enumerate()
        .filter(|(_, area)| (low..=high).contains(*area))
        .map(|(i, _)| i)
        .collect()
}

/// Finds card-shaped quadrilaterals in a photo
pub struct RegionSegmenter {
    config: SegmentationConfig,
}

impl RegionSegmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Raw, unordered-corner quads in descending area order
    ///
    /// An image with nothing that stands out from the background gives an
    /// empty vector.
    pub fn find_quads(&self, image: &Mat) -> Result<Vec<Quad>> {
        let binary = binarize(image, self.config.threshold, self.config.blur_kernel)?;

        let total = f64::from(binary.rows()) * f64::from(binary.cols());
        let foreground = f64::from(core::count_non_zero(&binary)?);
        if total == 0.0
            || foreground / total < self.config.min_foreground
            || foreground / total > 1.0 - self.config.min_foreground
        {
            tracing::debug!("Binary mask is near-uniform, no card regions");
            return Ok(Vec::new());
        }

        let mut ranked = contours_by_area(&binary, imgproc::RETR_TREE)?;
        ranked.truncate(self.config.max_candidates);

        let areas: Vec<f64> = ranked.iter().map(|(_, area)| *area).collect();
        let keep = filter_area_outliers(&areas, self.config.area_tolerance);
        tracing::debug!(
            "{} of {} largest contours within area tolerance",
            keep.len(),
            ranked.len()
        );

        let mut quads = Vec::with_capacity(keep.len());
        for index in keep {
            let (contour, area) = &ranked[index];
            let perimeter = imgproc::arc_length(contour, true)?;

            let mut approx = Contour::new();
            imgproc::approx_poly_dp(
                contour,
                &mut approx,
                self.config.approx_epsilon * perimeter,
                true,
            )?;

            match quad_from_contour(&approx) {
                Ok(quad) => quads.push(quad),
                Err(_) => tracing::debug!(
                    "Dropping contour with {} vertices (area {:.0})",
                    approx.len(),
                    area
                ),
            }
        }

        tracing::info!("{} card candidates", quads.len());
        Ok(quads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{draw_blob, filled, BLACK, WHITE};
    use opencv::core::Rect;

    #[test]
    fn test_outlier_filter_keeps_cluster() {
        let v = 20_000.0;
        let mut areas = vec![15.0 * v, 10.0 * v];
        areas.extend((0..12).map(|i| v * (0.9 + 0.02 * f64::from(i))));
        areas.push(0.05 * v);

        let keep = filter_area_outliers(&areas, 2.5);
        assert_eq!(keep, (2..14).collect::<Vec<_>>());
    }

    #[test]
    fn test_outlier_filter_small_outliers_only() {
        let v = 5_000.0;
        let mut areas: Vec<f64> = (0..12).map(|i| v * (1.1 - 0.01 * f64::from(i))).collect();
        areas.extend([0.1 * v, 0.08 * v, 0.01 * v]);

        let keep = filter_area_outliers(&areas, 2.0);
        assert_eq!(keep.len(), 12);
        assert!(keep.iter().all(|i| *i < 12));
        assert!(filter_area_outliers(&[], 2.0).is_empty());
    }

    #[test]
    fn test_uniform_images_have_no_regions() -> Result<()> {
        let segmenter = RegionSegmenter::new(SegmentationConfig::default());
        assert!(segmenter.find_quads(&filled(400, 300, BLACK)?)?.is_empty());
        assert!(segmenter.find_quads(&filled(400, 300, WHITE)?)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_finds_twelve_cards_and_drops_the_rest() -> Result<()> {
        let mut table = filled(1200, 900, BLACK)?;
        for i in 0..12 {
            let (col, row) = (i % 4, i / 4);
            draw_blob(&mut table, Rect::new(40 + col * 220, 40 + row * 160, 180, 120))?;
        }
        // a triangle of card size, a huge slab and a speck
        let triangle: Vector<Point> = vec![
            Point::new(940, 520),
            Point::new(1140, 520),
            Point::new(1040, 720),
        ]
        .into_iter()
        .collect();
        imgproc::fill_convex_poly(&mut table, &triangle, WHITE, imgproc::LINE_8, 0)?;
        draw_blob(&mut table, Rect::new(40, 540, 800, 340))?;
        draw_blob(&mut table, Rect::new(1150, 40, 6, 6))?;

        let segmenter = RegionSegmenter::new(SegmentationConfig::default());
        let quads = segmenter.find_quads(&table)?;

        assert_eq!(quads.len(), 12);
        for quad in &quads {
            let (w, h) = quad.bounding_size();
            assert!((w - 179.0).abs() <= 2.0, "width {w}");
            assert!((h - 119.0).abs() <= 2.0, "height {h}");
        }
        Ok(())
    }

    #[test]
    fn test_candidates_are_truncated() -> Result<()> {
        let mut table = filled(1200, 900, BLACK)?;
        for i in 0..16 {
            let (col, row) = (i % 4, i / 4);
            draw_blob(&mut table, Rect::new(40 + col * 280, 40 + row * 210, 180, 120))?;
        }

        let segmenter = RegionSegmenter::new(SegmentationConfig::default());
        assert_eq!(segmenter.find_quads(&table)?.len(), 15);
        Ok(())
    }
}
