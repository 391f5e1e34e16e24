//! Ink colour by two-cluster quantisation

use crate::detection::config::ClassifierConfig;
use crate::library::ColorCentroids;
use crate::utils::ImageUtils;
use crate::Result;
use anyhow::Context;
use opencv::{
    core::{self, Mat, Scalar, Size, TermCriteria, CV_32F},
    imgproc,
    prelude::*,
};
use setfinder_core::Color;

/// Classifies the ink colour of a card
///
/// Near-white pixels are forced to pure white, the image is quantised to a
/// two-entry palette and the darker entry is taken as ink. The ink colour
/// is averaged over the original pixels and mapped to the nearest centroid.
pub struct ColorClassifier<'a> {
    centroids: &'a ColorCentroids,
    config: &'a ClassifierConfig,
}

impl<'a> ColorClassifier<'a> {
    pub fn new(centroids: &'a ColorCentroids, config: &'a ClassifierConfig) -> Self {
        Self { centroids, config }
    }

    pub fn classify(&self, image: &Mat) -> Result<Option<Color>> {
        let Some(rgb) = self.ink_color(image)? else {
            return Ok(None);
        };
        let (color, distance) = self.centroids.nearest(rgb);
        tracing::debug!(
            "Ink [{:.0}, {:.0}, {:.0}] is {} at distance {:.0}",
            rgb[0],
            rgb[1],
            rgb[2],
            color,
            distance
        );
        Ok(Some(color))
    }

    /// Average ink colour in RGB, `None` when no ink could be separated from the paper
    pub fn ink_color(&self, image: &Mat) -> Result<Option<[f64; 3]>> {
        let sampled = self.sample(image)?;
        let (rows, n) = (sampled.rows(), sampled.rows() * sampled.cols());
        if n < 2 {
            return Ok(None);
        }

        let cutoff = f64::from(self.config.white_cutoff);
        let mut white = Mat::default();
        core::in_range(
            &sampled,
            &Scalar::all(cutoff),
            &Scalar::all(255.0),
            &mut white,
        )
        .context("White mask failed")?;

        let mut forced = sampled.clone();
        forced
            .set_to(&Scalar::all(255.0), &white)
            .context("Forcing paper to white failed")?;

        // one row per pixel, one f32 column per channel
        let mut data = Mat::default();
        forced
            .reshape(1, n)
            .context("Failed to flatten samples")?
            .convert_to(&mut data, CV_32F, 1.0, 0.0)
            .context("Sample conversion failed")?;

        let mut labels = Mat::default();
        let mut centers = Mat::default();
        let criteria =
            TermCriteria::new(core::TermCriteria_COUNT + core::TermCriteria_EPS, 20, 1.0)?;
        if let Err(err) = core::kmeans(
            &data,
            2,
            &mut labels,
            criteria,
            3,
            core::KMEANS_PP_CENTERS,
            &mut centers,
        ) {
            tracing::debug!("Colour quantisation failed: {}", err);
            return Ok(None);
        }

        let mut palette = [[0.0f64; 3]; 2];
        for (k, entry) in palette.iter_mut().enumerate() {
            for (channel, value) in entry.iter_mut().enumerate() {
                *value = f64::from(*centers.at_2d::<f32>(k as i32, channel as i32)?);
            }
        }

        let separation: f64 = (0..3).map(|c| (palette[0][c] - palette[1][c]).abs()).sum();
        if separation < self.config.min_palette_separation {
            tracing::debug!("Palette separation {:.0} too small, no ink", separation);
            return Ok(None);
        }

        let brightness = |entry: &[f64; 3]| entry.iter().sum::<f64>();
        let ink = if brightness(&palette[0]) < brightness(&palette[1]) {
            0.0
        } else {
            1.0
        };

        // ink-labelled pixels that were not forced to white
        let mut labelled_ink = Mat::default();
        core::in_range(
            &labels.reshape(1, rows).context("Failed to reshape labels")?,
            &Scalar::all(ink),
            &Scalar::all(ink),
            &mut labelled_ink,
        )
        .context("Ink mask failed")?;
        let mut paper = Mat::default();
        core::bitwise_not(&white, &mut paper, &core::no_array())?;
        let mut mask = Mat::default();
        core::bitwise_and(&labelled_ink, &paper, &mut mask, &core::no_array())?;

        if core::count_non_zero(&mask)? == 0 {
            return Ok(None);
        }

        // samples are BGR
        let mean = core::mean(&sampled, &mask).context("Ink averaging failed")?;
        Ok(Some([mean[2], mean[1], mean[0]]))
    }

    /// The image downsampled to at most `color_sample_width` columns
    fn sample(&self, image: &Mat) -> Result<Mat> {
        ImageUtils::ensure_bgr(image)?;
        let width = self.config.color_sample_width;
        if width <= 0 || image.cols() <= width {
            return Ok(image.clone());
        }

        let height =
            ((i64::from(image.rows()) * i64::from(width)) / i64::from(image.cols())).max(1) as i32;
        let mut resized = Mat::default();
        imgproc::resize(
            image,
            &mut resized,
            Size::new(width, height),
            0.0,
            0.0,
            imgproc::INTER_NEAREST,
        )
        .context("Colour sampling resize failed")?;
        Ok(resized)
    }
}
