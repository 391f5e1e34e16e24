//! Cards cut out of a game photo

use crate::geometry::warp_perspective;
use crate::Result;
use anyhow::Context;
use opencv::{
    core::{Mat, Size},
    imgproc,
    prelude::*,
};
use setfinder_core::{AttributeLabel, Labeled, Orientation, Quad};

/// A rectified card image at the canonical card size
#[derive(Debug, Clone)]
pub struct CardImage {
    mat: Mat,
}

impl CardImage {
    pub fn new(mat: Mat) -> Self {
        Self { mat }
    }

    /// A card image stretched to `size`, for card files of other sizes
    pub fn resized(image: &Mat, size: (i32, i32)) -> Result<Self> {
        let mut mat = Mat::default();
        imgproc::resize(
            image,
            &mut mat,
            Size::new(size.0, size.1),
            0.0,
            0.0,
            imgproc::INTER_AREA,
        )
        .context("Failed to resize card")?;
        Ok(Self { mat })
    }

    pub fn as_mat(&self) -> &Mat {
        &self.mat
    }

    pub fn size(&self) -> (i32, i32) {
        (self.mat.cols(), self.mat.rows())
    }
}

/// A detected card before labelling
///
/// `index` is the detection order and identifies the card; `corners` are
/// rectified and in the coordinates of the original photo.
#[derive(Debug, Clone)]
pub struct Card {
    pub index: usize,
    pub image: CardImage,
    pub corners: Quad,
}

/// A card with its resolved label
#[derive(Debug, Clone)]
pub struct LabeledCard {
    pub card: Card,
    pub label: AttributeLabel,
}

impl LabeledCard {
    pub fn new(card: Card, label: AttributeLabel) -> Self {
        Self { card, label }
    }

    pub fn index(&self) -> usize {
        self.card.index
    }

    pub fn corners(&self) -> &Quad {
        &self.card.corners
    }
}

impl Labeled for LabeledCard {
    fn label(&self) -> &AttributeLabel {
        &self.label
    }
}

/// Turns raw quads into rectified card images
pub struct CardExtractor {
    width: i32,
    height: i32,
}

impl CardExtractor {
    pub fn new(card_size: (i32, i32)) -> Self {
        Self {
            width: card_size.0,
            height: card_size.1,
        }
    }

    /// One card per quad, in the order the quads were found
    pub fn extract(&self, image: &Mat, quads: &[Quad]) -> Result<Vec<Card>> {
        quads
            .iter()
            .enumerate()
            .map(|(index, quad)| {
                let corners = quad.rectify(Orientation::Landscape);
                let warped = warp_perspective(image, &corners, self.width, self.height)?;
                Ok(Card {
                    index,
                    image: CardImage::new(warped),
                    corners,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{filled, BLACK, WHITE};
    use opencv::core::{Rect, Vec3b};
    use setfinder_core::Point;

    #[test]
    fn test_extract_rectifies_and_keeps_order() -> Result<()> {
        let mut table = filled(600, 400, BLACK)?;
        // portrait card with a red mark at its top-left corner
        imgproc::rectangle(&mut table, Rect::new(100, 50, 120, 180), WHITE, -1, imgproc::LINE_8, 0)?;
        imgproc::rectangle(
            &mut table,
            Rect::new(100, 50, 20, 20),
            opencv::core::Scalar::new(0.0, 0.0, 255.0, 0.0),
            -1,
            imgproc::LINE_8,
            0,
        )?;

        let portrait = Quad::new([
            Point::new(219.0, 229.0),
            Point::new(100.0, 50.0),
            Point::new(219.0, 50.0),
            Point::new(100.0, 229.0),
        ]);
        let landscape = Quad::new([
            Point::new(300.0, 300.0),
            Point::new(479.0, 300.0),
            Point::new(479.0, 379.0),
            Point::new(300.0, 379.0),
        ]);

        let cards = CardExtractor::new((450, 300)).extract(&table, &[portrait, landscape])?;
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].index, 0);
        assert_eq!(cards[1].index, 1);
        assert_eq!(cards[0].image.size(), (450, 300));

        // a portrait card is turned a quarter: its top-left mark lands top-right
        assert_eq!(cards[0].corners.points()[0], Point::new(100.0, 229.0));
        let mark = cards[0].image.as_mat().at_2d::<Vec3b>(10, 440)?;
        assert!(mark[2] > 200 && mark[1] < 50);
        Ok(())
    }

    #[test]
    fn test_resized_card_has_canonical_size() -> Result<()> {
        let card = CardImage::resized(&filled(900, 600, WHITE)?, (450, 300))?;
        assert_eq!(card.size(), (450, 300));
        Ok(())
    }
}
