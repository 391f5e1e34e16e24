//! Synthetic images for unit tests

use crate::classify::FeatureExtractor;
use crate::detection::config::{ClassifierConfig, SymbolConfig};
use crate::library::{ColorCentroids, ReferenceEntry, ReferenceLibrary};
use crate::symbols::SymbolSegmenter;
use crate::Result;
use opencv::{
    core::{Mat, Point, Rect, Scalar, Vec3b, VecN, Vector, CV_8UC3},
    imgproc::{self, LINE_8},
    prelude::*,
};
use setfinder_core::{AttributeLabel, Color, Shade, Shape};

pub const WHITE: Scalar = VecN([255.0, 255.0, 255.0, 0.0]);
pub const BLACK: Scalar = VecN([0.0, 0.0, 0.0, 0.0]);

/// Smooth colour gradient, every pixel different from its neighbours
pub fn gradient_image(width: i32, height: i32) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(height, width, CV_8UC3, BLACK)?;
    for y in 0..height {
        for x in 0..width {
            *mat.at_2d_mut::<Vec3b>(y, x)? =
                VecN([(x * 4 % 256) as u8, (y * 6 % 256) as u8, ((x + y) % 256) as u8]);
        }
    }
    Ok(mat)
}

pub fn filled(width: i32, height: i32, color: Scalar) -> Result<Mat> {
    Ok(Mat::new_rows_cols_with_default(height, width, CV_8UC3, color)?)
}

/// Ink colour in BGR, close to printed SET cards
pub fn ink(color: Color) -> Scalar {
    match color {
        Color::Red => VecN([0.0, 34.0, 226.0, 0.0]),
        Color::Green => VecN([64.0, 123.0, 0.0, 0.0]),
        Color::Purple => VecN([89.0, 0.0, 76.0, 0.0]),
    }
}

/// Draw one symbol centred at `center` inside a `w × h` box
pub fn draw_symbol(
    image: &mut Mat,
    center: Point,
    w: i32,
    h: i32,
    shape: Shape,
    shade: Shade,
    color: Scalar,
) -> Result<()> {
    let outline: Vector<Point> = match shape {
        Shape::Diamond => vec![
            Point::new(center.x, center.y - h / 2),
            Point::new(center.x + w / 2, center.y),
            Point::new(center.x, center.y + h / 2),
            Point::new(center.x - w / 2, center.y),
        ],
        Shape::Capsule => {
            let r = w / 2;
            let mut pts = Vec::new();
            for step in 0..=12 {
                let a = std::f64::consts::PI * f64::from(step) / 12.0;
                pts.push(Point::new(
                    center.x + (f64::from(r) * a.cos()) as i32,
                    center.y - h / 2 + r - (f64::from(r) * a.sin()) as i32,
                ));
            }
            for step in 0..=12 {
                let a = std::f64::consts::PI + std::f64::consts::PI * f64::from(step) / 12.0;
                pts.push(Point::new(
                    center.x + (f64::from(r) * a.cos()) as i32,
                    center.y + h / 2 - r - (f64::from(r) * a.sin()) as i32,
                ));
            }
            pts
        }
        Shape::Squiggle => vec![
            Point::new(center.x - w / 2, center.y - h / 2),
            Point::new(center.x + w / 4, center.y - h / 2),
            Point::new(center.x + w / 2, center.y - h / 4),
            Point::new(center.x + w / 4, center.y + h / 8),
            Point::new(center.x + w / 2, center.y + h / 2),
            Point::new(center.x - w / 4, center.y + h / 2),
            Point::new(center.x - w / 2, center.y + h / 4),
            Point::new(center.x - w / 4, center.y - h / 8),
        ],
    }
    .into_iter()
    .collect();

    let mut polys = Vector::<Vector<Point>>::new();
    polys.push(outline);

    match shade {
        Shade::Solid => {
            imgproc::fill_poly(image, &polys, color, LINE_8, 0, Point::new(0, 0))?;
        }
        Shade::Outline => {
            imgproc::polylines(image, &polys, true, color, 4, LINE_8, 0)?;
        }
        Shade::Stripes => {
            imgproc::polylines(image, &polys, true, color, 4, LINE_8, 0)?;
            let mut y = center.y - h / 4;
            while y < center.y + h / 4 {
                imgproc::line(
                    image,
                    Point::new(center.x - w / 4, y),
                    Point::new(center.x + w / 4, y),
                    color,
                    2,
                    LINE_8,
                    0,
                )?;
                y += 10;
            }
        }
    }
    Ok(())
}

/// A canonical 450x300 card image with `count` symbols
pub fn card_image(label: AttributeLabel) -> Result<Mat> {
    let mut card = filled(450, 300, WHITE)?;
    draw_card(&mut card, Rect::new(0, 0, 450, 300), label)?;
    Ok(card)
}

/// Paint a white card with its symbols into `rect`, symbols scaled to the card
pub fn draw_card(image: &mut Mat, rect: Rect, label: AttributeLabel) -> Result<()> {
    imgproc::rectangle(image, rect, WHITE, -1, LINE_8, 0)?;

    let scale = f64::from(rect.width) / 450.0;
    let px = |v: f64| (v * scale).round() as i32;
    let n = label.count.symbols() as i32;
    for i in 0..n {
        let offset = px(f64::from((2 * i - (n - 1)) * 55));
        let center = Point::new(rect.x + rect.width / 2 + offset, rect.y + rect.height / 2);
        draw_symbol(
            image,
            center,
            px(70.0),
            px(180.0),
            label.shape,
            label.shade,
            ink(label.color),
        )?;
    }
    Ok(())
}

/// Black table with `slots` card places on a 4-wide grid
pub fn table(slots: usize, card_w: i32) -> Result<(Mat, Vec<Rect>)> {
    let card_h = card_w * 2 / 3;
    let gap = card_w / 4;
    let cols = 4;
    let rows = (slots as i32 + cols - 1) / cols;
    let image = filled(
        gap + cols * (card_w + gap),
        gap + rows.max(1) * (card_h + gap),
        BLACK,
    )?;

    let rects = (0..slots as i32)
        .map(|i| {
            let (col, row) = (i % cols, i / cols);
            Rect::new(gap + col * (card_w + gap), gap + row * (card_h + gap), card_w, card_h)
        })
        .collect();
    Ok((image, rects))
}

/// Draw a filled white rectangle, used for plain card-like blobs
pub fn draw_blob(image: &mut Mat, rect: Rect) -> Result<()> {
    imgproc::rectangle(image, rect, WHITE, -1, LINE_8, 0)?;
    Ok(())
}

pub fn label(s: &str) -> AttributeLabel {
    s.parse().expect("test label")
}

/// Library whose exemplars are the first symbol of each synthetic card
pub fn synthetic_library(texts: &[&str]) -> Result<ReferenceLibrary> {
    let extractor = FeatureExtractor::new(ClassifierConfig::default());
    let segmenter = SymbolSegmenter::new(SymbolConfig::default());
    let entries = texts
        .iter()
        .map(|text| {
            let symbol = segmenter.extract(&card_image(label(text))?)?.remove(0);
            ReferenceEntry::new(label(text), &symbol, &extractor)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ReferenceLibrary::from_parts(entries, ColorCentroids::default()))
}
