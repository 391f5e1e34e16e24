//! Full and partial card labels

use super::{Attribute, Color, Count, Shade, Shape};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing a label string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("expected 4 hyphen-separated tokens in '{label}', found {found}")]
    TokenCount { label: String, found: usize },
    #[error("unknown {attribute} '{token}'")]
    UnknownToken {
        attribute: &'static str,
        token: String,
    },
}

/// A fully resolved card label
///
/// String form is `color-count-shade-shape`, optionally followed by `.jpg`
/// when it names a reference image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeLabel {
    pub color: Color,
    pub count: Count,
    pub shade: Shade,
    pub shape: Shape,
}

impl AttributeLabel {
    pub fn new(color: Color, count: Count, shade: Shade, shape: Shape) -> Self {
        Self {
            color,
            count,
            shade,
            shape,
        }
    }

    /// Attribute ordinals in field order, used by the solver
    pub fn ordinals(&self) -> [usize; 4] {
        [
            self.color.ordinal(),
            self.count.ordinal(),
            self.shade.ordinal(),
            self.shape.ordinal(),
        ]
    }

    /// Reference image file name for this label
    pub fn file_name(&self) -> String {
        format!("{self}.jpg")
    }

    /// Same label with a different count
    pub fn with_count(self, count: Count) -> Self {
        Self { count, ..self }
    }

    /// All 81 labels, color-major
    pub fn all() -> impl Iterator<Item = AttributeLabel> {
        Color::ALL.into_iter().flat_map(|color| {
            Count::ALL.into_iter().flat_map(move |count| {
                Shade::ALL.into_iter().flat_map(move |shade| {
                    Shape::ALL
                        .into_iter()
                        .map(move |shape| AttributeLabel::new(color, count, shade, shape))
                })
            })
        })
    }
}

impl fmt::Display for AttributeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.color, self.count, self.shade, self.shape
        )
    }
}

impl FromStr for AttributeLabel {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stem = s.trim();
        let stem = stem
            .strip_suffix(".jpg")
            .or_else(|| stem.strip_suffix(".JPG"))
            .unwrap_or(stem);

        let tokens: Vec<&str> = stem.split('-').collect();
        if tokens.len() != 4 {
            return Err(LabelError::TokenCount {
                label: s.to_string(),
                found: tokens.len(),
            });
        }

        Ok(Self {
            color: tokens[0].parse()?,
            count: tokens[1].parse()?,
            shade: tokens[2].parse()?,
            shape: tokens[3].parse()?,
        })
    }
}

/// A label under construction; any field may still be unknown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialLabel {
    pub color: Option<Color>,
    pub count: Option<Count>,
    pub shade: Option<Shade>,
    pub shape: Option<Shape>,
}

impl PartialLabel {
    /// Complete label, or `None` while any field is unresolved
    pub fn resolve(&self) -> Option<AttributeLabel> {
        Some(AttributeLabel {
            color: self.color?,
            count: self.count?,
            shade: self.shade?,
            shape: self.shape?,
        })
    }

    /// Names of the attributes that are still missing
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.color.is_none() {
            missing.push(Color::NAME);
        }
        if self.count.is_none() {
            missing.push(Count::NAME);
        }
        if self.shade.is_none() {
            missing.push(Shade::NAME);
        }
        if self.shape.is_none() {
            missing.push(Shape::NAME);
        }
        missing
    }
}

impl From<AttributeLabel> for PartialLabel {
    fn from(label: AttributeLabel) -> Self {
        Self {
            color: Some(label.color),
            count: Some(label.count),
            shade: Some(label.shade),
            shape: Some(label.shape),
        }
    }
}
