//! The four attributes of a SET card
//!
//! Every attribute has exactly three values. Tokens are the lowercase words
//! used in reference file names (`purple-triple-solid-capsule.jpg`).

pub mod label;

pub use label::{AttributeLabel, LabelError, PartialLabel};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Common behaviour of the four three-valued card attributes
pub trait Attribute: Copy + Eq + fmt::Debug + 'static {
    /// Attribute name as used in prompts and reports
    const NAME: &'static str;
    /// All values, in canonical order
    const ALL: [Self; 3];

    /// Lowercase file-name token
    fn token(self) -> &'static str;

    /// Parse a file-name token (case-insensitive)
    fn from_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|value| value.token().eq_ignore_ascii_case(token))
    }

    /// Position of this value in `ALL`
    fn ordinal(self) -> usize {
        Self::ALL
            .iter()
            .position(|value| *value == self)
            .unwrap_or_default()
    }
}

macro_rules! attribute_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal, [$($variant:ident => $token:literal),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl Attribute for $name {
            const NAME: &'static str = $label;
            const ALL: [Self; 3] = [$(Self::$variant),+];

            fn token(self) -> &'static str {
                match self {
                    $(Self::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.token())
            }
        }

        impl std::str::FromStr for $name {
            type Err = LabelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as Attribute>::from_token(s).ok_or_else(|| LabelError::UnknownToken {
                    attribute: $label,
                    token: s.to_string(),
                })
            }
        }
    };
}

attribute_enum!(
    /// Ink color of the symbols
    Color, "color", [Red => "red", Green => "green", Purple => "purple"]
);

attribute_enum!(
    /// Number of symbols on the card
    Count, "count", [Single => "single", Double => "double", Triple => "triple"]
);

attribute_enum!(
    /// Fill of the symbols
    Shade, "shade", [Solid => "solid", Stripes => "stripes", Outline => "outline"]
);

attribute_enum!(
    /// Outline of the symbols
    Shape, "shape", [Diamond => "diamond", Squiggle => "squiggle", Capsule => "capsule"]
);

impl Count {
    /// Map a number of detected symbols to a count, `None` outside 1..=3
    pub fn from_symbols(n: usize) -> Option<Self> {
        match n {
            1 => Some(Count::Single),
            2 => Some(Count::Double),
            3 => Some(Count::Triple),
            _ => None,
        }
    }

    /// Number of symbols this count stands for
    pub fn symbols(self) -> usize {
        self.ordinal() + 1
    }
}
