//! SET card game core
//!
//! Card attributes, corner geometry and the set solver. Nothing in here
//! touches pixels; the computer vision side lives in `setfinder-cv`.

pub mod attributes;
pub mod geometry;
pub mod solver;

pub use attributes::{AttributeLabel, Color, Count, LabelError, PartialLabel, Shade, Shape};
pub use geometry::{GeometryError, Orientation, Point, Quad};
pub use solver::{Labeled, SetTriple, find_sets, is_valid_set};
