//! 2D schematic cross-section figures for building service shafts.
//!
//! Given a shaft's required plan area and the sizes of the MEP
//! sub-elements routed through it, this crate derives the shaft outline,
//! places each sub-element at its conventional position, and renders the
//! result as a PNG: grey shaft outline, colour-coded sub-elements, axis
//! frame with tick labels, and a legend listing what was actually drawn.

pub mod figure;
pub mod font;
pub mod geometry;
pub mod layout;

pub use figure::render_cross_section;
pub use geometry::{Rect, ShaftDims};
pub use layout::{place, ElementSizes, Hatch, PlacedElement, SubElement};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("invalid shaft dimensions: area={area}, aspect ratio={aspect_ratio}")]
    InvalidDimensions { area: f64, aspect_ratio: f64 },
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}
