//! Fixed-position placement of MEP sub-elements inside a shaft outline.
//!
//! The two ventilation ducts sit in the bottom corners with their long
//! side horizontal; heating/cooling, electrical, and plumbing occupy the
//! top-left, top-center, and top-right as squares sized from their
//! reported areas. An element is placed only when both of its dimensions
//! are strictly positive.

use crate::geometry::{Rect, ShaftDims};

/// Inset of anchored sub-elements from the shaft edge, as a fraction of
/// the corresponding shaft side.
const CORNER_INSET: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubElement {
    VentilationSupply,
    VentilationReturn,
    HeatingCooling,
    Electrical,
    Plumbing,
}

impl SubElement {
    pub fn label(&self) -> &'static str {
        match self {
            SubElement::VentilationSupply => "V. Sup.",
            SubElement::VentilationReturn => "V. Ret.",
            SubElement::HeatingCooling => "H/C",
            SubElement::Electrical => "Elec.",
            SubElement::Plumbing => "Plum.",
        }
    }

    /// Fill colour, RGB.
    pub fn color(&self) -> [u8; 3] {
        match self {
            SubElement::VentilationSupply | SubElement::VentilationReturn => [0x17, 0xbe, 0xcf],
            SubElement::HeatingCooling => [0x94, 0x67, 0xbd],
            SubElement::Electrical => [0xff, 0x7f, 0x0e],
            SubElement::Plumbing => [0x8c, 0x56, 0x4b],
        }
    }

    /// Hatching distinguishes the two ventilation ducts, which share a
    /// colour.
    pub fn hatch(&self) -> Option<Hatch> {
        match self {
            SubElement::VentilationSupply => Some(Hatch::Forward),
            SubElement::VentilationReturn => Some(Hatch::Back),
            _ => None,
        }
    }
}

/// Hatch direction: `Forward` is `/`, `Back` is `\`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hatch {
    Forward,
    Back,
}

/// Reported sub-element sizes for one shaft. Duct dimensions in metres,
/// equipment footprints in square metres.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementSizes {
    pub supply_width: f64,
    pub supply_depth: f64,
    pub return_width: f64,
    pub return_depth: f64,
    pub heating_cooling_area: f64,
    pub electrical_area: f64,
    pub plumbing_area: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedElement {
    pub kind: SubElement,
    pub rect: Rect,
}

/// Place every sub-element with strictly positive dimensions at its fixed
/// position inside the shaft outline.
pub fn place(dims: ShaftDims, sizes: &ElementSizes) -> Vec<PlacedElement> {
    let w = dims.width;
    let d = dims.depth;
    let inset_x = CORNER_INSET * w;
    let inset_y = CORNER_INSET * d;
    let mut placed = Vec::new();

    if let Some((long, short)) = duct(sizes.supply_width, sizes.supply_depth) {
        placed.push(PlacedElement {
            kind: SubElement::VentilationSupply,
            rect: Rect::from_anchor(inset_x, inset_y, long, short),
        });
    }

    if let Some((long, short)) = duct(sizes.return_width, sizes.return_depth) {
        placed.push(PlacedElement {
            kind: SubElement::VentilationReturn,
            rect: Rect::from_anchor(w - inset_x, inset_y, -long, short),
        });
    }

    if let Some(side) = square(sizes.heating_cooling_area) {
        placed.push(PlacedElement {
            kind: SubElement::HeatingCooling,
            rect: Rect::from_anchor(inset_x, d - inset_y, side, -side),
        });
    }

    if let Some(side) = square(sizes.electrical_area) {
        placed.push(PlacedElement {
            kind: SubElement::Electrical,
            rect: Rect::from_anchor(0.5 * w - side / 2.0, d - inset_y - side, side, side),
        });
    }

    if let Some(side) = square(sizes.plumbing_area) {
        placed.push(PlacedElement {
            kind: SubElement::Plumbing,
            rect: Rect::from_anchor(w - inset_x, d - inset_y, -side, -side),
        });
    }

    placed
}

/// Ducts keep the long side horizontal. `None` unless both dimensions are
/// strictly positive.
fn duct(width: f64, depth: f64) -> Option<(f64, f64)> {
    (width > 0.0 && depth > 0.0).then(|| {
        if width > depth {
            (width, depth)
        } else {
            (depth, width)
        }
    })
}

/// Equipment footprints draw as squares of side `sqrt(area)`.
fn square(area: f64) -> Option<f64> {
    (area > 0.0).then(|| area.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> ShaftDims {
        // 2m x 1m shaft
        ShaftDims::from_area(2.0, 2.0).expect("valid dims")
    }

    #[test]
    fn zero_sized_elements_are_omitted() {
        assert!(place(dims(), &ElementSizes::default()).is_empty());

        let sizes = ElementSizes {
            supply_width: 0.4,
            supply_depth: 0.0,
            ..Default::default()
        };
        assert!(place(dims(), &sizes).is_empty());
    }

    #[test]
    fn supply_duct_sits_in_the_bottom_left_inset() {
        let d = dims();
        let sizes = ElementSizes {
            supply_width: 0.5,
            supply_depth: 0.3,
            ..Default::default()
        };
        let placed = place(d, &sizes);
        assert_eq!(placed.len(), 1);
        assert_eq!(placed[0].kind, SubElement::VentilationSupply);
        let rect = placed[0].rect;
        assert!((rect.x - 0.02 * d.width).abs() < 1e-12);
        assert!((rect.y - 0.02 * d.depth).abs() < 1e-12);
        assert_eq!((rect.width, rect.height), (0.5, 0.3));
    }

    #[test]
    fn ducts_are_rotated_so_the_long_side_is_horizontal() {
        let sizes = ElementSizes {
            supply_width: 0.3,
            supply_depth: 0.5,
            ..Default::default()
        };
        let placed = place(dims(), &sizes);
        assert_eq!((placed[0].rect.width, placed[0].rect.height), (0.5, 0.3));
    }

    #[test]
    fn return_duct_hangs_off_the_right_inset() {
        let d = dims();
        let sizes = ElementSizes {
            return_width: 0.4,
            return_depth: 0.2,
            ..Default::default()
        };
        let placed = place(d, &sizes);
        assert_eq!(placed[0].kind, SubElement::VentilationReturn);
        assert!((placed[0].rect.max_x() - 0.98 * d.width).abs() < 1e-12);
        assert!((placed[0].rect.y - 0.02 * d.depth).abs() < 1e-12);
    }

    #[test]
    fn electrical_square_is_centered_at_the_top() {
        let d = dims();
        let sizes = ElementSizes {
            electrical_area: 0.09,
            ..Default::default()
        };
        let placed = place(d, &sizes);
        let rect = placed[0].rect;
        assert!((rect.width - 0.3).abs() < 1e-12);
        assert!((rect.height - 0.3).abs() < 1e-12);
        assert!((rect.x + rect.width / 2.0 - 0.5 * d.width).abs() < 1e-12);
        assert!((rect.max_y() - 0.98 * d.depth).abs() < 1e-12);
    }

    #[test]
    fn plumbing_square_fills_the_top_right_corner() {
        let d = dims();
        let sizes = ElementSizes {
            plumbing_area: 0.04,
            ..Default::default()
        };
        let placed = place(d, &sizes);
        let rect = placed[0].rect;
        assert!((rect.max_x() - 0.98 * d.width).abs() < 1e-12);
        assert!((rect.max_y() - 0.98 * d.depth).abs() < 1e-12);
        assert_eq!((rect.width, rect.height), (0.2, 0.2));
    }

    #[test]
    fn every_element_places_when_all_sizes_are_positive() {
        let sizes = ElementSizes {
            supply_width: 0.4,
            supply_depth: 0.25,
            return_width: 0.3,
            return_depth: 0.5,
            heating_cooling_area: 0.25,
            electrical_area: 0.09,
            plumbing_area: 0.04,
        };
        let placed = place(dims(), &sizes);
        let kinds: Vec<SubElement> = placed.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SubElement::VentilationSupply,
                SubElement::VentilationReturn,
                SubElement::HeatingCooling,
                SubElement::Electrical,
                SubElement::Plumbing,
            ]
        );
    }
}
