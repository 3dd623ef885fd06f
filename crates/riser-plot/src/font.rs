//! Locating a TTF for figure text.
//!
//! Fonts are not bundled. A deployment can point `RISER_FONT` at any
//! TrueType file; otherwise a handful of well-known system locations are
//! probed. When nothing usable is found, figures render without text.

use std::{env, fs, path::PathBuf};

use once_cell::sync::Lazy;
use rusttype::Font;

/// Environment override for the label font path.
pub const FONT_ENV: &str = "RISER_FONT";

const CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
];

static FONT: Lazy<Option<Font<'static>>> = Lazy::new(load);

/// The process-wide label font, if one could be found.
pub fn label_font() -> Option<&'static Font<'static>> {
    FONT.as_ref()
}

fn load() -> Option<Font<'static>> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(path) = env::var(FONT_ENV) {
        candidates.push(PathBuf::from(path));
    }
    candidates.extend(CANDIDATES.iter().copied().map(PathBuf::from));

    for path in candidates {
        if let Ok(bytes) = fs::read(&path) {
            if let Some(font) = Font::try_from_vec(bytes) {
                tracing::debug!(path = %path.display(), "loaded label font");
                return Some(font);
            }
            tracing::warn!(path = %path.display(), "font file exists but could not be parsed");
        }
    }
    tracing::warn!("no usable TTF found; figure text will be omitted");
    None
}
