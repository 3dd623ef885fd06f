//! Raster rendering of shaft cross-section figures.
//!
//! A figure is laid out like a conventional engineering plot: a framed
//! plot region with tick labels on both axes, a title, axis captions, and
//! a legend in the lower-right corner of the plot. The data-to-pixel
//! mapping uses one scale for both axes, so shapes keep their true aspect.

use std::path::{Path, PathBuf};

use image::{imageops, DynamicImage, Rgba, RgbaImage};
use rusttype::{point, Scale};

use crate::font;
use crate::geometry::{Rect, ShaftDims};
use crate::layout::{Hatch, PlacedElement};
use crate::PlotError;

/// Pixel width of the plot region; its height follows from the data
/// aspect so the mapping stays equal-scale.
const PLOT_WIDTH: u32 = 640;
const PAD_LEFT: i64 = 80;
const PAD_RIGHT: i64 = 30;
const PAD_TOP: i64 = 50;
const PAD_BOTTOM: i64 = 70;

const WHITE: [u8; 3] = [255, 255, 255];
const BLACK: [u8; 3] = [0, 0, 0];
const SHAFT_GREY: [u8; 3] = [128, 128, 128];

const ELEMENT_ALPHA: f32 = 0.5;
const HATCH_SPACING: i64 = 8;

const TITLE_PX: f32 = 17.0;
const LABEL_PX: f32 = 14.0;
const TICK_PX: f32 = 11.0;
const LEGEND_PX: f32 = 12.0;

const LEGEND_SWATCH: i64 = 12;
const LEGEND_ROW: i64 = 17;
const LEGEND_PAD: i64 = 6;

/// Render one shaft's cross-section and write
/// `{shaft_id}_cross_section.png` into `out_dir`.
pub fn render_cross_section(
    shaft_id: &str,
    dims: ShaftDims,
    elements: &[PlacedElement],
    out_dir: &Path,
) -> Result<PathBuf, PlotError> {
    std::fs::create_dir_all(out_dir)?;

    let figure = Figure::new(dims);
    let mut canvas = figure.blank();

    figure.draw_shaft(&mut canvas);
    for element in elements {
        figure.draw_element(&mut canvas, element);
    }
    figure.draw_frame(&mut canvas, shaft_id);
    figure.draw_legend(&mut canvas, elements);

    let path = out_dir.join(format!("{shaft_id}_cross_section.png"));
    DynamicImage::ImageRgba8(canvas).save(&path)?;
    tracing::debug!(path = %path.display(), "wrote cross-section figure");
    Ok(path)
}

struct Figure {
    dims: ShaftDims,
    /// Pixels per metre.
    scale: f64,
    x_min: f64,
    y_max: f64,
    plot_w: i64,
    plot_h: i64,
}

impl Figure {
    fn new(dims: ShaftDims) -> Self {
        let margin = dims.margin();
        let span_x = dims.width + 2.0 * margin;
        let span_y = dims.depth + 2.0 * margin;
        let scale = PLOT_WIDTH as f64 / span_x;
        let plot_h = ((span_y * scale).round() as i64).max(1);
        Self {
            dims,
            scale,
            x_min: -margin,
            y_max: dims.depth + margin,
            plot_w: PLOT_WIDTH as i64,
            plot_h,
        }
    }

    fn canvas_size(&self) -> (u32, u32) {
        (
            (PAD_LEFT + self.plot_w + PAD_RIGHT) as u32,
            (PAD_TOP + self.plot_h + PAD_BOTTOM) as u32,
        )
    }

    fn blank(&self) -> RgbaImage {
        let (w, h) = self.canvas_size();
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    /// Data coordinates (y up) to canvas pixels (y down).
    fn px(&self, x: f64, y: f64) -> (i64, i64) {
        let px = PAD_LEFT as f64 + (x - self.x_min) * self.scale;
        let py = PAD_TOP as f64 + (self.y_max - y) * self.scale;
        (px.round() as i64, py.round() as i64)
    }

    /// Pixel bounds of a data rect: (left, top, right, bottom).
    fn px_box(&self, rect: &Rect) -> (i64, i64, i64, i64) {
        let (left, bottom) = self.px(rect.x, rect.y);
        let (right, top) = self.px(rect.max_x(), rect.max_y());
        (left, top, right, bottom)
    }

    fn clip_to_plot(&self, left: i64, top: i64, right: i64, bottom: i64) -> (i64, i64, i64, i64) {
        (
            left.max(PAD_LEFT),
            top.max(PAD_TOP),
            right.min(PAD_LEFT + self.plot_w),
            bottom.min(PAD_TOP + self.plot_h),
        )
    }

    fn draw_shaft(&self, canvas: &mut RgbaImage) {
        let outline = Rect {
            x: 0.0,
            y: 0.0,
            width: self.dims.width,
            height: self.dims.depth,
        };
        let (l, t, r, b) = self.px_box(&outline);
        let (l, t, r, b) = self.clip_to_plot(l, t, r, b);
        fill_px(canvas, l, t, r, b, SHAFT_GREY, 1.0);
        stroke_px(canvas, l, t, r, b, BLACK, 2);
    }

    fn draw_element(&self, canvas: &mut RgbaImage, element: &PlacedElement) {
        let color = element.kind.color();
        let (l, t, r, b) = self.px_box(&element.rect);
        let (l, t, r, b) = self.clip_to_plot(l, t, r, b);
        fill_px(canvas, l, t, r, b, color, ELEMENT_ALPHA);
        if let Some(hatch) = element.kind.hatch() {
            hatch_px(canvas, l, t, r, b, color, hatch);
        }
        stroke_px(canvas, l, t, r, b, color, 1);
    }

    fn draw_frame(&self, canvas: &mut RgbaImage, shaft_id: &str) {
        let left = PAD_LEFT;
        let top = PAD_TOP;
        let right = PAD_LEFT + self.plot_w;
        let bottom = PAD_TOP + self.plot_h;
        stroke_px(canvas, left, top, right, bottom, BLACK, 1);

        // x ticks along the bottom edge
        let x_max = self.x_min + (self.dims.width + 2.0 * self.dims.margin());
        let x_step = tick_step(x_max - self.x_min);
        for tick in ticks(self.x_min, x_max) {
            let (tx, _) = self.px(tick, 0.0);
            fill_px(canvas, tx, bottom, tx + 1, bottom + 4, BLACK, 1.0);
            let label = tick_label(tick, x_step);
            let w = text_width(&label, TICK_PX);
            draw_text(canvas, &label, TICK_PX, tx - (w / 2.0) as i64, bottom + 6, BLACK);
        }

        // y ticks along the left edge
        let y_min = -self.dims.margin();
        let y_step = tick_step(self.y_max - y_min);
        for tick in ticks(y_min, self.y_max) {
            let (_, ty) = self.px(0.0, tick);
            fill_px(canvas, left - 4, ty, left, ty + 1, BLACK, 1.0);
            let label = tick_label(tick, y_step);
            let w = text_width(&label, TICK_PX) as i64;
            let h = line_height(TICK_PX) as i64;
            draw_text(canvas, &label, TICK_PX, left - 8 - w, ty - h / 2, BLACK);
        }

        let title = format!("Shaft cross-section {shaft_id}");
        let title_w = text_width(&title, TITLE_PX) as i64;
        let center_x = left + self.plot_w / 2;
        draw_text(canvas, &title, TITLE_PX, center_x - title_w / 2, 12, BLACK);

        let x_label = "Shaft width";
        let x_label_w = text_width(x_label, LABEL_PX) as i64;
        draw_text(
            canvas,
            x_label,
            LABEL_PX,
            center_x - x_label_w / 2,
            bottom + 6 + line_height(TICK_PX) as i64 + 10,
            BLACK,
        );

        if let Some(rotated) = rasterize_line("Shaft depth", LABEL_PX, BLACK)
            .map(|img| imageops::rotate270(&img))
        {
            let y = top + self.plot_h / 2 - rotated.height() as i64 / 2;
            overlay_alpha(canvas, &rotated, 8, y);
        }
    }

    fn draw_legend(&self, canvas: &mut RgbaImage, elements: &[PlacedElement]) {
        let mut entries: Vec<(&str, [u8; 3], f32)> = vec![("Shaft", SHAFT_GREY, 1.0)];
        entries.extend(
            elements
                .iter()
                .map(|e| (e.kind.label(), e.kind.color(), ELEMENT_ALPHA)),
        );

        let text_w = entries
            .iter()
            .map(|(label, _, _)| text_width(label, LEGEND_PX))
            .fold(0.0_f32, f32::max)
            .ceil() as i64;
        let width = LEGEND_PAD + LEGEND_SWATCH + 6 + text_w + LEGEND_PAD;
        let height = 2 * LEGEND_PAD + LEGEND_ROW * entries.len() as i64;

        let right = PAD_LEFT + self.plot_w - 10;
        let bottom = PAD_TOP + self.plot_h - 10;
        let left = right - width;
        let top = bottom - height;

        fill_px(canvas, left, top, right, bottom, WHITE, 1.0);
        stroke_px(canvas, left, top, right, bottom, BLACK, 1);

        for (i, (label, color, alpha)) in entries.iter().enumerate() {
            let row_top = top + LEGEND_PAD + LEGEND_ROW * i as i64;
            let sw_top = row_top + (LEGEND_ROW - LEGEND_SWATCH) / 2;
            let sw_left = left + LEGEND_PAD;
            fill_px(
                canvas,
                sw_left,
                sw_top,
                sw_left + LEGEND_SWATCH,
                sw_top + LEGEND_SWATCH,
                *color,
                *alpha,
            );
            stroke_px(
                canvas,
                sw_left,
                sw_top,
                sw_left + LEGEND_SWATCH,
                sw_top + LEGEND_SWATCH,
                *color,
                1,
            );
            let text_top = row_top + (LEGEND_ROW - line_height(LEGEND_PX) as i64) / 2;
            draw_text(
                canvas,
                label,
                LEGEND_PX,
                sw_left + LEGEND_SWATCH + 6,
                text_top,
                BLACK,
            );
        }
    }
}

fn blend(pixel: &mut Rgba<u8>, color: [u8; 3], alpha: f32) {
    for c in 0..3 {
        let src = color[c] as f32;
        let dst = pixel.0[c] as f32;
        pixel.0[c] = (src * alpha + dst * (1.0 - alpha)).round() as u8;
    }
    pixel.0[3] = 255;
}

/// Blend a solid rectangle; bounds are half-open and clamped to the
/// canvas.
fn fill_px(canvas: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64, color: [u8; 3], alpha: f32) {
    let (w, h) = canvas.dimensions();
    let x_lo = x0.max(0);
    let y_lo = y0.max(0);
    let x_hi = x1.min(w as i64);
    let y_hi = y1.min(h as i64);
    for y in y_lo..y_hi {
        for x in x_lo..x_hi {
            blend(canvas.get_pixel_mut(x as u32, y as u32), color, alpha);
        }
    }
}

fn stroke_px(
    canvas: &mut RgbaImage,
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
    color: [u8; 3],
    thickness: i64,
) {
    fill_px(canvas, x0, y0, x1, y0 + thickness, color, 1.0);
    fill_px(canvas, x0, y1 - thickness, x1, y1, color, 1.0);
    fill_px(canvas, x0, y0, x0 + thickness, y1, color, 1.0);
    fill_px(canvas, x1 - thickness, y0, x1, y1, color, 1.0);
}

/// Diagonal hatching inside a pixel rect. `Forward` runs bottom-left to
/// top-right, `Back` the other way.
fn hatch_px(
    canvas: &mut RgbaImage,
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
    color: [u8; 3],
    hatch: Hatch,
) {
    let (w, h) = canvas.dimensions();
    let x_lo = x0.max(0);
    let y_lo = y0.max(0);
    let x_hi = x1.min(w as i64);
    let y_hi = y1.min(h as i64);
    for y in y_lo..y_hi {
        for x in x_lo..x_hi {
            let on = match hatch {
                Hatch::Forward => (x + y).rem_euclid(HATCH_SPACING) == 0,
                Hatch::Back => (x - y).rem_euclid(HATCH_SPACING) == 0,
            };
            if on {
                blend(canvas.get_pixel_mut(x as u32, y as u32), color, 1.0);
            }
        }
    }
}

/// Height of a rendered text line, 0.0 without a font.
fn line_height(size: f32) -> f32 {
    match font::label_font() {
        Some(font) => {
            let vm = font.v_metrics(Scale::uniform(size));
            vm.ascent - vm.descent
        }
        None => 0.0,
    }
}

/// Advance width of `text`, 0.0 without a font.
fn text_width(text: &str, size: f32) -> f32 {
    let Some(font) = font::label_font() else {
        return 0.0;
    };
    let scale = Scale::uniform(size);
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Rasterize one line of text into a transparent buffer. `None` without a
/// font or for empty text.
fn rasterize_line(text: &str, size: f32, color: [u8; 3]) -> Option<RgbaImage> {
    let font = font::label_font()?;
    let scale = Scale::uniform(size);
    let vm = font.v_metrics(scale);
    let width = text_width(text, size).ceil().max(1.0) as u32;
    let height = (vm.ascent - vm.descent).ceil().max(1.0) as u32;
    let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));

    for glyph in font.layout(text, scale, point(0.0, vm.ascent)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let x = bb.min.x + gx as i32;
                let y = bb.min.y + gy as i32;
                if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                    let a = (coverage * 255.0).round() as u8;
                    let px = img.get_pixel_mut(x as u32, y as u32);
                    if a > px.0[3] {
                        *px = Rgba([color[0], color[1], color[2], a]);
                    }
                }
            });
        }
    }
    Some(img)
}

fn draw_text(canvas: &mut RgbaImage, text: &str, size: f32, x: i64, y: i64, color: [u8; 3]) {
    if let Some(line) = rasterize_line(text, size, color) {
        overlay_alpha(canvas, &line, x, y);
    }
}

/// Composite `src` onto `canvas` at `(x0, y0)` using the source alpha
/// channel as coverage.
fn overlay_alpha(canvas: &mut RgbaImage, src: &RgbaImage, x0: i64, y0: i64) {
    let (w, h) = canvas.dimensions();
    for (sx, sy, px) in src.enumerate_pixels() {
        let alpha = px.0[3] as f32 / 255.0;
        if alpha <= 0.0 {
            continue;
        }
        let x = x0 + sx as i64;
        let y = y0 + sy as i64;
        if x >= 0 && y >= 0 && x < w as i64 && y < h as i64 {
            blend(
                canvas.get_pixel_mut(x as u32, y as u32),
                [px.0[0], px.0[1], px.0[2]],
                alpha,
            );
        }
    }
}

/// Pick a round tick spacing yielding roughly five intervals.
fn tick_step(span: f64) -> f64 {
    let raw = span / 5.0;
    let mag = 10f64.powf(raw.log10().floor());
    let norm = raw / mag;
    let mult = if norm < 1.5 {
        1.0
    } else if norm < 3.5 {
        2.0
    } else if norm < 7.5 {
        5.0
    } else {
        10.0
    };
    mult * mag
}

fn ticks(min: f64, max: f64) -> Vec<f64> {
    let step = tick_step(max - min);
    let mut out = Vec::new();
    let mut t = (min / step).ceil() * step;
    while t <= max + step * 1e-6 {
        out.push(if t == 0.0 { 0.0 } else { t });
        t += step;
    }
    out
}

fn tick_label(value: f64, step: f64) -> String {
    let decimals = (-step.log10().floor()).max(0.0) as usize;
    format!("{value:.prec$}", prec = decimals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{place, ElementSizes};
    use std::path::PathBuf;

    fn out_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "riser-plot-test-{tag}-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    #[test]
    fn renders_a_named_png() {
        let dims = ShaftDims::from_area(4.0, 1.0).expect("valid dims");
        let dir = out_dir("bare");
        let path =
            render_cross_section("S1", dims, &[], &dir).expect("render succeeds");
        assert_eq!(path, dir.join("S1_cross_section.png"));
        let (w, h) = image::image_dimensions(&path).expect("decodable png");
        assert!(w > 0 && h > 0);
    }

    #[test]
    fn shaft_interior_is_grey() {
        let dims = ShaftDims::from_area(4.0, 1.0).expect("valid dims");
        let dir = out_dir("grey");
        let path = render_cross_section("S9", dims, &[], &dir).expect("render succeeds");
        let img = image::open(&path).expect("open png").to_rgba8();
        // The plot center maps to the shaft center.
        let cx = (PAD_LEFT + PLOT_WIDTH as i64 / 2) as u32;
        let cy = (PAD_TOP + (Figure::new(dims).plot_h / 2)) as u32;
        assert_eq!(img.get_pixel(cx, cy), &Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn renders_with_every_element_placed() {
        let dims = ShaftDims::from_area(6.0, 2.0).expect("valid dims");
        let sizes = ElementSizes {
            supply_width: 0.4,
            supply_depth: 0.25,
            return_width: 0.3,
            return_depth: 0.5,
            heating_cooling_area: 0.25,
            electrical_area: 0.09,
            plumbing_area: 0.04,
        };
        let elements = place(dims, &sizes);
        assert_eq!(elements.len(), 5);
        let dir = out_dir("full");
        let path = render_cross_section("S2", dims, &elements, &dir).expect("render succeeds");
        assert!(path.exists());
    }

    #[test]
    fn rerendering_overwrites_the_existing_file() {
        let dims = ShaftDims::from_area(2.0, 2.0).expect("valid dims");
        let dir = out_dir("overwrite");
        let first = render_cross_section("S3", dims, &[], &dir).expect("first render");
        let second = render_cross_section("S3", dims, &[], &dir).expect("second render");
        assert_eq!(first, second);
    }

    #[test]
    fn tick_steps_are_round_values() {
        assert!((tick_step(1.0) - 0.2).abs() < 1e-12);
        assert!((tick_step(5.0) - 1.0).abs() < 1e-12);
        assert!((tick_step(3.39) - 0.5).abs() < 1e-12);
        assert!((tick_step(0.73) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn ticks_cover_the_range_without_overshoot() {
        let ts = ticks(-0.283, 3.11);
        assert_eq!(ts.first().copied(), Some(0.0));
        assert!(ts.last().copied().unwrap() <= 3.11 + 1e-9);
        assert!(ts.len() >= 4);
    }

    #[test]
    fn tick_labels_match_step_precision() {
        assert_eq!(tick_label(0.5, 0.5), "0.5");
        assert_eq!(tick_label(2.0, 1.0), "2");
        assert_eq!(tick_label(0.25, 0.05), "0.25");
    }
}
