/// Software rasterizer over a display list.
///
/// Paints the commands that intersect a document-space region into an RGBA
/// buffer at the requested device pixel ratio, then encodes it as PNG.

use crate::capture::{EncodedImage, RasterRegion, Rasterizer};
use crate::rendering::paint::PaintCommand;
use crate::{Error, Result};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};
use std::sync::Arc;

/// Slack allowed when a region edge lands on the document edge after float math
const EDGE_EPSILON: f64 = 0.5;

#[derive(Clone)]
pub struct PaintRasterizer {
    display_list: Arc<Vec<PaintCommand>>,
}

impl PaintRasterizer {
    pub fn new(display_list: Arc<Vec<PaintCommand>>) -> Self {
        Self { display_list }
    }

    fn check_bounds(region: &RasterRegion) -> Result<()> {
        let (ww, wh) = (region.window_width as f64, region.window_height as f64);
        if !(region.width > 0.0 && region.height > 0.0) {
            return Err(Error::Other(format!(
                "empty region {}x{}",
                region.width, region.height
            )));
        }
        if region.x < -EDGE_EPSILON
            || region.y < -EDGE_EPSILON
            || region.x + region.width > ww + EDGE_EPSILON
            || region.y + region.height > wh + EDGE_EPSILON
        {
            return Err(Error::Other(format!(
                "region ({}, {}, {}x{}) lies outside the {}x{} document",
                region.x, region.y, region.width, region.height, ww, wh
            )));
        }
        Ok(())
    }

    /// Paint into raw RGBA without encoding
    pub fn paint(&self, region: &RasterRegion) -> Result<RgbaImage> {
        Self::check_bounds(region)?;
        let (w, h) = region.pixel_size();
        let mut canvas = Canvas {
            img: RgbaImage::new(w, h),
            region: *region,
        };

        for cmd in self.display_list.iter() {
            match cmd {
                PaintCommand::SolidRect {
                    x,
                    y,
                    width,
                    height,
                    rgba,
                } => canvas.fill(*x as f64, *y as f64, *width as f64, *height as f64, *rgba),
                PaintCommand::Text { x, y, text, size } => {
                    let cell = *size as f64;
                    let inset = (cell / 8.0).max(1.0);
                    for (i, ch) in text.chars().enumerate() {
                        if ch.is_whitespace() {
                            continue;
                        }
                        canvas.fill(
                            *x as f64 + i as f64 * cell + inset,
                            *y as f64 + inset,
                            cell - inset * 2.0,
                            cell - inset * 2.0,
                            crate::rendering::paint::INK,
                        );
                    }
                }
            }
        }
        Ok(canvas.img)
    }
}

struct Canvas {
    img: RgbaImage,
    region: RasterRegion,
}

impl Canvas {
    /// Fill a document-space rectangle, clipped to the output.
    fn fill(&mut self, x: f64, y: f64, width: f64, height: f64, rgba: (u8, u8, u8, u8)) {
        let dpr = self.region.device_pixel_ratio as f64;
        let to_px = |v: f64, origin: f64| ((v - origin) * dpr).round();
        let (w, h) = (self.img.width() as f64, self.img.height() as f64);
        let x0 = to_px(x, self.region.x).clamp(0.0, w) as u32;
        let x1 = to_px(x + width, self.region.x).clamp(0.0, w) as u32;
        let y0 = to_px(y, self.region.y).clamp(0.0, h) as u32;
        let y1 = to_px(y + height, self.region.y).clamp(0.0, h) as u32;

        for py in y0..y1 {
            for px in x0..x1 {
                let dst = self.img.get_pixel_mut(px, py);
                *dst = blend(*dst, rgba);
            }
        }
    }
}

fn blend(dst: Rgba<u8>, (r, g, b, a): (u8, u8, u8, u8)) -> Rgba<u8> {
    let a = a as u32;
    let inv = 255 - a;
    let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv) / 255) as u8;
    let [dr, dg, db, da] = dst.0;
    Rgba([
        mix(r, dr),
        mix(g, dg),
        mix(b, db),
        (a + da as u32 * inv / 255) as u8,
    ])
}

impl Rasterizer for PaintRasterizer {
    fn rasterize(&mut self, region: &RasterRegion) -> Result<EncodedImage> {
        let img = self.paint(region)?;
        let (w, h) = img.dimensions();
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes).write_image(img.as_raw(), w, h, ColorType::Rgba8)?;
        Ok(EncodedImage::png(w, h, bytes))
    }
}
