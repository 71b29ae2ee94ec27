#[cfg(test)]
#[path = "export_test.rs"]
mod tests;

use std::io::Cursor;
use std::path;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use image::imageops;
use image::imageops::FilterType;
use image::DynamicImage;
use image::ImageBuffer;
use image::ImageOutputFormat;
use image::Luma;
use image::Rgba;
use image::RgbaImage;
use rusttype::point;
use rusttype::Font;
use rusttype::Scale;
use tokio::fs;

use crate::domain::models::Labels;

pub const CANVAS_WIDTH: u32 = 1890;
pub const CANVAS_HEIGHT: u32 = 2832;

const FONT_SIZE: f32 = 120.0;
const BOTTOM_MARGIN: f32 = 80.0;
const LABEL_COLOR: [u8; 3] = [0xFF, 0xD7, 0x00];
const SHADOW_OPACITY: f32 = 0.8;
const SHADOW_OFFSET: (i32, i32) = (2, 2);
const SHADOW_BLUR: f32 = 10.0;

const SYSTEM_FONTS: [&str; 7] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSerif-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSerif-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSerif-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Georgia Bold.ttf",
    "C:\\Windows\\Fonts\\georgiab.ttf",
];

pub struct CardExport {
    pub file_name: String,
    pub png: Vec<u8>,
}

/// `Deep  Joy` becomes `Deep_Joy_card.png`.
pub fn export_file_name(label: &str) -> String {
    return format!("{}_card.png", Labels::file_stem(label));
}

pub fn find_system_font() -> Option<path::PathBuf> {
    return SYSTEM_FONTS
        .iter()
        .map(path::PathBuf::from)
        .find(|font_path| return font_path.exists());
}

/// Decodes the source and stretches it over the full export canvas.
pub fn compose_canvas(source: &[u8]) -> Result<RgbaImage> {
    let decoded = image::load_from_memory(source)
        .map_err(|err| return anyhow!("Card image could not be decoded: {err}"))?;

    return Ok(decoded
        .resize_exact(CANVAS_WIDTH, CANVAS_HEIGHT, FilterType::Triangle)
        .to_rgba8());
}

fn blend(dst: &mut Rgba<u8>, color: [u8; 3], alpha: f32) {
    if alpha <= 0.0 {
        return;
    }

    let inv = 1.0 - alpha;
    for channel in 0..3 {
        dst.0[channel] = (color[channel] as f32 * alpha + dst.0[channel] as f32 * inv) as u8;
    }
    dst.0[3] = 255;
}

pub struct Exporter {
    font: Font<'static>,
}

impl Exporter {
    /// Loads the label font from `font_file`, or from the first known system
    /// font when no file is configured.
    pub async fn load(font_file: &str) -> Result<Exporter> {
        let font_path = if font_file.is_empty() {
            let Some(found) = find_system_font() else {
                bail!("No font available to draw card labels. Set one with --font-file.");
            };
            found
        } else {
            path::PathBuf::from(font_file)
        };

        let bytes = fs::read(&font_path)
            .await
            .map_err(|err| return anyhow!("Failed to read font {}: {err}", font_path.display()))?;

        return Exporter::from_bytes(bytes);
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Exporter> {
        let Some(font) = Font::try_from_vec(bytes) else {
            bail!("Font file is not a valid TrueType or OpenType font");
        };

        return Ok(Exporter { font });
    }

    fn text_width(&self, scale: Scale, text: &str) -> f32 {
        return self
            .font
            .layout(text, scale, point(0.0, 0.0))
            .last()
            .map(|glyph| {
                return glyph.position().x + glyph.unpositioned().h_metrics().advance_width;
            })
            .unwrap_or(0.0);
    }

    /// Left edge and baseline of the label, centered horizontally with the
    /// bottom of the text box `BOTTOM_MARGIN` above the canvas edge.
    fn label_origin(&self, scale: Scale, text: &str) -> (f32, f32) {
        let v_metrics = self.font.v_metrics(scale);
        let x = (CANVAS_WIDTH as f32 - self.text_width(scale, text)) / 2.0;
        let baseline = CANVAS_HEIGHT as f32 - BOTTOM_MARGIN + v_metrics.descent;

        return (x, baseline);
    }

    /// Top edge of the canvas strip that can hold label or shadow pixels.
    fn band_top(&self, scale: Scale, text: &str) -> u32 {
        let (_, baseline) = self.label_origin(scale, text);
        let ascent = self.font.v_metrics(scale).ascent;
        let top = baseline - ascent - SHADOW_BLUR * 3.0;

        return top.max(0.0).min(CANVAS_HEIGHT as f32) as u32;
    }

    /// Glyph coverage for the label, in a mask covering the canvas rows from
    /// `band_top` down to the bottom edge.
    fn coverage(
        &self,
        text: &str,
        offset: (i32, i32),
        band_top: u32,
    ) -> ImageBuffer<Luma<u8>, Vec<u8>> {
        let scale = Scale::uniform(FONT_SIZE);
        let (x, baseline) = self.label_origin(scale, text);
        let band_height = CANVAS_HEIGHT - band_top;
        let mut mask = ImageBuffer::<Luma<u8>, Vec<u8>>::new(CANVAS_WIDTH, band_height);

        for glyph in self.font.layout(
            text,
            scale,
            point(x + offset.0 as f32, baseline + offset.1 as f32),
        ) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };

            glyph.draw(|gx, gy, v| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y - band_top as i32;
                if px < 0 || py < 0 || px >= CANVAS_WIDTH as i32 || py >= band_height as i32 {
                    return;
                }

                let pixel = mask.get_pixel_mut(px as u32, py as u32);
                pixel.0[0] = pixel.0[0].max((v * 255.0) as u8);
            });
        }

        return mask;
    }

    pub fn draw_label(&self, canvas: &mut RgbaImage, label: &str) {
        let band_top = self.band_top(Scale::uniform(FONT_SIZE), label);
        let shadow = imageops::blur(
            &self.coverage(label, SHADOW_OFFSET, band_top),
            SHADOW_BLUR / 2.0,
        );
        let text = self.coverage(label, (0, 0), band_top);

        for (x, y, dst) in canvas.enumerate_pixels_mut() {
            if y < band_top {
                continue;
            }
            let band_y = y - band_top;

            let shadow_alpha = shadow.get_pixel(x, band_y).0[0] as f32 / 255.0 * SHADOW_OPACITY;
            blend(dst, [0, 0, 0], shadow_alpha);

            let text_alpha = text.get_pixel(x, band_y).0[0] as f32 / 255.0;
            blend(dst, LABEL_COLOR, text_alpha);
        }
    }

    /// Renders the downloadable card: the image at print resolution with the
    /// label drawn over it.
    pub fn render(&self, image_bytes: &[u8], label: &str) -> Result<CardExport> {
        let mut canvas = compose_canvas(image_bytes)?;
        self.draw_label(&mut canvas, label);

        let mut png = vec![];
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)?;

        tracing::debug!(label = %label, bytes = png.len(), "rendered card export");

        return Ok(CardExport {
            file_name: export_file_name(label),
            png,
        });
    }
}
