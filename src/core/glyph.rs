//! Off-screen glyph rasterization for text and digit formations.
//!
//! A symbol is drawn with a bold monospace bitmap font into a small cell,
//! bilinearly upscaled onto a square canvas, and thresholded. The foreground
//! pixel coordinates are what the sampler scatters particles over.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, ascii::FONT_9X18_BOLD};
use embedded_graphics::pixelcolor::Gray8;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const FONT: MonoFont<'static> = FONT_9X18_BOLD;

/// Fraction of the canvas height occupied by one font cell.
const CELL_FILL: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlyphConfig {
    #[serde(default = "GlyphConfig::default_canvas_size")]
    pub canvas_size: usize,
    /// Luminance above which a canvas pixel counts as foreground.
    #[serde(default = "GlyphConfig::default_threshold")]
    pub threshold: u8,
}

impl GlyphConfig {
    fn default_canvas_size() -> usize {
        100
    }
    fn default_threshold() -> u8 {
        128
    }
}

impl Default for GlyphConfig {
    fn default() -> Self {
        Self {
            canvas_size: Self::default_canvas_size(),
            threshold: Self::default_threshold(),
        }
    }
}

/// Foreground pixels of a rasterized symbol, row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphMask {
    pub size: usize,
    pub pixels: Vec<[u32; 2]>,
}

impl GlyphMask {
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }
}

/// Single-channel draw target sized to one font cell.
struct CellCanvas {
    width: usize,
    height: usize,
    luma: Vec<u8>,
}

impl CellCanvas {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            luma: vec![0; width * height],
        }
    }

    #[inline]
    fn at(&self, x: isize, y: isize) -> f32 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0.0;
        }
        self.luma[y as usize * self.width + x as usize] as f32
    }

    /// Bilinear sample at continuous cell coordinates (pixel centers at +0.5).
    fn sample(&self, fx: f32, fy: f32) -> f32 {
        let x = fx - 0.5;
        let y = fy - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let tx = x - x0;
        let ty = y - y0;
        let (ix, iy) = (x0 as isize, y0 as isize);
        let top = self.at(ix, iy) * (1.0 - tx) + self.at(ix + 1, iy) * tx;
        let bottom = self.at(ix, iy + 1) * (1.0 - tx) + self.at(ix + 1, iy + 1) * tx;
        top * (1.0 - ty) + bottom * ty
    }

    /// Inclusive bounding box of lit pixels as `(x0, y0, x1, y1)`.
    fn ink_bounds(&self) -> Option<(usize, usize, usize, usize)> {
        let mut bounds: Option<(usize, usize, usize, usize)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.luma[y * self.width + x] == 0 {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds
    }
}

impl OriginDimensions for CellCanvas {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for CellCanvas {
    type Color = Gray8;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            if coord.x >= 0
                && coord.y >= 0
                && (coord.x as usize) < self.width
                && (coord.y as usize) < self.height
            {
                self.luma[coord.y as usize * self.width + coord.x as usize] = color.luma();
            }
        }
        Ok(())
    }
}

/// Renders `symbol` centered on a `canvas_size`² canvas and returns the
/// pixels whose luminance exceeds the threshold. Pure: identical inputs give
/// identical masks.
pub fn rasterize_symbol(symbol: char, config: &GlyphConfig) -> GlyphMask {
    let size = config.canvas_size.max(1);
    let cell_w = FONT.character_size.width as usize;
    let cell_h = FONT.character_size.height as usize;

    let mut cell = CellCanvas::new(cell_w, cell_h);
    let mut utf8 = [0u8; 4];
    let text = symbol.encode_utf8(&mut utf8);
    let style = MonoTextStyle::new(&FONT, Gray8::WHITE);
    let _ = Text::with_baseline(text, Point::zero(), style, Baseline::Top).draw(&mut cell);

    let Some((ix0, iy0, ix1, iy1)) = cell.ink_bounds() else {
        return GlyphMask {
            size,
            pixels: Vec::new(),
        };
    };

    // Uniform scale from the cell height keeps letters proportionate to each
    // other; the ink box (not the cell) is what gets centered.
    let scale = size as f32 * CELL_FILL / cell_h as f32;
    let ink_cx = (ix0 + ix1 + 1) as f32 * 0.5;
    let ink_cy = (iy0 + iy1 + 1) as f32 * 0.5;
    let half = size as f32 * 0.5;

    let threshold = config.threshold as f32;
    let mut pixels = Vec::new();
    for y in 0..size {
        let fy = (y as f32 + 0.5 - half) / scale + ink_cy;
        for x in 0..size {
            let fx = (x as f32 + 0.5 - half) / scale + ink_cx;
            if cell.sample(fx, fy) > threshold {
                pixels.push([x as u32, y as u32]);
            }
        }
    }

    GlyphMask { size, pixels }
}

/// Caching front-end over [`rasterize_symbol`].
#[derive(Debug, Default)]
pub struct GlyphRasterizer {
    config: GlyphConfig,
    cache: HashMap<char, Arc<GlyphMask>>,
}

impl GlyphRasterizer {
    pub fn new(config: GlyphConfig) -> Self {
        Self {
            config,
            cache: HashMap::new(),
        }
    }

    /// Changing the threshold invalidates every cached mask.
    pub fn set_threshold(&mut self, threshold: u8) {
        if self.config.threshold != threshold {
            self.config.threshold = threshold;
            self.cache.clear();
        }
    }

    pub fn rasterize(&mut self, symbol: char) -> Arc<GlyphMask> {
        if let Some(mask) = self.cache.get(&symbol) {
            return Arc::clone(mask);
        }
        let mask = Arc::new(rasterize_symbol(symbol, &self.config));
        if mask.is_empty() {
            warn!("glyph {symbol:?} rasterized to zero foreground pixels");
        } else {
            debug!(
                "rasterized glyph {symbol:?}: {} px on {}x{}",
                mask.len(),
                mask.size,
                mask.size
            );
        }
        self.cache.insert(symbol, Arc::clone(&mask));
        mask
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
